use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

#[cfg(test)]
#[path = "tests/base_type_tests.rs"]
pub mod base_type_tests;

/// Global transition identifier. Non-negative values are local to a subnet;
/// a negative value addresses a transition on another subnet, see
/// [`local_transition_id`].
pub type TransitionId = i64;

/// Constant carried by update and propagation entries.
pub type Const = i64;

/// A virtual-time value. Wraps an `f64` but compares with `total_cmp` so the
/// event list and the link bookkeeping can rely on a total order.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Clock(pub f64);

impl Clock {
    pub const ZERO: Clock = Clock(0.0);
}

impl PartialEq for Clock {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Clock {}

impl PartialOrd for Clock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Clock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for Clock {
    type Output = Clock;

    fn add(self, rhs: Clock) -> Self::Output {
        Clock(self.0 + rhs.0)
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decodes the wire encoding for external targets: a negative id `n` denotes
/// the transition `-(n + 1)` local to the destination subnet. Local ids pass
/// through unchanged.
pub fn local_transition_id(id: TransitionId) -> TransitionId {
    if id < 0 {
        -(id + 1)
    } else {
        id
    }
}
