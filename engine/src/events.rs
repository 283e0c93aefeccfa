use crate::base_types::{Clock, Const, TransitionId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[cfg(test)]
#[path = "tests/event_tests.rs"]
pub mod event_tests;

/// A value update scheduled for a transition at a point in virtual time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Time at which the event must be applied.
    pub clock: Clock,
    /// Target transition. Negative values address another subnet.
    pub destination: TransitionId,
    /// Constant added to the target's enabling function value.
    pub value: Const,
}

/// Promise from an upstream neighbor that it will not send any event with a
/// timestamp below `lookahead`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullMessage {
    pub lookahead: Clock,
}

/// Clock-ordered event queue. Insertion is stable: a new event lands after
/// every event with an equal or lower clock, so ties keep arrival order.
#[derive(Clone, Debug, Default)]
pub struct EventList(VecDeque<Event>);

impl EventList {
    pub fn new() -> Self {
        EventList(VecDeque::new())
    }

    pub fn insert(&mut self, event: Event) {
        let index = self
            .0
            .iter()
            .position(|e| e.clock > event.clock)
            .unwrap_or_else(|| self.0.len());
        self.0.insert(index, event);
    }

    pub fn first(&self) -> Option<&Event> {
        self.0.front()
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.0.pop_front()
    }

    /// Clock of the soonest pending event, if any.
    pub fn first_clock(&self) -> Option<Clock> {
        self.0.front().map(|event| event.clock)
    }

    pub fn has_events_at(&self, clock: Clock) -> bool {
        self.first_clock() == Some(clock)
    }

    /// Pops the soonest event if it is scheduled exactly at `clock`.
    pub fn pop_at(&mut self, clock: Clock) -> Option<Event> {
        if self.has_events_at(clock) {
            self.pop()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
