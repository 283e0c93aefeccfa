mod base_types;
mod config;
mod core;
mod error;
mod events;
mod lefs;
mod messages;
mod worker;

#[cfg(test)]
#[path = "tests/common.rs"]
mod common;

pub use crate::base_types::{local_transition_id, Clock, Const, TransitionId};
pub use crate::config::Parameters;
pub use crate::core::{SimulationEngine, TransitionResult};
pub use crate::error::{EngineError, EngineResult};
pub use crate::events::{Event, EventList, NullMessage};
pub use crate::lefs::{Lefs, Transition, TransitionMap, TransitionStack};
pub use crate::messages::{NodeRef, SimulationRequest, SimulationResponse};
pub use crate::worker::Worker;
