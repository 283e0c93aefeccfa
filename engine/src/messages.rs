use crate::base_types::{Clock, TransitionId};
use crate::events::{Event, NullMessage};
use crate::lefs::Lefs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Addressing record for a peer worker. The `name` is the sender id peers
/// use to route inbound traffic to the matching link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub name: String,
    pub address: SocketAddr,
}

/// Requests accepted by a simulation worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SimulationRequest {
    Prepare {
        lefs: Lefs,
        transition_nodes: HashMap<TransitionId, NodeRef>,
        waiting_on_segments: Vec<String>,
        notification_segments: Vec<NodeRef>,
    },
    Start {
        end: Clock,
    },
    Event {
        pid: String,
        event: Event,
    },
    NullMessage {
        pid: String,
        null_message: NullMessage,
    },
}

/// Acknowledgements for [`SimulationRequest`], one variant per request kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SimulationResponse {
    Prepare { error: Option<String> },
    Start { error: Option<String> },
    Event { error: Option<String> },
    NullMessage { error: Option<String> },
}

impl SimulationResponse {
    /// The error carried by the response, regardless of its kind.
    pub fn error(&self) -> Option<&str> {
        match self {
            SimulationResponse::Prepare { error }
            | SimulationResponse::Start { error }
            | SimulationResponse::Event { error }
            | SimulationResponse::NullMessage { error } => error.as_deref(),
        }
    }
}

/// Entry on the outbound queue: a payload bound for a downstream neighbor.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    pub node: NodeRef,
    pub payload: OutboundPayload,
}

#[derive(Clone, Debug)]
pub enum OutboundPayload {
    Event(Event),
    NullMessage(NullMessage),
}
