use crate::base_types::{Clock, Const, TransitionId};
use crate::config::Parameters;
use crate::lefs::{Lefs, Transition};
use crate::messages::NodeRef;
use std::net::SocketAddr;
use std::path::PathBuf;

// Fixture
pub fn parameters(name: &str) -> Parameters {
    Parameters {
        lookahead: Clock(1.0),
        result_path: PathBuf::from(format!(".results_test_{}.csv", name)),
    }
}

// Fixture
pub fn transition(
    id: TransitionId,
    value: Const,
    clock: f64,
    duration: f64,
    update: Vec<(TransitionId, Const)>,
    propagate: Vec<(TransitionId, Const)>,
) -> Transition {
    let external = propagate.iter().any(|(target, _)| *target < 0);
    Transition {
        id,
        value,
        clock: Clock(clock),
        duration: Clock(duration),
        update,
        propagate,
        external,
    }
}

// Fixture
pub fn lefs(transitions: Vec<Transition>) -> Lefs {
    Lefs {
        network: transitions
            .into_iter()
            .map(|transition| (transition.id, transition))
            .collect(),
        sensitized: Default::default(),
    }
}

// Fixture
pub fn node_ref(name: &str, address: SocketAddr) -> NodeRef {
    NodeRef {
        name: name.to_string(),
        address,
    }
}
