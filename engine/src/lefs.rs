use crate::base_types::{Clock, Const, TransitionId};
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[cfg(test)]
#[path = "tests/lefs_tests.rs"]
pub mod lefs_tests;

pub type TransitionMap = BTreeMap<TransitionId, Transition>;

/// A transition's linear enabling function plus its firing bookkeeping.
/// The serde names mirror the LEF JSON format produced by the partitioner;
/// any other key in a transition object is ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transition {
    #[serde(rename = "ii_idglobal")]
    pub id: TransitionId,
    /// The transition is enabled when this drops to zero or below while its
    /// clock matches the local clock.
    #[serde(rename = "ii_valor")]
    pub value: Const,
    #[serde(rename = "ii_tiempo")]
    pub clock: Clock,
    /// Firing cost: propagated updates land at `clock + duration`.
    #[serde(rename = "ii_duracion_disparo")]
    pub duration: Clock,
    /// Updates applied instantaneously when the transition fires.
    #[serde(rename = "ii_listactes_IUL")]
    pub update: Vec<(TransitionId, Const)>,
    /// Updates scheduled as events when the transition fires.
    #[serde(rename = "ii_listactes_PUL")]
    pub propagate: Vec<(TransitionId, Const)>,
    /// Whether any propagation entry targets another subnet.
    #[serde(rename = "ib_desalida", default)]
    pub external: bool,
}

impl Transition {
    pub fn update_value(&mut self, value: Const) {
        self.value += value;
    }

    pub fn update_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }
}

/// LIFO of the transitions enabled at the current local clock.
#[derive(Clone, Debug, Default)]
pub struct TransitionStack(Vec<TransitionId>);

impl TransitionStack {
    pub fn push(&mut self, id: TransitionId) {
        self.0.push(id);
    }

    pub fn pop(&mut self) -> Option<TransitionId> {
        self.0.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The subnet's transition store.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Lefs {
    #[serde(rename = "ia_red", with = "network_list")]
    pub network: TransitionMap,
    #[serde(skip)]
    pub sensitized: TransitionStack,
}

impl Lefs {
    /// Loads a subnet description from its JSON file. A missing, partial or
    /// malformed file is an error; the caller aborts the Prepare.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Lefs> {
        let path = path.as_ref();
        let fail = |message: String| EngineError::LefLoadError {
            file: path.display().to_string(),
            message,
        };
        let file = File::open(path).map_err(|e| fail(e.to_string()))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| fail(e.to_string()))
    }

    /// Pushes every transition enabled at `clock` onto the sensitized stack.
    pub fn update_sensitized(&mut self, clock: Clock) {
        for (id, transition) in &self.network {
            if transition.value <= 0 && transition.clock == clock {
                self.sensitized.push(*id);
            }
        }
    }

    pub fn get_sensitized(&mut self) -> Option<TransitionId> {
        self.sensitized.pop()
    }

    /// Applies an instantaneous update to a local transition.
    pub fn apply_update(&mut self, id: TransitionId, constant: Const) {
        self.network
            .get_mut(&id)
            .expect("update entry targets an unknown transition")
            .update_value(constant);
    }
}

/// The LEF format stores the subnet as a list; in memory it is keyed by
/// global id.
mod network_list {
    use super::{Transition, TransitionMap};
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(map: &TransitionMap, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(map.len()))?;
        for transition in map.values() {
            seq.serialize_element(transition)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TransitionMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        let transitions = Vec::<Transition>::deserialize(deserializer)?;
        Ok(transitions
            .into_iter()
            .map(|transition| (transition.id, transition))
            .collect())
    }
}
