use crate::base_types::Clock;
use log::info;
use std::path::PathBuf;

/// Static configuration of a simulation worker.
#[derive(Clone, Debug)]
pub struct Parameters {
    /// Lower bound on the virtual-time distance between the local clock and
    /// any event this worker will emit in the future. Must be positive.
    pub lookahead: Clock,
    /// Where the fired-transition listing is written when the run ends.
    pub result_path: PathBuf,
}

impl Parameters {
    pub fn log(&self) {
        info!("Lookahead set to {}", self.lookahead);
        info!("Result path set to {}", self.result_path.display());
    }
}
