use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("simulation engine already initialized")]
    AlreadyInitialized,

    #[error("simulation engine not initialized")]
    NotInitialized,

    #[error("simulation engine already running")]
    AlreadyRunning,

    #[error("Failed to load LEF file '{file}': {message}")]
    LefLoadError { file: String, message: String },

    #[error("Failed to write results to '{file}': {message}")]
    ResultWriteError { file: String, message: String },

    #[error("Outbound queue closed before the simulation finished")]
    OutboundClosed,

    #[error("Inbound link channels closed while the simulation was running")]
    LinksClosed,
}
