//! Error types for chanmap

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Coordinator lifecycle ===
    #[error("Coordinator closed: request sent after close")]
    Closed,

    #[error("Worker stopped before replying")]
    WorkerGone,

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Did the request fail because the coordinator is no longer serving?
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Error::Closed | Error::WorkerGone)
    }
}

// A sender that fails to queue is not converted here: only the coordinator
// knows whether its worker was closed or died.
impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::WorkerGone
    }
}
