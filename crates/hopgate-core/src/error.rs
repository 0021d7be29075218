//! Error types for hopgate-core.

use thiserror::Error;

/// Error type for hopgate-core operations.
///
/// Nothing on the render path returns this: underruns, missing input and
/// channel-count variation are handled by policy, not reported.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid parameter '{name}': {value}. Must be finite and greater than 0")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Malformed control message: {0}")]
    Message(String),

    /// The control thread's receiver is gone. The thread only drops it early
    /// by unwinding, so this reports a panicked control thread.
    #[error("Control thread is no longer running")]
    ControlClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Message(err.to_string())
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
