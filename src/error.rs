use std::io;
use thiserror::Error;

use crate::models::SendableError;

/// Reasons a tail session ends other than cancellation.
#[derive(Error, Debug)]
pub enum TailError {
    /// A successful fetch came back without a continuation token.
    #[error("protocol violation: response for {log_group}/{log_stream} has no continuation token")]
    ProtocolViolation {
        log_group: String,
        log_stream: String,
    },

    /// Any other fetch failure.
    #[error("transport error: {0}")]
    Transport(#[source] SendableError),

    /// The sink refused a write or flush.
    #[error("sink error: {0}")]
    Sink(#[from] io::Error),

    #[error("tail worker panicked")]
    WorkerPanicked,
}

impl TailError {
    pub fn transport(err: impl Into<SendableError>) -> Self {
        TailError::Transport(err.into())
    }
}

pub type Result<T> = std::result::Result<T, TailError>;
