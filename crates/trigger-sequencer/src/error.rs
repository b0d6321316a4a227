use thiserror::Error;

pub type Result<T, E = SequenceError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SequenceError {
    /// No runnable trigger remains. Normal termination, not a failure.
    #[error("sequence complete")]
    Complete,
    /// The session token was tripped while a trigger was waiting.
    #[error("sequence cancelled")]
    Cancelled,
    #[error("a trigger already holds position {0}")]
    DuplicatePosition(u32),
    #[error("no trigger at position {0}")]
    PositionNotFound(u32),
    #[error("unknown trigger kind: {0}")]
    UnknownKind(String),
    #[error("unknown probe: {0}")]
    UnknownProbe(String),
}
