use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridSeqError {
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),
    #[error("host does not provide {0}")]
    MissingHostService(&'static str),
    #[error("command queue is full")]
    CommandQueueFull,
    #[error("cannot decode state: {0}")]
    State(#[from] bincode::Error),
    #[error("unsupported state version {0}")]
    UnsupportedStateVersion(u8),
}
