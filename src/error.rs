use crate::adapters::DecodeError;
use crate::config::ConfigError;
use crate::engine::InvariantViolation;
use crate::orchestration::LaneError;
use crate::sink::SinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Rejected event: {0}")]
    Decode(#[from] DecodeError),
    #[error("Invariant violation: {0}")]
    Fatal(#[from] InvariantViolation),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("Lane error: {0}")]
    Lane(#[from] LaneError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// True for numeric invariant violations, which must stop processing.
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Fatal(_) => true,
            AppError::Lane(e) => e.is_fatal(),
            _ => false,
        }
    }
}
