//! Consumers of position rows produced by the lanes.

use crate::projection::PositionRow;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod csv;
pub mod memory;

pub use self::csv::CsvSink;
pub use memory::MemorySink;

/// Destination for position history rows.
///
/// Lanes call `write` concurrently; implementations must be safe to share.
#[async_trait]
pub trait SnapshotSink: Send + Sync + fmt::Debug {
    /// Accept one row. Rows for the same key arrive in commit order.
    async fn write(&self, row: PositionRow) -> Result<(), SinkError>;

    /// Make everything written so far durable.
    async fn flush(&self) -> Result<(), SinkError>;
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink lock poisoned")]
    Poisoned,
    #[error("sink task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
