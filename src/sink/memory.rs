//! In-memory sink for tests and dry runs.

use super::{SinkError, SnapshotSink};
use crate::projection::PositionRow;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Sink that keeps every row in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<Vec<PositionRow>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all rows received so far.
    pub async fn rows(&self) -> Vec<PositionRow> {
        self.rows.lock().await.clone()
    }

    /// Rows for one (market, party), in arrival order.
    pub async fn rows_for(&self, market_id: &str, party_id: &str) -> Vec<PositionRow> {
        self.rows
            .lock()
            .await
            .iter()
            .filter(|r| r.market_id == market_id && r.party_id == party_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SnapshotSink for MemorySink {
    async fn write(&self, row: PositionRow) -> Result<(), SinkError> {
        self.rows.lock().await.push(row);
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
