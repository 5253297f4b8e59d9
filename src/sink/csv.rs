//! CSV sink writing the tabular row form.

use super::{SinkError, SnapshotSink};
use crate::projection::PositionRow;
use async_trait::async_trait;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

type SharedWriter = Arc<Mutex<csv::Writer<File>>>;

/// Appends one CSV record per row. The header is written with the first record.
///
/// File I/O runs on tokio's blocking pool so lane tasks never block a runtime worker.
#[derive(Debug)]
pub struct CsvSink {
    writer: SharedWriter,
}

impl CsvSink {
    /// Create (or truncate) the output file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = csv::Writer::from_path(path)?;
        info!("Writing position rows to {}", path.display());
        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
        })
    }

    async fn with_writer<F>(&self, op: F) -> Result<(), SinkError>
    where
        F: FnOnce(&mut csv::Writer<File>) -> Result<(), SinkError> + Send + 'static,
    {
        let writer = self.writer.clone();
        tokio::task::spawn_blocking(move || {
            let mut writer = writer.lock().map_err(|_| SinkError::Poisoned)?;
            op(&mut writer)
        })
        .await?
    }
}

#[async_trait]
impl SnapshotSink for CsvSink {
    async fn write(&self, row: PositionRow) -> Result<(), SinkError> {
        self.with_writer(move |writer| Ok(writer.serialize(row)?)).await
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.with_writer(|writer| Ok(writer.flush()?)).await
    }
}
