//! Replay a JSON-lines event file through the lanes.

use crate::adapters::{decode_line, DecodedEvent};
use crate::config::Config;
use crate::engine::Position;
use crate::error::AppError;
use crate::orchestration::lanes::LaneRouter;
use crate::projection::PositionSnapshot;
use crate::sink::SnapshotSink;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Non-blank lines read.
    pub lines_read: u64,
    /// Lines that failed to decode.
    pub rejected: u64,
    /// Party envelopes routed to a lane.
    pub dispatched: u64,
    pub broadcasts: u64,
    /// Position updates applied across all lanes.
    pub applied: u64,
    /// Envelopes dropped by the sequencing guard.
    pub skipped: u64,
    pub positions: usize,
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub summary: ReplaySummary,
    /// Final positions, sorted by (market, party).
    pub positions: Vec<Position>,
    pub snapshots: Vec<PositionSnapshot>,
}

/// Replay `config.events_path` into `sink`.
///
/// # Errors
/// Fails if the events file cannot be read, a sink write fails, or a lane halts
/// on an invariant violation.
pub async fn run(config: &Config, sink: Arc<dyn SnapshotSink>) -> Result<ReplayOutcome, AppError> {
    let file = File::open(&config.events_path).await?;
    let mut lines = BufReader::new(file).lines();

    info!("Replaying events from {}", config.events_path.display());

    let router = LaneRouter::spawn(
        config.lanes,
        config.channel_capacity,
        sink.clone(),
        config.enforce_sequencing,
    );

    let mut summary = ReplaySummary::default();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        summary.lines_read += 1;

        let decoded = match decode_line(&line) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Rejected event on line {}: {}", line_no, e);
                summary.rejected += 1;
                continue;
            }
        };

        let sent = match decoded {
            DecodedEvent::Party(envelopes) => {
                let mut result = Ok(());
                for envelope in envelopes {
                    result = router.dispatch(envelope).await;
                    if result.is_err() {
                        break;
                    }
                    summary.dispatched += 1;
                }
                result
            }
            DecodedEvent::MarketWide(envelope) => {
                let result = router.broadcast(envelope).await;
                if result.is_ok() {
                    summary.broadcasts += 1;
                }
                result
            }
        };

        // A closed lane has halted; its cause is reported by shutdown.
        if let Err(e) = sent {
            warn!("Stopping replay at line {}: {}", line_no, e);
            break;
        }
    }

    let report = router.shutdown().await?;
    sink.flush().await?;

    let snapshots = report
        .positions
        .iter()
        .map(PositionSnapshot::try_from_position)
        .collect::<Result<Vec<_>, _>>()?;

    summary.applied = report.stats.applied;
    summary.skipped = report.stats.skipped;
    summary.positions = report.positions.len();

    info!(
        "Replay complete: {} lines, {} rejected, {} applied, {} skipped, {} positions",
        summary.lines_read, summary.rejected, summary.applied, summary.skipped, summary.positions
    );

    Ok(ReplayOutcome {
        summary,
        positions: report.positions,
        snapshots,
    })
}
