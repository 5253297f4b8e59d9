//! Single-writer processing lanes.
//!
//! Every position key hashes to exactly one lane; the lane task owns those positions
//! and applies their events in delivery order. Lanes run in parallel with each other.

use crate::domain::{
    CommitTime, EventEnvelope, EventSequence, MarketEnvelope, PositionEvent, PositionKey,
};
use crate::engine::{InvariantViolation, Position};
use crate::projection::{PositionRow, PositionSnapshot};
use crate::sink::{SinkError, SnapshotSink};
use futures::future::join_all;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum LaneError {
    #[error("lane {lane} halted on {key} at {sequence}: {violation}")]
    Fatal {
        lane: usize,
        key: PositionKey,
        sequence: EventSequence,
        violation: InvariantViolation,
    },
    #[error("lane {lane} could not write to sink: {source}")]
    Sink { lane: usize, source: SinkError },
    #[error("lane {0} is closed")]
    Closed(usize),
    #[error("lane task failed: {0}")]
    Join(String),
}

impl LaneError {
    /// True when the lane stopped because of a numeric invariant violation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LaneError::Fatal { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneStats {
    pub applied: u64,
    /// Dropped by the sequencing guard (replayed or out of order).
    pub skipped: u64,
}

impl LaneStats {
    fn merge(&mut self, other: LaneStats) {
        self.applied += other.applied;
        self.skipped += other.skipped;
    }
}

/// Final state of all lanes after shutdown.
#[derive(Debug, Clone, Default)]
pub struct LaneReport {
    /// Sorted by (market, party).
    pub positions: Vec<Position>,
    pub stats: LaneStats,
}

#[derive(Debug)]
enum LaneMessage {
    Event(EventEnvelope),
    MarketWide(Arc<MarketEnvelope>),
}

/// Routes events to the lane owning their key.
pub struct LaneRouter {
    senders: Vec<mpsc::Sender<LaneMessage>>,
    handles: Vec<JoinHandle<Result<LaneReport, LaneError>>>,
}

impl LaneRouter {
    /// Start `lanes` lane tasks on the current tokio runtime.
    pub fn spawn(
        lanes: usize,
        capacity: usize,
        sink: Arc<dyn SnapshotSink>,
        enforce_sequencing: bool,
    ) -> Self {
        let lanes = lanes.max(1);
        let mut senders = Vec::with_capacity(lanes);
        let mut handles = Vec::with_capacity(lanes);

        for id in 0..lanes {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            let lane = Lane::new(id, sink.clone(), enforce_sequencing);
            senders.push(tx);
            handles.push(tokio::spawn(lane.run(rx)));
        }

        info!(
            "Started {} position lanes (sequencing guard {})",
            lanes,
            if enforce_sequencing { "on" } else { "off" }
        );

        Self { senders, handles }
    }

    pub fn lane_count(&self) -> usize {
        self.senders.len()
    }

    /// Index of the lane that owns `key`.
    pub fn lane_for(&self, key: &PositionKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.senders.len() as u64) as usize
    }

    /// Send an event to the lane owning its key.
    ///
    /// # Errors
    /// Returns `LaneError::Closed` if that lane has stopped.
    pub async fn dispatch(&self, envelope: EventEnvelope) -> Result<(), LaneError> {
        let lane = self.lane_for(&envelope.key);
        self.senders[lane]
            .send(LaneMessage::Event(envelope))
            .await
            .map_err(|_| LaneError::Closed(lane))
    }

    /// Send a market-wide event to every lane.
    ///
    /// # Errors
    /// Returns `LaneError::Closed` if any lane has stopped.
    pub async fn broadcast(&self, envelope: MarketEnvelope) -> Result<(), LaneError> {
        let envelope = Arc::new(envelope);
        for (lane, sender) in self.senders.iter().enumerate() {
            sender
                .send(LaneMessage::MarketWide(envelope.clone()))
                .await
                .map_err(|_| LaneError::Closed(lane))?;
        }
        Ok(())
    }

    /// Close all lanes, wait for them to drain, and collect their positions.
    ///
    /// # Errors
    /// Returns the first lane failure, fatal violations first.
    pub async fn shutdown(self) -> Result<LaneReport, LaneError> {
        drop(self.senders);

        let mut report = LaneReport::default();
        let mut failures = Vec::new();

        for joined in join_all(self.handles).await {
            match joined {
                Ok(Ok(lane_report)) => {
                    report.positions.extend(lane_report.positions);
                    report.stats.merge(lane_report.stats);
                }
                Ok(Err(err)) => failures.push(err),
                Err(join_err) => failures.push(LaneError::Join(join_err.to_string())),
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|e| !e.is_fatal());
            return Err(failures.remove(0));
        }

        report
            .positions
            .sort_by(|a, b| (&a.market_id, &a.party_id).cmp(&(&b.market_id, &b.party_id)));
        Ok(report)
    }
}

struct Lane {
    id: usize,
    positions: HashMap<PositionKey, Position>,
    last_applied: HashMap<PositionKey, EventSequence>,
    sink: Arc<dyn SnapshotSink>,
    enforce_sequencing: bool,
    stats: LaneStats,
}

impl Lane {
    fn new(id: usize, sink: Arc<dyn SnapshotSink>, enforce_sequencing: bool) -> Self {
        Self {
            id,
            positions: HashMap::new(),
            last_applied: HashMap::new(),
            sink,
            enforce_sequencing,
            stats: LaneStats::default(),
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<LaneMessage>) -> Result<LaneReport, LaneError> {
        while let Some(message) = rx.recv().await {
            match message {
                LaneMessage::Event(envelope) => {
                    self.handle(
                        envelope.key,
                        envelope.sequence,
                        envelope.commit_time,
                        &envelope.event,
                    )
                    .await?;
                }
                LaneMessage::MarketWide(envelope) => {
                    let mut keys: Vec<PositionKey> = self
                        .positions
                        .keys()
                        .filter(|k| k.market_id == envelope.market_id)
                        .cloned()
                        .collect();
                    keys.sort();
                    for key in keys {
                        self.handle(key, envelope.sequence, envelope.commit_time, &envelope.event)
                            .await?;
                    }
                }
            }
        }

        debug!(
            "Lane {} drained: {} positions, {} applied, {} skipped",
            self.id,
            self.positions.len(),
            self.stats.applied,
            self.stats.skipped
        );

        Ok(LaneReport {
            positions: self.positions.into_values().collect(),
            stats: self.stats,
        })
    }

    async fn handle(
        &mut self,
        key: PositionKey,
        sequence: EventSequence,
        commit_time: CommitTime,
        event: &PositionEvent,
    ) -> Result<(), LaneError> {
        if self.enforce_sequencing {
            if let Some(last) = self.last_applied.get(&key) {
                if sequence <= *last {
                    warn!(
                        "Dropping {} for {} at {}: already applied up to {}",
                        event.kind(),
                        key,
                        sequence,
                        last
                    );
                    self.stats.skipped += 1;
                    return Ok(());
                }
            }
        }

        let current = self.positions.get(&key).cloned().unwrap_or_else(|| {
            Position::new_empty(key.market_id.clone(), key.party_id.clone())
        });

        // Apply to a copy so a violating update leaves the last good state in place.
        let mut next = current;
        next.stamp(commit_time);
        let checked = next
            .apply(event)
            .and_then(|()| PositionSnapshot::try_from_position(&next).map(|_| ()));

        if let Err(violation) = checked {
            error!(
                "Invariant violation on {} at {} ({}): {}; halting lane {}",
                key,
                sequence,
                event.kind(),
                violation,
                self.id
            );
            return Err(LaneError::Fatal {
                lane: self.id,
                key,
                sequence,
                violation,
            });
        }

        self.sink
            .write(PositionRow::from_position(&next))
            .await
            .map_err(|source| LaneError::Sink {
                lane: self.id,
                source,
            })?;

        debug!("Applied {} to {} at {}", event.kind(), key, sequence);
        self.positions.insert(key.clone(), next);
        self.last_applied.insert(key, sequence);
        self.stats.applied += 1;
        Ok(())
    }
}
