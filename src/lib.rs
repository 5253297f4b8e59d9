pub mod adapters;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod projection;
pub mod sink;

pub use adapters::{decode_line, DecodeError, DecodedEvent};
pub use config::Config;
pub use domain::{
    CommitTime, ConfirmedEvent, Decimal, DistressedStatus, EventEnvelope, EventSequence, MarketId,
    PartyId, PositionEvent, PositionKey, TxHash,
};
pub use engine::{InvariantViolation, Position, PositionState};
pub use error::AppError;
pub use orchestration::{LaneRouter, ReplayOutcome, ReplaySummary};
pub use projection::{PositionRow, PositionSnapshot};
pub use sink::{CsvSink, MemorySink, SnapshotSink};
