pub mod lanes;
pub mod replay;

pub use lanes::{LaneError, LaneReport, LaneRouter, LaneStats};
pub use replay::{ReplayOutcome, ReplaySummary};
