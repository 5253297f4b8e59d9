//! Pure computation engine for position and PnL tracking.

use crate::domain::Decimal;
use thiserror::Error;

mod checked;
pub mod position;
pub mod volume;

pub use position::{FeeTotals, Position, PositionState};
pub use volume::{calculate_open_closed_volume, update_vwap};

/// A computed value the protocol can never legitimately produce.
///
/// Implies a protocol bug or a corrupted upstream event; ingestion should halt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{field} = {value} is not representable as an unsigned integer")]
    Unrepresentable { field: &'static str, value: Decimal },
    #[error("arithmetic overflow computing {op}")]
    Overflow { op: &'static str },
}
