//! Pure volume and price algorithms used by the position ledger.

use super::{checked, InvariantViolation};
use crate::domain::Decimal;

/// Split a signed trade into the part that opens exposure and the part that closes it.
///
/// Returns `(opened, closed)`. `closed` carries the sign of `current_open_volume`
/// and is bounded by `min(|current|, |traded|)`; a trade larger than the open
/// volume closes all of it and opens the remainder on the other side.
pub fn calculate_open_closed_volume(current_open_volume: i64, traded_volume: i64) -> (i64, i64) {
    if current_open_volume != 0 && ((current_open_volume > 0) != (traded_volume > 0)) {
        let closed_volume = if traded_volume.unsigned_abs() > current_open_volume.unsigned_abs() {
            current_open_volume
        } else {
            -traded_volume
        };
        return (traded_volume + closed_volume, closed_volume);
    }
    (traded_volume, 0)
}

/// Volume-weighted average price after adding `add_volume` at `add_price`.
///
/// A position that nets to zero has no average price, so that case yields zero.
///
/// # Errors
/// Returns `InvariantViolation::Overflow` if the weighted sum does not fit.
pub fn update_vwap(
    vwap: Decimal,
    volume: i64,
    add_volume: i64,
    add_price: Decimal,
) -> Result<Decimal, InvariantViolation> {
    let total = checked::volume(volume, add_volume, "average_entry_price")?;
    if total == 0 {
        return Ok(Decimal::zero());
    }

    let held = checked::mul(vwap, Decimal::from_i64(volume), "average_entry_price")?;
    let added = checked::mul(add_price, Decimal::from_i64(add_volume), "average_entry_price")?;
    let weighted = checked::add(held, added, "average_entry_price")?;
    checked::div(weighted, Decimal::from_i64(total), "average_entry_price")
}
