//! Ledger arithmetic that reports overflow instead of panicking.

use super::InvariantViolation;
use crate::domain::Decimal;

pub(crate) fn add(
    lhs: Decimal,
    rhs: Decimal,
    op: &'static str,
) -> Result<Decimal, InvariantViolation> {
    lhs.checked_add(rhs).ok_or(InvariantViolation::Overflow { op })
}

pub(crate) fn sub(
    lhs: Decimal,
    rhs: Decimal,
    op: &'static str,
) -> Result<Decimal, InvariantViolation> {
    lhs.checked_sub(rhs).ok_or(InvariantViolation::Overflow { op })
}

pub(crate) fn mul(
    lhs: Decimal,
    rhs: Decimal,
    op: &'static str,
) -> Result<Decimal, InvariantViolation> {
    lhs.checked_mul(rhs).ok_or(InvariantViolation::Overflow { op })
}

pub(crate) fn div(
    lhs: Decimal,
    rhs: Decimal,
    op: &'static str,
) -> Result<Decimal, InvariantViolation> {
    lhs.checked_div(rhs).ok_or(InvariantViolation::Overflow { op })
}

pub(crate) fn volume(lhs: i64, rhs: i64, op: &'static str) -> Result<i64, InvariantViolation> {
    lhs.checked_add(rhs).ok_or(InvariantViolation::Overflow { op })
}

/// `volume * (price - reference) / position_factor`, the PnL of `volume` moved from
/// `reference` to `price`.
pub(crate) fn pnl(
    volume: i64,
    price: Decimal,
    reference: Decimal,
    position_factor: Decimal,
    op: &'static str,
) -> Result<Decimal, InvariantViolation> {
    let diff = sub(price, reference, op)?;
    let gross = mul(Decimal::from_i64(volume), diff, op)?;
    div(gross, position_factor, op)
}
