//! Export views of a position: the rounded snapshot and the full-precision row.

use crate::domain::DistressedStatus;
use crate::engine::{InvariantViolation, Position};
use serde::{Deserialize, Serialize};

pub mod row;

pub use row::PositionRow;

/// Public view of a position, as served to query consumers.
///
/// Uses the provisional values so trades of the open settlement cycle are visible;
/// after any confirmed event these equal the confirmed values.
/// Monetary values are rendered rounded to zero decimal places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub market_id: String,
    pub party_id: String,
    pub open_volume: i64,
    pub realised_pnl: String,
    pub unrealised_pnl: String,
    /// Market-scale average entry price.
    pub average_entry_price: String,
    pub loss_socialisation_amount: String,
    pub position_status: DistressedStatus,
    pub taker_fees_paid: String,
    pub maker_fees_received: String,
    pub fees_paid: String,
    pub taker_fees_paid_since: String,
    pub maker_fees_received_since: String,
    pub fees_paid_since: String,
    pub funding_payment_amount: String,
    pub funding_payment_amount_since: String,
    /// Commit time in unix nanoseconds; 0 before any event.
    pub updated_at: i64,
    pub cursor: String,
}

impl PositionSnapshot {
    /// Render a snapshot.
    ///
    /// # Errors
    /// Fails if an average entry price cannot be expressed as an unsigned integer.
    pub fn try_from_position(position: &Position) -> Result<Self, InvariantViolation> {
        position.average_entry_price_uint()?;
        position.pending_average_entry_market_price_uint()?;

        let pending = &position.provisional;
        Ok(Self {
            market_id: position.market_id.to_string(),
            party_id: position.party_id.to_string(),
            open_volume: pending.open_volume,
            realised_pnl: pending.realised_pnl.round_to_string(0),
            unrealised_pnl: pending.unrealised_pnl.round_to_string(0),
            average_entry_price: pending.average_entry_market_price.round_to_string(0),
            loss_socialisation_amount: position.loss_socialisation_amount.round_to_string(0),
            position_status: position.distressed_status,
            taker_fees_paid: position.fees.taker_fees_paid.round_to_string(0),
            maker_fees_received: position.fees.maker_fees_received.round_to_string(0),
            fees_paid: position.fees.fees_paid.round_to_string(0),
            taker_fees_paid_since: position.fees_since.taker_fees_paid.round_to_string(0),
            maker_fees_received_since: position.fees_since.maker_fees_received.round_to_string(0),
            fees_paid_since: position.fees_since.fees_paid.round_to_string(0),
            funding_payment_amount: position.funding_payment_amount.round_to_string(0),
            funding_payment_amount_since: position
                .funding_payment_amount_since
                .round_to_string(0),
            updated_at: if position.commit_time.is_epoch() {
                0
            } else {
                position.commit_time.unix_nanos()
            },
            cursor: position.cursor().encode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CommitTime, Decimal, MarketId, PartyId, PositionCursor, PositionSettlement, Trade,
        TradeSettlement, TxHash,
    };

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn position() -> Position {
        Position::new_empty(MarketId::new("aa".to_string()), PartyId::new("bb".to_string()))
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = PositionSnapshot::try_from_position(&position()).unwrap();
        assert_eq!(snapshot.open_volume, 0);
        assert_eq!(snapshot.realised_pnl, "0");
        assert_eq!(snapshot.unrealised_pnl, "0");
        assert_eq!(snapshot.average_entry_price, "0");
        assert_eq!(snapshot.position_status, DistressedStatus::Unspecified);
        assert_eq!(snapshot.updated_at, 0);
    }

    #[test]
    fn test_snapshot_reflects_pending_trades() {
        let mut p = position();
        p.update_with_trade(&Trade::new(2, d("1000")), false, d("1")).unwrap();
        p.update_with_trade(&Trade::new(3, d("1200")), false, d("1")).unwrap();

        let snapshot = PositionSnapshot::try_from_position(&p).unwrap();
        assert_eq!(snapshot.open_volume, 5);
        assert_eq!(snapshot.average_entry_price, "1120");
        assert_eq!(snapshot.unrealised_pnl, "400");
        assert_eq!(p.confirmed.open_volume, 0);
    }

    #[test]
    fn test_snapshot_uses_market_scaled_price() {
        let mut p = position();
        p.update_with_position_settlement(&PositionSettlement {
            price: d("1000"),
            position_factor: d("1"),
            trades: vec![TradeSettlement::new(-5, d("10000000")).with_market_price(d("1000"))],
            tx_hash: TxHash::default(),
        })
        .unwrap();

        let snapshot = PositionSnapshot::try_from_position(&p).unwrap();
        assert_eq!(snapshot.average_entry_price, "1000");
        assert_eq!(p.confirmed.average_entry_price, d("10000000"));
    }

    #[test]
    fn test_snapshot_rounds_only_at_render() {
        let mut p = position();
        p.update_with_position_settlement(&PositionSettlement {
            price: d("1000"),
            position_factor: d("1000"),
            trades: vec![
                TradeSettlement::new(2, d("1000")),
                TradeSettlement::new(3, d("1200")),
            ],
            tx_hash: TxHash::default(),
        })
        .unwrap();

        let snapshot = PositionSnapshot::try_from_position(&p).unwrap();
        assert_eq!(snapshot.unrealised_pnl, "-1");
        assert_eq!(p.confirmed.unrealised_pnl, d("-0.6"));
    }

    #[test]
    fn test_snapshot_fails_on_negative_average() {
        let mut p = position();
        p.provisional.average_entry_market_price = d("-5");
        let err = PositionSnapshot::try_from_position(&p).unwrap_err();
        assert!(matches!(
            err,
            InvariantViolation::Unrepresentable {
                field: "pending_average_entry_market_price",
                ..
            }
        ));
    }

    #[test]
    fn test_snapshot_cursor_and_time() {
        let mut p = position();
        p.stamp(CommitTime::from_unix_nanos(42));
        let snapshot = PositionSnapshot::try_from_position(&p).unwrap();
        assert_eq!(snapshot.updated_at, 42);
        let cursor = PositionCursor::decode(&snapshot.cursor).unwrap().unwrap();
        assert_eq!(cursor, p.cursor());
    }
}
