//! Tabular form of a position for batch persistence.

use crate::engine::Position;
use serde::{Deserialize, Serialize};

/// Column names in row order.
pub const POSITION_COLUMNS: &[&str] = &[
    "market_id",
    "party_id",
    "commit_time",
    "open_volume",
    "realised_pnl",
    "unrealised_pnl",
    "average_entry_price",
    "average_entry_market_price",
    "loss",
    "adjustment",
    "tx_hash",
    "pending_open_volume",
    "pending_realised_pnl",
    "pending_unrealised_pnl",
    "pending_average_entry_price",
    "pending_average_entry_market_price",
    "loss_socialisation_amount",
    "distressed_status",
    "taker_fees_paid",
    "maker_fees_received",
    "fees_paid",
    "taker_fees_paid_since",
    "maker_fees_received_since",
    "fees_paid_since",
    "funding_payment_amount",
    "funding_payment_amount_since",
];

/// One history row, keyed by (market_id, party_id, commit_time). Full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRow {
    pub market_id: String,
    pub party_id: String,
    /// RFC 3339 with nanoseconds.
    pub commit_time: String,
    pub open_volume: i64,
    pub realised_pnl: String,
    pub unrealised_pnl: String,
    pub average_entry_price: String,
    pub average_entry_market_price: String,
    pub loss: String,
    pub adjustment: String,
    pub tx_hash: String,
    pub pending_open_volume: i64,
    pub pending_realised_pnl: String,
    pub pending_unrealised_pnl: String,
    pub pending_average_entry_price: String,
    pub pending_average_entry_market_price: String,
    pub loss_socialisation_amount: String,
    pub distressed_status: i32,
    pub taker_fees_paid: String,
    pub maker_fees_received: String,
    pub fees_paid: String,
    pub taker_fees_paid_since: String,
    pub maker_fees_received_since: String,
    pub fees_paid_since: String,
    pub funding_payment_amount: String,
    pub funding_payment_amount_since: String,
}

impl PositionRow {
    pub fn from_position(position: &Position) -> Self {
        let confirmed = &position.confirmed;
        let pending = &position.provisional;
        Self {
            market_id: position.market_id.to_string(),
            party_id: position.party_id.to_string(),
            commit_time: position.commit_time.to_rfc3339(),
            open_volume: confirmed.open_volume,
            realised_pnl: confirmed.realised_pnl.to_canonical_string(),
            unrealised_pnl: confirmed.unrealised_pnl.to_canonical_string(),
            average_entry_price: confirmed.average_entry_price.to_canonical_string(),
            average_entry_market_price: confirmed.average_entry_market_price.to_canonical_string(),
            loss: position.loss.to_canonical_string(),
            adjustment: position.adjustment.to_canonical_string(),
            tx_hash: position.tx_hash.to_string(),
            pending_open_volume: pending.open_volume,
            pending_realised_pnl: pending.realised_pnl.to_canonical_string(),
            pending_unrealised_pnl: pending.unrealised_pnl.to_canonical_string(),
            pending_average_entry_price: pending.average_entry_price.to_canonical_string(),
            pending_average_entry_market_price: pending
                .average_entry_market_price
                .to_canonical_string(),
            loss_socialisation_amount: position.loss_socialisation_amount.to_canonical_string(),
            distressed_status: position.distressed_status.as_i32(),
            taker_fees_paid: position.fees.taker_fees_paid.to_canonical_string(),
            maker_fees_received: position.fees.maker_fees_received.to_canonical_string(),
            fees_paid: position.fees.fees_paid.to_canonical_string(),
            taker_fees_paid_since: position.fees_since.taker_fees_paid.to_canonical_string(),
            maker_fees_received_since: position
                .fees_since
                .maker_fees_received
                .to_canonical_string(),
            fees_paid_since: position.fees_since.fees_paid.to_canonical_string(),
            funding_payment_amount: position.funding_payment_amount.to_canonical_string(),
            funding_payment_amount_since: position
                .funding_payment_amount_since
                .to_canonical_string(),
        }
    }

    /// Sort key matching the history table's primary key.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.market_id, &self.party_id, &self.commit_time)
    }
}
