//! JSON wire shapes of ledger events. Numeric fields are strings to stay lossless.

use serde::{Deserialize, Serialize};

/// One line of the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    pub block_height: u64,
    pub seq_num: u64,
    /// RFC 3339.
    pub commit_time: String,
    pub market_id: String,
    #[serde(flatten)]
    pub payload: WirePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WirePayload {
    SettlePosition {
        party_id: String,
        price: String,
        position_factor: String,
        trades: Vec<WireTradeSettlement>,
        #[serde(default)]
        tx_hash: String,
    },
    LossSocialization {
        party_id: String,
        amount: String,
        #[serde(default)]
        tx_hash: String,
    },
    SettleDistressed {
        party_id: String,
        margin: String,
        #[serde(default)]
        tx_hash: String,
    },
    /// Without `party_id` the settlement applies to every position in the market.
    SettleMarket {
        #[serde(default)]
        party_id: Option<String>,
        settled_price: String,
        position_factor: String,
        #[serde(default)]
        tx_hash: String,
    },
    Trade {
        buyer: String,
        seller: String,
        size: u64,
        /// Market-scale price.
        price: String,
        /// Asset-scale price; defaults to `price`.
        #[serde(default)]
        asset_price: Option<String>,
        position_factor: String,
        #[serde(default)]
        buyer_fee: Option<WireFees>,
        #[serde(default)]
        seller_fee: Option<WireFees>,
    },
    OrdersClosed {
        party_id: String,
    },
    DistressedToggle {
        party_id: String,
    },
    FundingPayment {
        party_id: String,
        amount: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTradeSettlement {
    pub size: i64,
    pub price: String,
    /// Defaults to `price`.
    #[serde(default)]
    pub market_price: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFees {
    #[serde(default)]
    pub maker_fee: Option<String>,
    #[serde(default)]
    pub taker_fee: Option<String>,
    #[serde(default)]
    pub other_fees: Option<String>,
}
