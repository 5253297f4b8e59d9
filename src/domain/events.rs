//! Typed event inputs consumed by the position ledger.
//!
//! Values here are already validated; decoding from the wire lives in `adapters`.

use crate::domain::{CommitTime, Decimal, EventSequence, MarketId, PositionKey, TxHash};
use serde::{Deserialize, Serialize};

/// One trade inside a position settlement, from this party's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSettlement {
    /// Signed size: positive bought, negative sold.
    pub size: i64,
    /// Trade price in settlement-asset scale.
    pub price: Decimal,
    /// Trade price in market scale.
    pub market_price: Decimal,
}

impl TradeSettlement {
    /// Settlement entry whose asset and market prices share the same scale.
    pub fn new(size: i64, price: Decimal) -> Self {
        Self {
            size,
            price,
            market_price: price,
        }
    }

    pub fn with_market_price(mut self, market_price: Decimal) -> Self {
        self.market_price = market_price;
        self
    }
}

/// Mark-to-market settlement confirming the trades of one settlement cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSettlement {
    /// Mark price the cycle settled at.
    pub price: Decimal,
    pub position_factor: Decimal,
    pub trades: Vec<TradeSettlement>,
    pub tx_hash: TxHash,
}

/// Loss socialization applied to a party. Negative amount is a loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossSocialization {
    pub amount: Decimal,
    pub tx_hash: TxHash,
}

/// Close-out of a distressed party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleDistressed {
    /// Margin consumed by the network.
    pub margin: Decimal,
    pub tx_hash: TxHash,
}

/// Final settlement when the market terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleMarket {
    pub settled_price: Decimal,
    pub position_factor: Decimal,
    pub tx_hash: TxHash,
}

/// Authoritative events: each one ends with the provisional state synced to the confirmed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmedEvent {
    PositionSettlement(PositionSettlement),
    LossSocialization(LossSocialization),
    SettleDistressed(SettleDistressed),
    SettleMarket(SettleMarket),
}

impl ConfirmedEvent {
    pub fn tx_hash(&self) -> &TxHash {
        match self {
            ConfirmedEvent::PositionSettlement(e) => &e.tx_hash,
            ConfirmedEvent::LossSocialization(e) => &e.tx_hash,
            ConfirmedEvent::SettleDistressed(e) => &e.tx_hash,
            ConfirmedEvent::SettleMarket(e) => &e.tx_hash,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConfirmedEvent::PositionSettlement(_) => "settle_position",
            ConfirmedEvent::LossSocialization(_) => "loss_socialization",
            ConfirmedEvent::SettleDistressed(_) => "settle_distressed",
            ConfirmedEvent::SettleMarket(_) => "settle_market",
        }
    }
}

/// Fees attributed to one side of a trade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFees {
    /// Maker fee received.
    pub maker: Decimal,
    /// Taker fee paid.
    pub taker: Decimal,
    /// Infrastructure and liquidity fees paid.
    pub other: Decimal,
}

/// A trade as seen before its settlement cycle is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Absolute size; the side is given separately.
    pub size: i64,
    /// Price in market scale.
    pub price: Decimal,
    /// Price in settlement-asset scale.
    pub asset_price: Decimal,
    pub fees: TradeFees,
}

impl Trade {
    /// Trade whose market and asset prices share the same scale, with no fees.
    pub fn new(size: i64, price: Decimal) -> Self {
        Self {
            size,
            price,
            asset_price: price,
            fees: TradeFees::default(),
        }
    }

    pub fn with_asset_price(mut self, asset_price: Decimal) -> Self {
        self.asset_price = asset_price;
        self
    }

    pub fn with_fees(mut self, fees: TradeFees) -> Self {
        self.fees = fees;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingPayment {
    /// Signed: positive received, negative paid.
    pub amount: Decimal,
}

/// Every input the ledger accepts for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionEvent {
    Confirmed(ConfirmedEvent),
    Trade {
        trade: Trade,
        seller: bool,
        position_factor: Decimal,
    },
    OrdersClosed,
    DistressedToggle,
    FundingPayment(FundingPayment),
}

impl PositionEvent {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PositionEvent::Confirmed(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PositionEvent::Confirmed(e) => e.kind(),
            PositionEvent::Trade { .. } => "trade",
            PositionEvent::OrdersClosed => "orders_closed",
            PositionEvent::DistressedToggle => "distressed_toggle",
            PositionEvent::FundingPayment(_) => "funding_payment",
        }
    }
}

/// An event addressed to one position, stamped with its commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub key: PositionKey,
    pub sequence: EventSequence,
    pub commit_time: CommitTime,
    pub event: PositionEvent,
}

/// An event addressed to every position of one market (e.g. final market settlement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEnvelope {
    pub market_id: MarketId,
    pub sequence: EventSequence,
    pub commit_time: CommitTime,
    pub event: PositionEvent,
}
