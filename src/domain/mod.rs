//! Domain types for the position ledger.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: MarketId, PartyId, TxHash, CommitTime
//! - Typed event inputs and their envelope
//! - Commit-order sequence, position key and pagination cursor

pub mod decimal;
pub mod events;
pub mod ordering;
pub mod primitives;
pub mod status;

pub use decimal::Decimal;
pub use events::{
    ConfirmedEvent, EventEnvelope, FundingPayment, LossSocialization, MarketEnvelope, PositionEvent,
    PositionSettlement, SettleDistressed, SettleMarket, Trade, TradeFees, TradeSettlement,
};
pub use ordering::{CursorError, EventSequence, PositionCursor, PositionKey};
pub use primitives::{CommitTime, IdParseError, MarketId, PartyId, TxHash, NETWORK_PARTY};
pub use status::DistressedStatus;
