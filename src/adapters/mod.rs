//! Event adapters: decode wire events into typed, validated ledger inputs.
//!
//! All parsing happens here. Anything that reaches the ledger is well-formed.

use crate::domain::{
    CommitTime, ConfirmedEvent, Decimal, EventEnvelope, EventSequence, FundingPayment,
    IdParseError, LossSocialization, MarketEnvelope, MarketId, PartyId, PositionEvent,
    PositionKey, PositionSettlement, SettleDistressed, SettleMarket, Trade, TradeFees,
    TradeSettlement, TxHash,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod wire;

pub use wire::{WireEvent, WireFees, WirePayload, WireTradeSettlement};

/// Rejection of a single wire event. Recoverable: the event never reaches the ledger.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed event JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid decimal in {field}: {value:?}")]
    InvalidDecimal { field: &'static str, value: String },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: String },
    #[error("position factor must not be zero")]
    ZeroPositionFactor,
    #[error("invalid {field}: {source}")]
    InvalidId {
        field: &'static str,
        source: IdParseError,
    },
    #[error("invalid commit time {0:?}")]
    InvalidCommitTime(String),
    #[error("trade size {0} does not fit a signed volume")]
    SizeOverflow(u64),
    #[error("trade has {0} on both sides")]
    SelfTrade(PartyId),
}

/// A decoded event, routed either to specific positions or to a whole market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    /// One envelope per addressed party (two for a trade).
    Party(Vec<EventEnvelope>),
    MarketWide(MarketEnvelope),
}

/// Decode one JSON line.
///
/// # Errors
/// Returns a `DecodeError` if the JSON or any field inside it is malformed.
pub fn decode_line(line: &str) -> Result<DecodedEvent, DecodeError> {
    let wire: WireEvent = serde_json::from_str(line)?;
    decode_event(wire)
}

/// Validate a wire event and convert it into ledger inputs.
///
/// # Errors
/// Returns a `DecodeError` if any field is malformed.
pub fn decode_event(wire: WireEvent) -> Result<DecodedEvent, DecodeError> {
    let market_id = parse_market(&wire.market_id)?;
    let sequence = EventSequence::new(wire.block_height, wire.seq_num);
    let commit_time = parse_commit_time(&wire.commit_time)?;

    let envelope = |party_id: PartyId, event: PositionEvent| EventEnvelope {
        key: PositionKey::new(market_id.clone(), party_id),
        sequence,
        commit_time,
        event,
    };

    let decoded = match wire.payload {
        WirePayload::SettlePosition {
            party_id,
            price,
            position_factor,
            trades,
            tx_hash,
        } => {
            let trades = trades
                .into_iter()
                .map(decode_trade_settlement)
                .collect::<Result<Vec<_>, _>>()?;
            let event = PositionSettlement {
                price: parse_unsigned("price", &price)?,
                position_factor: parse_position_factor(&position_factor)?,
                trades,
                tx_hash: TxHash::new(tx_hash),
            };
            DecodedEvent::Party(vec![envelope(
                parse_party("party_id", &party_id)?,
                PositionEvent::Confirmed(ConfirmedEvent::PositionSettlement(event)),
            )])
        }
        WirePayload::LossSocialization {
            party_id,
            amount,
            tx_hash,
        } => {
            let event = LossSocialization {
                amount: parse_decimal("amount", &amount)?,
                tx_hash: TxHash::new(tx_hash),
            };
            DecodedEvent::Party(vec![envelope(
                parse_party("party_id", &party_id)?,
                PositionEvent::Confirmed(ConfirmedEvent::LossSocialization(event)),
            )])
        }
        WirePayload::SettleDistressed {
            party_id,
            margin,
            tx_hash,
        } => {
            let event = SettleDistressed {
                margin: parse_unsigned("margin", &margin)?,
                tx_hash: TxHash::new(tx_hash),
            };
            DecodedEvent::Party(vec![envelope(
                parse_party("party_id", &party_id)?,
                PositionEvent::Confirmed(ConfirmedEvent::SettleDistressed(event)),
            )])
        }
        WirePayload::SettleMarket {
            party_id,
            settled_price,
            position_factor,
            tx_hash,
        } => {
            let event = PositionEvent::Confirmed(ConfirmedEvent::SettleMarket(SettleMarket {
                settled_price: parse_unsigned("settled_price", &settled_price)?,
                position_factor: parse_position_factor(&position_factor)?,
                tx_hash: TxHash::new(tx_hash),
            }));
            match party_id {
                Some(party_id) => DecodedEvent::Party(vec![envelope(
                    parse_party("party_id", &party_id)?,
                    event,
                )]),
                None => DecodedEvent::MarketWide(MarketEnvelope {
                    market_id: market_id.clone(),
                    sequence,
                    commit_time,
                    event,
                }),
            }
        }
        WirePayload::Trade {
            buyer,
            seller,
            size,
            price,
            asset_price,
            position_factor,
            buyer_fee,
            seller_fee,
        } => {
            let buyer = parse_party("buyer", &buyer)?;
            let seller = parse_party("seller", &seller)?;
            // Both sides would share one sequence number on one key.
            if buyer == seller {
                return Err(DecodeError::SelfTrade(buyer));
            }
            let size = i64::try_from(size).map_err(|_| DecodeError::SizeOverflow(size))?;
            let price = parse_unsigned("price", &price)?;
            let asset_price = match asset_price {
                Some(raw) => parse_unsigned("asset_price", &raw)?,
                None => price,
            };
            let position_factor = parse_position_factor(&position_factor)?;
            let trade = Trade {
                size,
                price,
                asset_price,
                fees: TradeFees::default(),
            };

            let buyer_event = PositionEvent::Trade {
                trade: Trade {
                    fees: decode_fees(buyer_fee)?,
                    ..trade.clone()
                },
                seller: false,
                position_factor,
            };
            let seller_event = PositionEvent::Trade {
                trade: Trade {
                    fees: decode_fees(seller_fee)?,
                    ..trade
                },
                seller: true,
                position_factor,
            };
            DecodedEvent::Party(vec![
                envelope(buyer, buyer_event),
                envelope(seller, seller_event),
            ])
        }
        WirePayload::OrdersClosed { party_id } => DecodedEvent::Party(vec![envelope(
            parse_party("party_id", &party_id)?,
            PositionEvent::OrdersClosed,
        )]),
        WirePayload::DistressedToggle { party_id } => DecodedEvent::Party(vec![envelope(
            parse_party("party_id", &party_id)?,
            PositionEvent::DistressedToggle,
        )]),
        WirePayload::FundingPayment { party_id, amount } => DecodedEvent::Party(vec![envelope(
            parse_party("party_id", &party_id)?,
            PositionEvent::FundingPayment(FundingPayment {
                amount: parse_decimal("amount", &amount)?,
            }),
        )]),
    };

    Ok(decoded)
}

fn decode_trade_settlement(wire: WireTradeSettlement) -> Result<TradeSettlement, DecodeError> {
    let price = parse_unsigned("trades.price", &wire.price)?;
    let market_price = match wire.market_price {
        Some(raw) => parse_unsigned("trades.market_price", &raw)?,
        None => price,
    };
    Ok(TradeSettlement {
        size: wire.size,
        price,
        market_price,
    })
}

fn decode_fees(wire: Option<WireFees>) -> Result<TradeFees, DecodeError> {
    let Some(wire) = wire else {
        return Ok(TradeFees::default());
    };
    let field = |name: &'static str, raw: Option<String>| match raw {
        Some(raw) => parse_unsigned(name, &raw),
        None => Ok(Decimal::zero()),
    };
    Ok(TradeFees {
        maker: field("maker_fee", wire.maker_fee)?,
        taker: field("taker_fee", wire.taker_fee)?,
        other: field("other_fees", wire.other_fees)?,
    })
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, DecodeError> {
    Decimal::from_str_canonical(raw.trim()).map_err(|_| DecodeError::InvalidDecimal {
        field,
        value: raw.to_string(),
    })
}

fn parse_unsigned(field: &'static str, raw: &str) -> Result<Decimal, DecodeError> {
    let value = parse_decimal(field, raw)?;
    if value.is_negative() {
        return Err(DecodeError::Negative {
            field,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

fn parse_position_factor(raw: &str) -> Result<Decimal, DecodeError> {
    let value = parse_unsigned("position_factor", raw)?;
    if value.is_zero() {
        return Err(DecodeError::ZeroPositionFactor);
    }
    Ok(value)
}

fn parse_market(raw: &str) -> Result<MarketId, DecodeError> {
    MarketId::parse(raw).map_err(|source| DecodeError::InvalidId {
        field: "market_id",
        source,
    })
}

fn parse_party(field: &'static str, raw: &str) -> Result<PartyId, DecodeError> {
    PartyId::parse(raw).map_err(|source| DecodeError::InvalidId { field, source })
}

fn parse_commit_time(raw: &str) -> Result<CommitTime, DecodeError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| CommitTime::new(t.with_timezone(&Utc)))
        .map_err(|_| DecodeError::InvalidCommitTime(raw.to_string()))
}
