//! Domain primitives: MarketId, PartyId, TxHash, CommitTime.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Party identifier reserved for the protocol itself (close-out counterparty).
pub const NETWORK_PARTY: &str = "network";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier is not valid hex: {0}")]
    NotHex(String),
}

/// Strip an optional `0x` prefix and require the rest to decode as hex.
fn validate_hex_id(raw: &str) -> Result<String, IdParseError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if body.is_empty() {
        return Err(IdParseError::Empty);
    }
    hex::decode(body).map_err(|_| IdParseError::NotHex(raw.to_string()))?;
    Ok(body.to_ascii_lowercase())
}

/// Market identifier (hex string, lowercase, without `0x`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketId(pub String);

impl MarketId {
    /// Create a MarketId without validation.
    pub fn new(id: String) -> Self {
        MarketId(id)
    }

    /// Parse and normalize a market ID.
    ///
    /// # Errors
    /// Returns an error if the ID is empty or not hex.
    pub fn parse(raw: &str) -> Result<Self, IdParseError> {
        validate_hex_id(raw).map(MarketId)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Party identifier (hex public key, or the reserved `network` party).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartyId(pub String);

impl PartyId {
    /// Create a PartyId without validation.
    pub fn new(id: String) -> Self {
        PartyId(id)
    }

    /// Parse and normalize a party ID.
    ///
    /// # Errors
    /// Returns an error if the ID is empty or neither hex nor `network`.
    pub fn parse(raw: &str) -> Result<Self, IdParseError> {
        if raw.trim() == NETWORK_PARTY {
            return Ok(PartyId(NETWORK_PARTY.to_string()));
        }
        validate_hex_id(raw).map(PartyId)
    }

    pub fn is_network(&self) -> bool {
        self.0 == NETWORK_PARTY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of the transaction that produced the last applied event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: String) -> Self {
        TxHash(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Block commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommitTime(pub DateTime<Utc>);

impl CommitTime {
    pub fn new(at: DateTime<Utc>) -> Self {
        CommitTime(at)
    }

    /// Unix epoch; used before any event has been applied.
    pub fn epoch() -> Self {
        CommitTime(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Build from nanoseconds since the Unix epoch.
    pub fn from_unix_nanos(nanos: i64) -> Self {
        CommitTime(Utc.timestamp_nanos(nanos))
    }

    /// Nanoseconds since the Unix epoch (0 for the epoch itself).
    pub fn unix_nanos(&self) -> i64 {
        self.0.timestamp_nanos_opt().unwrap_or_default()
    }

    pub fn is_epoch(&self) -> bool {
        self.0 == DateTime::<Utc>::UNIX_EPOCH
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
    }
}

impl Default for CommitTime {
    fn default() -> Self {
        Self::epoch()
    }
}

impl std::fmt::Display for CommitTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}
