//! Stable ordering and keys for deterministic position processing.

use crate::domain::{CommitTime, MarketId, PartyId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol commit order of an event: block height, then intra-block sequence number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EventSequence {
    /// Block height (primary sort).
    pub block_height: u64,
    /// Sequence number within the block (secondary sort).
    pub seq_num: u64,
}

impl EventSequence {
    pub fn new(block_height: u64, seq_num: u64) -> Self {
        Self {
            block_height,
            seq_num,
        }
    }
}

impl std::fmt::Display for EventSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.block_height, self.seq_num)
    }
}

/// Identity of a position: exactly one per (market, party).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub market_id: MarketId,
    pub party_id: PartyId,
}

impl PositionKey {
    pub fn new(market_id: MarketId, party_id: PartyId) -> Self {
        Self {
            market_id,
            party_id,
        }
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.market_id, self.party_id)
    }
}

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("cursor payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Stable sort key for position history: (market, party, commit time).
///
/// Field order matches the derived `Ord`, so sorting cursors sorts rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionCursor {
    pub market_id: MarketId,
    pub party_id: PartyId,
    pub commit_time: CommitTime,
}

impl PositionCursor {
    pub fn new(market_id: MarketId, party_id: PartyId, commit_time: CommitTime) -> Self {
        Self {
            market_id,
            party_id,
            commit_time,
        }
    }

    /// Opaque cursor string: hex of the JSON form.
    pub fn encode(&self) -> String {
        // Serializing plain strings and a timestamp cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(json)
    }

    /// Parse an encoded cursor. An empty string means "no cursor".
    ///
    /// # Errors
    /// Returns an error if the string is not hex or does not hold a cursor.
    pub fn decode(encoded: &str) -> Result<Option<Self>, CursorError> {
        if encoded.is_empty() {
            return Ok(None);
        }
        let bytes = hex::decode(encoded)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}
