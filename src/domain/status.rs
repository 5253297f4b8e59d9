//! Distressed status of a position.

use serde::{Deserialize, Serialize};

/// Margin/close-out status of a party in a market.
///
/// Discriminants follow the protocol's wire enum, which skips 3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum DistressedStatus {
    #[default]
    Unspecified = 0,
    /// The party's open orders were cancelled to free margin.
    OrdersClosed = 1,
    /// The party was closed out by the network. Terminal.
    ClosedOut = 2,
    /// Margin is insufficient; the party is at risk of close-out.
    Distressed = 4,
}

impl DistressedStatus {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistressedStatus::Unspecified => "POSITION_STATUS_UNSPECIFIED",
            DistressedStatus::OrdersClosed => "POSITION_STATUS_ORDERS_CLOSED",
            DistressedStatus::ClosedOut => "POSITION_STATUS_CLOSED_OUT",
            DistressedStatus::Distressed => "POSITION_STATUS_DISTRESSED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DistressedStatus::ClosedOut)
    }
}

impl std::fmt::Display for DistressedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
