//! Order-related types and identifiers.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side: buy or sell.
///
/// Wire encoding matches the upstream exchange ("BUY"/"SELL").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Execution status reported with a fill event.
///
/// Only `Filled` is actionable for reconciliation; everything else is
/// observed and ignored. Unknown statuses decode to `Other` instead of
/// failing the whole event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    #[serde(other)]
    Other,
}

impl FillStatus {
    /// Whether this status settles an order.
    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Filled)
    }
}

const TOKEN_LEN: usize = 22;
const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Client-generated idempotent order identifier.
///
/// Generated immediately before submission and carried until the matching
/// fill arrives. 22 random base-62 characters, which fits the upstream's
/// client-order-id constraints and is unguessable enough to never collide
/// within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderToken(String);

impl OrderToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self(
            (0..TOKEN_LEN)
                .map(|_| BASE62[rng.gen_range(0..BASE62.len())] as char)
                .collect(),
        )
    }

    /// Wrap a token received from the wire.
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderToken {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for OrderToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
