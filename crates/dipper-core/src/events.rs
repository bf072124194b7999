//! Stream records consumed by the engine.
//!
//! These are the already-parsed shapes delivered by the tick and
//! account-event streams; the wire decoding lives in `dipper-feed`.

use crate::{FillStatus, OrderSide, OrderToken, Price, Size};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observed trade for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Event time as reported by the stream.
    pub time: DateTime<Utc>,
    pub price: Price,
    pub quantity: Size,
}

impl Tick {
    pub fn new(time: DateTime<Utc>, price: Price, quantity: Size) -> Self {
        Self {
            time,
            price,
            quantity,
        }
    }
}

/// Free/locked amounts for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn new(asset: impl Into<String>, free: Decimal, locked: Decimal) -> Self {
        Self {
            asset: asset.into(),
            free,
            locked,
        }
    }
}

/// An execution report from the account stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    pub order_token: OrderToken,
    pub symbol: String,
    pub side: OrderSide,
    pub status: FillStatus,
    pub quantity: Size,
    /// Cumulative quote asset transacted.
    pub quote_quantity: Decimal,
}

impl FillReport {
    /// Effective fill price.
    ///
    /// The upstream reports price 0 on market fills, so it is always
    /// derived from the quote/base quantities.
    pub fn price(&self) -> Price {
        if self.quantity.is_zero() {
            return Price::ZERO;
        }
        Price::new(self.quote_quantity / self.quantity.inner())
    }
}

/// Tagged event from the shared account stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    /// Position snapshot for one asset; last write wins.
    BalanceSnapshot(Balance),
    /// Execution report for an order, ours or not.
    Fill(FillReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fill_price_is_derived() {
        let fill = FillReport {
            order_token: OrderToken::from_string("t".into()),
            symbol: "SOLUSDT".into(),
            side: OrderSide::Buy,
            status: FillStatus::Filled,
            quantity: Size::new(dec!(50)),
            quote_quantity: dec!(100),
        };
        assert_eq!(fill.price().inner(), dec!(2));
    }

    #[test]
    fn test_fill_price_zero_quantity() {
        let fill = FillReport {
            order_token: OrderToken::from_string("t".into()),
            symbol: "SOLUSDT".into(),
            side: OrderSide::Buy,
            status: FillStatus::Filled,
            quantity: Size::ZERO,
            quote_quantity: dec!(100),
        };
        assert_eq!(fill.price(), Price::ZERO);
    }
}
