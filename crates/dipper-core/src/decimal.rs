//! Precision-safe decimal types for trading.
//!
//! Uses `rust_decimal` for exact decimal arithmetic; float rounding error
//! compounds badly in watermark tracking and lot accounting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` so prices and sizes cannot be mixed up in
/// calculations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Relative change from a reference price: `self / reference - 1`.
    ///
    /// Returns zero when the reference is zero. A zero reference only
    /// occurs before the first tick has seeded the dip watermark, and
    /// "no change" keeps every threshold comparison false, which is the
    /// wanted outcome for an unseeded tracker.
    #[inline]
    pub fn change_from(&self, reference: Price) -> Decimal {
        if reference.is_zero() {
            return Decimal::ZERO;
        }
        self.0 / reference.0 - Decimal::ONE
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Quantity with exact decimal precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round down to the exchange lot step: `floor(qty / step) * step`.
    ///
    /// A zero step passes the quantity through unchanged.
    #[inline]
    pub fn round_to_lot(&self, lot_step: Size) -> Self {
        if lot_step.is_zero() {
            return *self;
        }
        Self((self.0 / lot_step.0).floor() * lot_step.0)
    }

    /// Notional value: quantity * price, in quote units.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Size {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_change_from() {
        let current = Price::new(dec!(2));
        let dip = Price::new(dec!(1));
        assert_eq!(current.change_from(dip), dec!(1));

        let down = Price::new(dec!(0.5));
        assert_eq!(down.change_from(dip), dec!(-0.5));
    }

    #[test]
    fn test_change_from_zero_reference() {
        let current = Price::new(dec!(100));
        assert_eq!(current.change_from(Price::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_round_to_lot() {
        let qty = Size::new(dec!(1.2345));
        let step = Size::new(dec!(0.001));
        assert_eq!(qty.round_to_lot(step).inner(), dec!(1.234));

        // whole-unit step
        let step = Size::new(dec!(1));
        assert_eq!(qty.round_to_lot(step).inner(), dec!(1));
    }

    #[test]
    fn test_round_to_lot_zero_step() {
        let qty = Size::new(dec!(1.2345));
        assert_eq!(qty.round_to_lot(Size::ZERO), qty);
    }

    #[test]
    fn test_notional() {
        let qty = Size::new(dec!(0.5));
        let price = Price::new(dec!(40));
        assert_eq!(qty.notional(price), dec!(20));
    }
}
