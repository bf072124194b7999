//! Rolling price-extremum tracking.
//!
//! `rise` and `dip` are watermarks, not bounds: `rise` only moves up on
//! new highs, `dip` only moves down on new lows, and a force-dip resets
//! both to a single value. The dip is the buy-reference price every
//! percentage gain is measured against.

use dipper_core::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classification of one observed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Price moved above the previous tick.
    Rise,
    /// Price fell below the dip watermark and reset it.
    Dip,
}

/// Current/rise/dip price state for one symbol.
///
/// Created all-zero; the first observed tick must be seeded with
/// [`PriceLevels::force_dip`] before observation so the dip watermark
/// starts at a real price instead of zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub current: Price,
    pub rise: Price,
    pub dip: Price,
}

impl PriceLevels {
    /// Fold one tick into the watermarks.
    ///
    /// Returns `Some(Rise)` on any upward move, `Some(Dip)` when the
    /// price undercuts the dip watermark, `None` otherwise. `current`
    /// is updated unconditionally.
    pub fn observe(&mut self, price: Price) -> Option<Reaction> {
        let mut reaction = None;
        if price > self.current {
            reaction = Some(Reaction::Rise);
            if price > self.rise {
                self.rise = price;
            }
        } else if price < self.dip {
            self.force_dip(Some(price));
            reaction = Some(Reaction::Dip);
        }
        self.current = price;
        reaction
    }

    /// Collapse both watermarks to `value`, or to `current` when absent.
    ///
    /// Used on the very first tick and after a non-profitable sell, so a
    /// falling market cannot immediately re-trigger a buy at a worse
    /// price.
    pub fn force_dip(&mut self, value: Option<Price>) {
        self.dip = value.unwrap_or(self.current);
        self.rise = self.dip;
    }

    /// Relative gain of `current` over the dip reference.
    pub fn price_change(&self) -> Decimal {
        self.current.change_from(self.dip)
    }
}
