//! Signal derivation.
//!
//! A pure function of price state, holdings and parameters. Evaluation
//! order is significant: the loss cut dominates the profit take, which
//! dominates the trailing stop.

use crate::params::Params;
use crate::price::PriceLevels;
use crate::state::Lot;
use dipper_core::{OrderSide, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the engine wants to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Reason {
    /// Weighted loss beyond the stop-loss threshold.
    TooMuchLoss,
    /// Profit retraced too far from its high-water mark.
    TooMuchProfitLoss,
    /// Weighted profit reached the take-profit threshold.
    HasEnoughProfit,
    /// Price gained enough over the dip reference to enter.
    MinPriceGain,
}

impl Reason {
    /// The order side this reason drives.
    pub fn side(&self) -> OrderSide {
        match self {
            Self::TooMuchLoss | Self::TooMuchProfitLoss | Self::HasEnoughProfit => OrderSide::Sell,
            Self::MinPriceGain => OrderSide::Buy,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooMuchLoss => write!(f, "tooMuchLoss"),
            Self::TooMuchProfitLoss => write!(f, "tooMuchProfitLoss"),
            Self::HasEnoughProfit => write!(f, "hasEnoughProfit"),
            Self::MinPriceGain => write!(f, "minPriceGain"),
        }
    }
}

/// Absolute unrealized profit across all unsold lots, in quote units.
pub fn profit(holdings: &[Lot], current: Price) -> Decimal {
    holdings
        .iter()
        .map(|lot| (current.inner() - lot.price.inner()) * lot.quantity.inner())
        .sum()
}

/// Weighted percentage return across all unsold lots.
///
/// Each lot contributes its absolute gain relative to its own quote
/// cost, so the sum is the return on the total invested quote amount.
pub fn profit_percent(holdings: &[Lot], current: Price) -> Decimal {
    holdings
        .iter()
        .filter(|lot| !lot.quote_cost.is_zero())
        .map(|lot| (current.inner() - lot.price.inner()) * lot.quantity.inner() / lot.quote_cost)
        .sum()
}

/// Derive the zero-or-one candidate action for the current state.
///
/// `highest_profit_percent` is the profit high-water mark since the last
/// buy; the caller maintains it across ticks.
pub fn evaluate(
    levels: &PriceLevels,
    holdings: &[Lot],
    highest_profit_percent: Decimal,
    params: &Params,
) -> Option<Reason> {
    if !holdings.is_empty() {
        let pp = profit_percent(holdings, levels.current);
        if pp.is_sign_negative() && pp.abs() > params.max_percent_loss {
            Some(Reason::TooMuchLoss)
        } else if pp >= params.max_percent_profit {
            Some(Reason::HasEnoughProfit)
        } else if highest_profit_percent - pp >= params.max_percent_profit_loss {
            Some(Reason::TooMuchProfitLoss)
        } else {
            None
        }
    } else if levels.price_change() >= params.min_percent_to_buy {
        Some(Reason::MinPriceGain)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipper_core::Size;
    use rust_decimal_macros::dec;

    fn lot(price: Decimal, quantity: Decimal, quote_cost: Decimal) -> Lot {
        Lot {
            symbol: "TESTUSDT".to_string(),
            quantity: Size::new(quantity),
            quote_cost,
            price: Price::new(price),
            order_token: None,
        }
    }

    fn levels_at(current: Decimal, dip: Decimal) -> PriceLevels {
        PriceLevels {
            current: Price::new(current),
            rise: Price::new(current),
            dip: Price::new(dip),
        }
    }

    fn params() -> Params {
        Params {
            min_percent_to_buy: dec!(1),
            min_percent_to_buy_after_sell: dec!(0.5),
            max_percent_profit: dec!(2),
            max_percent_loss: dec!(0.5),
            max_percent_profit_loss: dec!(0.2),
            trades_to_confirm: 1,
        }
    }

    #[test]
    fn test_buy_signal_on_min_gain() {
        // price 1 -> 2 with threshold 1.0: change is exactly 1.0, fires
        let reason = evaluate(&levels_at(dec!(2), dec!(1)), &[], Decimal::ZERO, &params());
        assert_eq!(reason, Some(Reason::MinPriceGain));
        assert_eq!(reason.unwrap().side(), OrderSide::Buy);
    }

    #[test]
    fn test_no_buy_below_threshold() {
        let reason = evaluate(
            &levels_at(dec!(1.5), dec!(1)),
            &[],
            Decimal::ZERO,
            &params(),
        );
        assert_eq!(reason, None);
    }

    #[test]
    fn test_profit_take_threshold() {
        // bought 50 units at 2 for 100 quote
        let holdings = vec![lot(dec!(2), dec!(50), dec!(100))];

        // at price 3: (3-2)*50/100 = 0.5, below 2.0
        let reason = evaluate(
            &levels_at(dec!(3), dec!(1)),
            &holdings,
            dec!(0.5),
            &params(),
        );
        assert_eq!(reason, None);

        // at price 6: (6-2)*50/100 = 2.0, fires
        let reason = evaluate(&levels_at(dec!(6), dec!(1)), &holdings, dec!(2), &params());
        assert_eq!(reason, Some(Reason::HasEnoughProfit));
    }

    #[test]
    fn test_loss_cut_fires_and_dominates() {
        // bought 20 units at 5 for 100 quote; at price 1: (1-5)*20/100 = -0.8
        let holdings = vec![lot(dec!(5), dec!(20), dec!(100))];
        let reason = evaluate(
            &levels_at(dec!(1), dec!(1)),
            &holdings,
            Decimal::ZERO,
            &params(),
        );
        assert_eq!(reason, Some(Reason::TooMuchLoss));
        assert_eq!(reason.unwrap().side(), OrderSide::Sell);
    }

    #[test]
    fn test_trailing_stop_while_still_profitable() {
        // bought 100 units at 1 for 100 quote; peaked at price 7 (pp = 6.0)
        let holdings = vec![lot(dec!(1), dec!(100), dec!(100))];

        // at price 3: pp = 2.0... but profit take checks first (2.0 >= 2.0)
        // drop the take-profit bar to isolate the trailing stop
        let mut p = params();
        p.max_percent_profit = dec!(10);
        let reason = evaluate(&levels_at(dec!(3), dec!(1)), &holdings, dec!(6), &p);
        assert_eq!(reason, Some(Reason::TooMuchProfitLoss));
    }

    #[test]
    fn test_weighted_profit_across_lots() {
        let holdings = vec![
            lot(dec!(2), dec!(50), dec!(100)),
            lot(dec!(4), dec!(25), dec!(100)),
        ];
        let current = Price::new(dec!(4));
        // (4-2)*50/100 + (4-4)*25/100 = 1.0
        assert_eq!(profit_percent(&holdings, current), dec!(1));
        // (4-2)*50 + 0 = 100
        assert_eq!(profit(&holdings, current), dec!(100));
    }

    #[test]
    fn test_empty_holdings_have_zero_profit() {
        assert_eq!(profit(&[], Price::new(dec!(5))), Decimal::ZERO);
        assert_eq!(profit_percent(&[], Price::new(dec!(5))), Decimal::ZERO);
    }
}
