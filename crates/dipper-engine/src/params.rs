//! Per-symbol trading parameters.
//!
//! Pure configuration, mutable at runtime (the engine keeps them behind a
//! lock so an operator can retune a running symbol). All percentage
//! thresholds are plain fractions: 0.04 means 4%.

use crate::error::{EngineError, EngineResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Thresholds driving the buy/sell decision for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Minimum gain over the dip reference before a buy signal fires.
    #[serde(default = "default_min_percent_to_buy")]
    pub min_percent_to_buy: Decimal,

    /// Re-entry threshold applied to the dip after a profitable sell.
    /// Useful against whipsaw: re-buying after a profitable exit requires
    /// a larger confirmed move than a fresh start.
    #[serde(default = "default_min_percent_to_buy_after_sell")]
    pub min_percent_to_buy_after_sell: Decimal,

    /// Take-profit threshold on the weighted position return.
    #[serde(default = "default_max_percent_profit")]
    pub max_percent_profit: Decimal,

    /// Stop-loss threshold on the weighted position return.
    #[serde(default = "default_max_percent_loss")]
    pub max_percent_loss: Decimal,

    /// Trailing stop: maximum retrace from the profit high-water mark.
    #[serde(default = "default_max_percent_profit_loss")]
    pub max_percent_profit_loss: Decimal,

    /// Consecutive same-side snapshots required before a signal is acted on.
    #[serde(default = "default_trades_to_confirm")]
    pub trades_to_confirm: usize,
}

fn default_min_percent_to_buy() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

fn default_min_percent_to_buy_after_sell() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_max_percent_profit() -> Decimal {
    Decimal::new(4, 2) // 0.04
}

fn default_max_percent_loss() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

fn default_max_percent_profit_loss() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_trades_to_confirm() -> usize {
    6
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_percent_to_buy: default_min_percent_to_buy(),
            min_percent_to_buy_after_sell: default_min_percent_to_buy_after_sell(),
            max_percent_profit: default_max_percent_profit(),
            max_percent_loss: default_max_percent_loss(),
            max_percent_profit_loss: default_max_percent_profit_loss(),
            trades_to_confirm: default_trades_to_confirm(),
        }
    }
}

impl Params {
    /// Reject parameter sets the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.trades_to_confirm == 0 {
            return Err(EngineError::InvalidParams(
                "trades_to_confirm must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("min_percent_to_buy", self.min_percent_to_buy),
            (
                "min_percent_to_buy_after_sell",
                self.min_percent_to_buy_after_sell,
            ),
            ("max_percent_profit", self.max_percent_profit),
            ("max_percent_loss", self.max_percent_loss),
            ("max_percent_profit_loss", self.max_percent_profit_loss),
        ] {
            if value.is_sign_negative() {
                return Err(EngineError::InvalidParams(format!(
                    "{name} must not be negative"
                )));
            }
        }
        Ok(())
    }
}
