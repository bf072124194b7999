//! Application configuration.

use crate::error::{AppError, AppResult};
use dipper_engine::{Params, TradeMode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Operating mode for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Fills are synthesized locally; no order ever leaves the process.
    #[default]
    Paper,
    /// Orders go through the configured order transport.
    Live,
}

impl OperatingMode {
    pub fn trade_mode(&self) -> TradeMode {
        match self {
            Self::Paper => TradeMode::Paper,
            Self::Live => TradeMode::Live,
        }
    }
}

/// Stream capture files for replay-driven sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Account-stream capture (one JSON payload per line). When absent
    /// the account stream is empty.
    #[serde(default)]
    pub account_file: Option<String>,
}

/// One symbol engine to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolConfig {
    /// Pair name, e.g. "SOLUSDT".
    pub symbol: String,
    /// Base asset, e.g. "SOL".
    pub base_asset: String,
    /// Quote asset. Defaults to the main asset.
    #[serde(default)]
    pub quote_asset: Option<String>,
    /// Exchange lot step for sell quantities.
    #[serde(default = "default_lot_step")]
    pub lot_step: Decimal,
    /// Quote amount committed per buy.
    #[serde(default = "default_invest_quote")]
    pub invest_quote: Decimal,
    /// Whether confirmed signals are acted on automatically.
    #[serde(default = "default_auto")]
    pub auto: bool,
    /// Decision thresholds.
    #[serde(default)]
    pub params: Params,
    /// Tick-stream capture file for replay sessions.
    #[serde(default)]
    pub trades_file: Option<String>,
}

fn default_lot_step() -> Decimal {
    Decimal::new(1, 6) // 0.000001
}

fn default_invest_quote() -> Decimal {
    Decimal::new(20, 0)
}

fn default_auto() -> bool {
    true
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: OperatingMode,

    /// The quote asset balances and drawdown are measured in.
    #[serde(default = "default_main_asset")]
    pub main_asset: String,

    /// Absolute drawdown below the fixated baseline that triggers the
    /// emergency stop, in main-asset units.
    #[serde(default = "default_max_drawdown")]
    pub max_drawdown: Decimal,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub symbols: Vec<SymbolConfig>,
}

fn default_main_asset() -> String {
    "USDT".to_string()
}

fn default_max_drawdown() -> Decimal {
    Decimal::new(20, 0)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            main_asset: default_main_asset(),
            max_drawdown: default_max_drawdown(),
            feed: FeedConfig::default(),
            symbols: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from a file, falling back to defaults when it is missing.
    pub fn load(config_path: &str) -> AppResult<Self> {
        if Path::new(config_path).exists() {
            Self::from_file(config_path)
        } else {
            warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Reject configurations the application cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.symbols.is_empty() {
            return Err(AppError::Config("no symbols configured".to_string()));
        }
        if !self.max_drawdown.is_sign_positive() {
            return Err(AppError::Config(
                "max_drawdown must be positive".to_string(),
            ));
        }
        for symbol in &self.symbols {
            symbol
                .params
                .validate()
                .map_err(|e| AppError::Config(format!("{}: {e}", symbol.symbol)))?;
            if symbol.invest_quote <= Decimal::ZERO {
                return Err(AppError::Config(format!(
                    "{}: invest_quote must be positive",
                    symbol.symbol
                )));
            }
        }
        Ok(())
    }

    pub fn is_paper(&self) -> bool {
        self.mode == OperatingMode::Paper
    }
}
