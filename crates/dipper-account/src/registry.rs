//! Symbol-to-engine lookup.
//!
//! An explicitly passed context object, not a global: the application
//! builds it once and hands it to the reconciler, which routes fills
//! through it and values open positions for the drawdown check.

use dashmap::DashMap;
use dipper_engine::EngineState;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Engines keyed by symbol name.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: DashMap<String, Arc<EngineState>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, engine: Arc<EngineState>) {
        self.engines
            .insert(engine.symbol().symbol.clone(), engine);
    }

    pub fn get(&self, symbol: &str) -> Option<Arc<EngineState>> {
        self.engines.get(symbol).map(|entry| entry.clone())
    }

    /// Snapshot of all engines.
    pub fn all(&self) -> Vec<Arc<EngineState>> {
        self.engines.iter().map(|entry| entry.clone()).collect()
    }

    /// Drop every engine. Used by the emergency teardown.
    pub fn clear(&self) {
        self.engines.clear();
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Current value of all open positions in quote units.
    pub fn invested_quote_total(&self) -> Decimal {
        self.engines
            .iter()
            .map(|entry| entry.invested_quote())
            .sum()
    }
}
