//! Asset pair metadata.
//!
//! Symbols and their exchange constraints are static for the lifetime of
//! an engine: loaded once at startup, read-only afterwards.

use crate::error::{CoreError, Result};
use crate::Size;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A tradable asset pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// Pair name as the exchange knows it, e.g. "SOLUSDT".
    pub symbol: String,
    /// Base asset, e.g. "SOL".
    pub base_asset: String,
    /// Quote asset, e.g. "USDT".
    pub quote_asset: String,
}

impl Symbol {
    pub fn new(
        symbol: impl Into<String>,
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Exchange constraints for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMeta {
    /// Lot step: sell quantities are floored to a multiple of this.
    pub lot_step: Size,
}

impl SymbolMeta {
    pub fn new(lot_step: Size) -> Self {
        Self { lot_step }
    }
}

/// Static symbol metadata lookup, loaded once at startup.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, (Symbol, SymbolMeta)>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol, meta: SymbolMeta) {
        self.entries.insert(symbol.symbol.clone(), (symbol, meta));
    }

    pub fn get(&self, symbol: &str) -> Option<&(Symbol, SymbolMeta)> {
        self.entries.get(symbol)
    }

    /// Lookup that treats a missing symbol as an error.
    pub fn require(&self, symbol: &str) -> Result<&(Symbol, SymbolMeta)> {
        self.entries
            .get(symbol)
            .ok_or_else(|| CoreError::UnknownSymbol(symbol.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
