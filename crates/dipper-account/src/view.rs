//! Shared account balance view.
//!
//! Single-writer discipline: only the reconciliation consumer calls
//! [`AccountView::apply`]; decision loops read without blocking on
//! writes and tolerate brief staleness. Updates are last-write-wins per
//! asset, mirroring the position snapshots the upstream sends.

use dashmap::DashMap;
use dipper_core::Balance;
use rust_decimal::Decimal;

/// Per-asset free/locked balances shared across engines.
#[derive(Debug)]
pub struct AccountView {
    /// The quote asset everything is ultimately valued in.
    main_asset: String,
    balances: DashMap<String, Balance>,
}

impl AccountView {
    pub fn new(main_asset: impl Into<String>) -> Self {
        Self {
            main_asset: main_asset.into(),
            balances: DashMap::new(),
        }
    }

    pub fn main_asset(&self) -> &str {
        &self.main_asset
    }

    /// Overwrite the balance for one asset. Reconciler only.
    pub fn apply(&self, balance: Balance) {
        self.balances.insert(balance.asset.clone(), balance);
    }

    pub fn balance(&self, asset: &str) -> Option<Balance> {
        self.balances.get(asset).map(|entry| entry.clone())
    }

    /// Free amount for an asset, zero when unknown.
    pub fn free(&self, asset: &str) -> Decimal {
        self.balances
            .get(asset)
            .map(|entry| entry.free)
            .unwrap_or(Decimal::ZERO)
    }

    /// Free amount of the main quote asset.
    pub fn main_free(&self) -> Decimal {
        self.free(&self.main_asset)
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
