//! The account-event consumer.
//!
//! A single task drains the shared account stream in order: balance
//! snapshots overwrite the view, fills update the owning engine's
//! holdings and release its in-flight order, and every event is
//! followed by the drawdown check. Fills that do not match the expected
//! order are still applied (the exchange is authoritative) but flagged
//! for operator visibility.

use crate::error::{AccountError, AccountResult};
use crate::registry::EngineRegistry;
use crate::view::AccountView;
use dipper_core::{AccountEvent, FillReport, OrderSide};
use dipper_engine::Lot;
use dipper_risk::DrawdownGuard;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Consumes the account stream and reconciles it into engine state.
pub struct ReconciliationConsumer {
    view: Arc<AccountView>,
    registry: Arc<EngineRegistry>,
    guard: Arc<DrawdownGuard>,
    events: mpsc::Receiver<AccountEvent>,
}

impl ReconciliationConsumer {
    pub fn new(
        view: Arc<AccountView>,
        registry: Arc<EngineRegistry>,
        guard: Arc<DrawdownGuard>,
        events: mpsc::Receiver<AccountEvent>,
    ) -> Self {
        Self {
            view,
            registry,
            guard,
            events,
        }
    }

    /// Drain the stream until it ends or the drawdown breaker trips.
    pub async fn run(mut self) -> AccountResult<()> {
        debug!("Reconciliation consumer started");
        while let Some(event) = self.events.recv().await {
            self.apply(event);

            let balance = self.balance();
            if self.guard.check(balance) {
                // blunt by design: every engine goes down, not just one
                self.registry.clear();
                return Err(AccountError::EmergencyStop(format!(
                    "balance {balance} breached the drawdown limit"
                )));
            }
        }
        debug!("Account stream ended");
        Ok(())
    }

    /// Realized plus unrealized balance in the main quote asset.
    fn balance(&self) -> Decimal {
        self.view.main_free() + self.registry.invested_quote_total()
    }

    fn apply(&self, event: AccountEvent) {
        match event {
            AccountEvent::BalanceSnapshot(balance) => {
                debug!(asset = %balance.asset, free = %balance.free, "Balance snapshot");
                self.view.apply(balance);
            }
            AccountEvent::Fill(report) => self.apply_fill(report),
        }
    }

    fn apply_fill(&self, report: FillReport) {
        if !report.status.is_filled() {
            debug!(
                symbol = %report.symbol,
                status = ?report.status,
                "Ignoring non-filled execution report"
            );
            return;
        }
        let Some(engine) = self.registry.get(&report.symbol) else {
            debug!(symbol = %report.symbol, "Fill for unmanaged symbol");
            return;
        };

        match report.side {
            OrderSide::Buy => {
                info!(
                    symbol = %report.symbol,
                    quantity = %report.quantity,
                    price = %report.price(),
                    "Buy fill: appending lot"
                );
                engine.push_lot(Lot {
                    symbol: report.symbol.clone(),
                    quantity: report.quantity,
                    quote_cost: report.quote_quantity,
                    price: report.price(),
                    order_token: Some(report.order_token.clone()),
                });
            }
            OrderSide::Sell => {
                info!(symbol = %report.symbol, "Sell fill: position closed");
                engine.clear_holdings();
            }
        }

        if engine.clear_pending_if(&report.order_token) {
            info!(symbol = %report.symbol, token = %report.order_token, "In-flight order reconciled");
        } else if let Some(pending) = engine.pending_order() {
            // applied anyway, but someone should look at this
            warn!(
                symbol = %report.symbol,
                expected = %pending,
                received = %report.order_token,
                "Desync: fill does not match the in-flight order"
            );
        }
    }
}
