//! The per-symbol decision loop.
//!
//! Wires a tick stream into price tracking, signal evaluation, the
//! confirmation window and the order gate. One loop per symbol, one
//! task per loop; the loop is the only writer of the price watermarks
//! and the snapshot history.

use crate::gate::OrderGate;
use crate::history::{ConfirmationHistory, SignalSnapshot};
use crate::price::Reaction;
use crate::state::EngineState;
use dipper_core::Tick;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Drives one symbol's automated behavior from its tick stream.
pub struct DecisionLoop {
    state: Arc<EngineState>,
    gate: OrderGate,
    ticks: mpsc::Receiver<Tick>,
    shutdown: CancellationToken,
    history: ConfirmationHistory,
}

impl DecisionLoop {
    pub fn new(
        state: Arc<EngineState>,
        gate: OrderGate,
        ticks: mpsc::Receiver<Tick>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state,
            gate,
            ticks,
            shutdown,
            history: ConfirmationHistory::new(),
        }
    }

    /// Consume ticks until the stream ends or the loop is cancelled.
    ///
    /// Cancellation drops the receiver, which releases the subscription;
    /// no state is mutated after that point.
    pub async fn run(mut self) {
        debug!(symbol = %self.state.symbol(), "Decision loop started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                maybe_tick = self.ticks.recv() => match maybe_tick {
                    Some(tick) => self.on_tick(tick).await,
                    None => break,
                },
            }
        }
        debug!(symbol = %self.state.symbol(), "Decision loop stopped");
    }

    /// Apply one tick: track price, evaluate, confirm, maybe act.
    async fn on_tick(&mut self, tick: Tick) {
        self.state.audit().record_trade(&tick);
        let first = self.state.record_tick(tick);

        match self.state.observe_price(tick.price, first) {
            Some(Reaction::Rise) => {
                debug!(symbol = %self.state.symbol(), price = %tick.price, "Price rose")
            }
            Some(Reaction::Dip) => {
                debug!(symbol = %self.state.symbol(), price = %tick.price, "Price dipped")
            }
            None => {}
        }

        self.state.update_highest_profit();

        let reason = self.state.evaluate_signal();
        self.history.push(SignalSnapshot {
            levels: self.state.levels(),
            reason,
        });

        let confirmed = reason.is_some_and(|r| {
            self.history
                .is_confirmed(r.side(), self.state.params().trades_to_confirm)
        });
        self.state.set_signal(reason, confirmed);

        if !confirmed || !self.state.auto() {
            return;
        }
        if let Some(reason) = reason {
            if let Err(e) = self.gate.submit(reason).await {
                warn!(
                    symbol = %self.state.symbol(),
                    %reason,
                    error = %e,
                    "Order submission failed"
                );
            }
        }
    }
}
