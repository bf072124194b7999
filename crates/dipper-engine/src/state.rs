//! Shared per-symbol engine state.
//!
//! The decision loop and the reconciliation consumer run on different
//! tasks but act on the same symbol: the loop owns price observation and
//! submission, the reconciler owns holdings updates and pending-order
//! clearing. This struct is the meeting point. The pending slot is a
//! mutex-guarded compare-and-swap so two tasks can never both believe
//! they opened an order.

use crate::audit::AuditLog;
use crate::params::Params;
use crate::price::{PriceLevels, Reaction};
use crate::signal::{self, Reason};
use dipper_core::{OrderToken, Price, Size, Symbol, SymbolMeta, Tick};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::history::{MAX_ENTRIES, TRIM_BATCH};

/// One unsold purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub symbol: String,
    pub quantity: Size,
    /// Quote spent acquiring this lot.
    pub quote_cost: Decimal,
    /// Effective acquisition price.
    pub price: Price,
    /// Token of the order that produced this lot, when known.
    pub order_token: Option<OrderToken>,
}

/// Shared state for one symbol's engine.
pub struct EngineState {
    symbol: Symbol,
    meta: SymbolMeta,
    params: RwLock<Params>,
    /// Quote amount committed per buy.
    invest_quote: RwLock<Decimal>,
    /// Whether confirmed signals are acted on automatically.
    auto: AtomicBool,
    levels: RwLock<PriceLevels>,
    /// Bounded recent-tick log (batch-evicted like the snapshot history).
    ticks: RwLock<Vec<Tick>>,
    holdings: RwLock<Vec<Lot>>,
    /// The single in-flight order slot.
    pending: Mutex<Option<OrderToken>>,
    /// Profit high-water mark since the last buy.
    highest_profit_percent: RwLock<Decimal>,
    last_reason: RwLock<Option<Reason>>,
    confirmed: AtomicBool,
    audit: AuditLog,
}

impl EngineState {
    pub fn new(symbol: Symbol, meta: SymbolMeta, params: Params, invest_quote: Decimal) -> Self {
        Self {
            symbol,
            meta,
            params: RwLock::new(params),
            invest_quote: RwLock::new(invest_quote),
            auto: AtomicBool::new(true),
            levels: RwLock::new(PriceLevels::default()),
            ticks: RwLock::new(Vec::with_capacity(MAX_ENTRIES)),
            holdings: RwLock::new(Vec::new()),
            pending: Mutex::new(None),
            highest_profit_percent: RwLock::new(Decimal::ZERO),
            last_reason: RwLock::new(None),
            confirmed: AtomicBool::new(false),
            audit: AuditLog::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn meta(&self) -> SymbolMeta {
        self.meta
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    // === parameters ===

    pub fn params(&self) -> Params {
        self.params.read().clone()
    }

    /// Replace the parameter set at runtime.
    pub fn set_params(&self, params: Params) {
        *self.params.write() = params;
    }

    pub fn invest_quote(&self) -> Decimal {
        *self.invest_quote.read()
    }

    pub fn set_invest_quote(&self, quote: Decimal) {
        *self.invest_quote.write() = quote;
    }

    pub fn auto(&self) -> bool {
        self.auto.load(Ordering::SeqCst)
    }

    pub fn set_auto(&self, auto: bool) {
        self.auto.store(auto, Ordering::SeqCst);
    }

    // === price state ===

    pub fn levels(&self) -> PriceLevels {
        *self.levels.read()
    }

    /// Record a tick in the bounded log.
    ///
    /// Returns true when this is the first tick ever seen for the
    /// symbol; the caller must seed the dip watermark in that case.
    pub fn record_tick(&self, tick: Tick) -> bool {
        let mut ticks = self.ticks.write();
        let first = ticks.is_empty();
        if ticks.len() >= MAX_ENTRIES {
            ticks.drain(..TRIM_BATCH);
        }
        ticks.push(tick);
        first
    }

    /// Fold one price into the watermarks, seeding the dip first when
    /// this is the symbol's first observation.
    pub fn observe_price(&self, price: Price, first: bool) -> Option<Reaction> {
        let mut levels = self.levels.write();
        if first {
            levels.force_dip(Some(price));
        }
        levels.observe(price)
    }

    /// Mean seconds between the most recent ticks (up to ten), a cheap
    /// liveness diagnostic for the stream.
    pub fn response_speed(&self) -> Option<f64> {
        let ticks = self.ticks.read();
        let suffix: Vec<_> = ticks.iter().rev().take(10).collect();
        let (last, first) = (suffix.first()?, suffix.last()?);
        let span_ms = (last.time - first.time).num_milliseconds() as f64;
        Some(span_ms / 1000.0 / suffix.len() as f64)
    }

    // === holdings ===

    pub fn holdings(&self) -> Vec<Lot> {
        self.holdings.read().clone()
    }

    pub fn has_holdings(&self) -> bool {
        !self.holdings.read().is_empty()
    }

    /// Total unsold base quantity.
    pub fn holdings_quantity(&self) -> Size {
        self.holdings
            .read()
            .iter()
            .fold(Size::ZERO, |acc, lot| acc + lot.quantity)
    }

    /// Current value of the position in quote units.
    pub fn invested_quote(&self) -> Decimal {
        self.holdings_quantity().notional(self.levels().current)
    }

    pub fn push_lot(&self, lot: Lot) {
        self.holdings.write().push(lot);
    }

    pub fn clear_holdings(&self) {
        self.holdings.write().clear();
    }

    // === profit tracking ===

    pub fn profit(&self) -> Decimal {
        signal::profit(&self.holdings.read(), self.levels().current)
    }

    pub fn profit_percent(&self) -> Decimal {
        signal::profit_percent(&self.holdings.read(), self.levels().current)
    }

    pub fn highest_profit_percent(&self) -> Decimal {
        *self.highest_profit_percent.read()
    }

    /// Ratchet the profit high-water mark; returns the current profit
    /// percentage.
    pub fn update_highest_profit(&self) -> Decimal {
        let pp = self.profit_percent();
        let mut highest = self.highest_profit_percent.write();
        if pp > *highest {
            *highest = pp;
        }
        pp
    }

    pub fn reset_highest_profit(&self) {
        *self.highest_profit_percent.write() = Decimal::ZERO;
    }

    // === in-flight order slot ===

    pub fn pending_order(&self) -> Option<OrderToken> {
        self.pending.lock().clone()
    }

    /// Claim the in-flight slot.
    ///
    /// Returns a fresh token when the slot was free, `None` when an
    /// order is already outstanding. This is the idempotent submission
    /// guard: whoever gets `None` must not submit.
    pub fn try_begin_order(&self) -> Option<OrderToken> {
        let mut pending = self.pending.lock();
        if pending.is_some() {
            return None;
        }
        let token = OrderToken::generate();
        *pending = Some(token.clone());
        Some(token)
    }

    /// Clear the slot if it holds exactly `token`.
    ///
    /// Returns whether the slot was cleared; a mismatch leaves the slot
    /// untouched so a foreign fill can never release someone else's
    /// order.
    pub fn clear_pending_if(&self, token: &OrderToken) -> bool {
        let mut pending = self.pending.lock();
        if pending.as_ref() == Some(token) {
            *pending = None;
            true
        } else {
            false
        }
    }

    /// Clear the slot unconditionally.
    pub fn force_clear_pending(&self) {
        *self.pending.lock() = None;
    }

    // === signal exposure ===

    /// Evaluate the candidate signal for the current state.
    pub fn evaluate_signal(&self) -> Option<Reason> {
        let levels = self.levels();
        let holdings = self.holdings.read();
        let highest = self.highest_profit_percent();
        let params = self.params.read();
        signal::evaluate(&levels, &holdings, highest, &params)
    }

    pub fn set_signal(&self, reason: Option<Reason>, confirmed: bool) {
        *self.last_reason.write() = reason;
        self.confirmed.store(confirmed, Ordering::SeqCst);
    }

    pub fn current_signal(&self) -> Option<Reason> {
        *self.last_reason.read()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed.load(Ordering::SeqCst)
    }

    // === sell-side dip adjustment ===

    /// Reposition the dip reference before a sell.
    ///
    /// Profitable exit: raise the re-entry bar to
    /// `current * (1 + min_percent_to_buy_after_sell - min_percent_to_buy)`,
    /// so re-buying needs a larger confirmed move than a cold start.
    /// Non-profitable exit: collapse the watermarks to the current price
    /// so the ongoing fall cannot instantly re-trigger a buy.
    pub fn apply_exit_dip_adjustment(&self) {
        let profitable = self.profit() > Decimal::ZERO;
        let params = self.params.read();
        let mut levels = self.levels.write();
        if profitable {
            let factor = Decimal::ONE + params.min_percent_to_buy_after_sell
                - params.min_percent_to_buy;
            levels.dip = levels.current * factor;
        } else {
            levels.force_dip(None);
        }
    }
}

impl std::fmt::Debug for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineState")
            .field("symbol", &self.symbol.symbol)
            .field("levels", &self.levels())
            .field("holdings", &self.holdings.read().len())
            .field("pending", &self.pending_order())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn state() -> EngineState {
        EngineState::new(
            Symbol::new("TESTUSDT", "TEST", "USDT"),
            SymbolMeta::new(Size::new(dec!(1))),
            Params::default(),
            dec!(100),
        )
    }

    #[test]
    fn test_pending_slot_is_exclusive() {
        let state = state();
        let token = state.try_begin_order().expect("slot should be free");
        assert!(state.try_begin_order().is_none());
        assert_eq!(state.pending_order(), Some(token.clone()));

        assert!(state.clear_pending_if(&token));
        assert!(state.try_begin_order().is_some());
    }

    #[test]
    fn test_foreign_token_does_not_clear_slot() {
        let state = state();
        let ours = state.try_begin_order().unwrap();
        let foreign = OrderToken::generate();

        assert!(!state.clear_pending_if(&foreign));
        assert_eq!(state.pending_order(), Some(ours));
    }

    #[test]
    fn test_first_tick_seeds_dip() {
        let state = state();
        let tick = Tick::new(
            chrono::Utc::now(),
            Price::new(dec!(5)),
            Size::new(dec!(1)),
        );
        let first = state.record_tick(tick);
        assert!(first);
        state.observe_price(tick.price, first);

        let levels = state.levels();
        assert_eq!(levels.dip, Price::new(dec!(5)));
        assert_eq!(levels.current, Price::new(dec!(5)));
    }

    #[test]
    fn test_highest_profit_ratchets() {
        let state = state();
        state.record_tick(Tick::new(
            chrono::Utc::now(),
            Price::new(dec!(1)),
            Size::new(dec!(1)),
        ));
        state.observe_price(Price::new(dec!(1)), true);
        state.push_lot(Lot {
            symbol: "TESTUSDT".into(),
            quantity: Size::new(dec!(100)),
            quote_cost: dec!(100),
            price: Price::new(dec!(1)),
            order_token: None,
        });

        state.observe_price(Price::new(dec!(7)), false);
        assert_eq!(state.update_highest_profit(), dec!(6));

        state.observe_price(Price::new(dec!(3)), false);
        assert_eq!(state.update_highest_profit(), dec!(2));
        // watermark keeps the peak
        assert_eq!(state.highest_profit_percent(), dec!(6));

        state.reset_highest_profit();
        assert_eq!(state.highest_profit_percent(), Decimal::ZERO);
    }

    #[test]
    fn test_exit_dip_adjustment_profitable() {
        let state = state();
        state.set_params(Params {
            min_percent_to_buy: dec!(1),
            min_percent_to_buy_after_sell: dec!(0.5),
            ..Params::default()
        });
        state.observe_price(Price::new(dec!(1)), true);
        state.push_lot(Lot {
            symbol: "TESTUSDT".into(),
            quantity: Size::new(dec!(100)),
            quote_cost: dec!(100),
            price: Price::new(dec!(1)),
            order_token: None,
        });
        state.observe_price(Price::new(dec!(6)), false);

        state.apply_exit_dip_adjustment();
        // 6 * (1 + 0.5 - 1) = 3
        assert_eq!(state.levels().dip, Price::new(dec!(3)));
    }

    #[test]
    fn test_exit_dip_adjustment_losing() {
        let state = state();
        state.observe_price(Price::new(dec!(5)), true);
        state.push_lot(Lot {
            symbol: "TESTUSDT".into(),
            quantity: Size::new(dec!(20)),
            quote_cost: dec!(100),
            price: Price::new(dec!(5)),
            order_token: None,
        });
        state.observe_price(Price::new(dec!(2)), false);

        state.apply_exit_dip_adjustment();
        // losing exit collapses both watermarks to the current price
        let levels = state.levels();
        assert_eq!(levels.dip, Price::new(dec!(2)));
        assert_eq!(levels.rise, Price::new(dec!(2)));
    }

    #[test]
    fn test_response_speed_averages_recent_ticks() {
        let state = state();
        assert!(state.response_speed().is_none());

        let base = chrono::Utc::now();
        for i in 0..5i64 {
            state.record_tick(Tick::new(
                base + chrono::Duration::seconds(i * 2),
                Price::new(dec!(1)),
                Size::new(dec!(1)),
            ));
        }
        // 8 seconds across 5 ticks
        let speed = state.response_speed().unwrap();
        assert!((speed - 1.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tick_log_batch_eviction_keeps_first_flag_stable() {
        let state = state();
        let tick = Tick::new(
            chrono::Utc::now(),
            Price::new(dec!(1)),
            Size::new(dec!(1)),
        );
        assert!(state.record_tick(tick));
        for _ in 0..(MAX_ENTRIES * 2) {
            // never reports "first" again, even across evictions
            assert!(!state.record_tick(tick));
        }
    }
}
