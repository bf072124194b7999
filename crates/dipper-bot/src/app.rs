//! Main application orchestration.
//!
//! Builds the shared context (account view, engine registry, emergency
//! stop latch), spawns one decision loop per configured symbol plus the
//! reconciliation consumer, and supervises them until the streams end
//! or the drawdown breaker tears the session down.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use dipper_account::{AccountView, EngineRegistry, ReconciliationConsumer};
use dipper_core::{Size, Symbol, SymbolMeta, SymbolTable};
use dipper_engine::{DecisionLoop, EngineState, NullTransport, OrderGate, OrderTransport};
use dipper_feed::{
    AccountEventSource, IdleAccountSource, ReplayAccountSource, ReplayTickSource, TickSource,
};
use dipper_risk::{DrawdownGuard, EmergencyStopLatch};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    symbols: SymbolTable,
    engines: Vec<Arc<EngineState>>,
    view: Arc<AccountView>,
    registry: Arc<EngineRegistry>,
    latch: Arc<EmergencyStopLatch>,
}

impl Application {
    /// Validate the configuration and build the per-symbol engines.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let view = Arc::new(AccountView::new(&config.main_asset));
        let registry = Arc::new(EngineRegistry::new());
        let latch = Arc::new(EmergencyStopLatch::new());

        let mut symbols = SymbolTable::new();
        let mut engines = Vec::with_capacity(config.symbols.len());
        for sc in &config.symbols {
            let quote = sc.quote_asset.clone().unwrap_or(config.main_asset.clone());
            let symbol = Symbol::new(&sc.symbol, &sc.base_asset, quote);
            let meta = SymbolMeta::new(Size::new(sc.lot_step));
            symbols.insert(symbol.clone(), meta);

            let state = Arc::new(EngineState::new(
                symbol,
                meta,
                sc.params.clone(),
                sc.invest_quote,
            ));
            state.set_auto(sc.auto);
            registry.insert(state.clone());
            engines.push(state);
        }

        Ok(Self {
            config,
            symbols,
            engines,
            view,
            registry,
            latch,
        })
    }

    pub fn engines(&self) -> &[Arc<EngineState>] {
        &self.engines
    }

    pub fn engine(&self, symbol: &str) -> Option<Arc<EngineState>> {
        self.registry.get(symbol)
    }

    pub fn view(&self) -> &Arc<AccountView> {
        &self.view
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn latch(&self) -> &Arc<EmergencyStopLatch> {
        &self.latch
    }

    /// Run with collaborators built from the configuration: replay
    /// sources for the streams and no live order transport. Deployments
    /// with a real venue adapter call [`Application::run_with`] instead.
    pub async fn run(&self) -> AppResult<()> {
        let mut tick_source = ReplayTickSource::new();
        for sc in &self.config.symbols {
            let file = sc.trades_file.as_ref().ok_or_else(|| {
                AppError::Config(format!("{}: trades_file is required for replay", sc.symbol))
            })?;
            tick_source = tick_source.with_file(&sc.symbol, file);
        }

        let account_source: Arc<dyn AccountEventSource> = match &self.config.feed.account_file {
            Some(path) => Arc::new(ReplayAccountSource::new(path)),
            None => Arc::new(IdleAccountSource),
        };

        self.run_with(Arc::new(tick_source), account_source, Arc::new(NullTransport))
            .await
    }

    /// Run against injected stream sources and order transport.
    pub async fn run_with(
        &self,
        tick_source: Arc<dyn TickSource>,
        account_source: Arc<dyn AccountEventSource>,
        transport: Arc<dyn OrderTransport>,
    ) -> AppResult<()> {
        let mode = self.config.mode.trade_mode();
        info!(
            mode = ?self.config.mode,
            symbols = self.engines.len(),
            main_asset = %self.config.main_asset,
            "Starting application"
        );

        // one decision loop task per symbol, all children of the latch
        let mut engine_handles: Vec<JoinHandle<()>> = Vec::with_capacity(self.engines.len());
        for state in &self.engines {
            let ticks = tick_source.subscribe(state.symbol())?;
            let gate = OrderGate::new(state.clone(), transport.clone(), mode);
            let runner = DecisionLoop::new(state.clone(), gate, ticks, self.latch.child_token());
            engine_handles.push(tokio::spawn(runner.run()));
        }

        let guard = Arc::new(DrawdownGuard::new(
            self.latch.clone(),
            self.config.max_drawdown,
        ));
        let reconciler = ReconciliationConsumer::new(
            self.view.clone(),
            self.registry.clone(),
            guard,
            account_source.events()?,
        );
        let mut recon_handle = tokio::spawn(reconciler.run());
        let mut engines_done = Box::pin(join_all(engine_handles));

        let result = tokio::select! {
            recon = &mut recon_handle => {
                let outcome = match recon {
                    Ok(Ok(())) => {
                        info!("Account stream ended");
                        Ok(())
                    }
                    Ok(Err(e)) => Err(AppError::EmergencyStop(e.to_string())),
                    Err(join_error) => {
                        warn!(error = %join_error, "Reconciliation task failed");
                        Ok(())
                    }
                };
                // an emergency stop has already cancelled the loops via
                // the latch; otherwise they drain their tick streams
                engines_done.await;
                outcome
            }
            _ = self.latch.cancelled() => {
                recon_handle.abort();
                engines_done.await;
                let reason = self
                    .latch
                    .reason()
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(AppError::EmergencyStop(reason))
            }
            _ = &mut engines_done => {
                info!("All symbol engines finished");
                // drain the reconciler so a breach racing the last tick
                // still surfaces; finite account streams end on their own
                match recon_handle.await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(AppError::EmergencyStop(e.to_string())),
                    Err(join_error) => {
                        warn!(error = %join_error, "Reconciliation task failed");
                        Ok(())
                    }
                }
            }
        };

        if result.is_err() {
            warn!("Session ended by emergency stop; external restart required");
        } else {
            info!("Session finished");
        }
        result
    }

    /// Static symbol metadata, as loaded at startup.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }
}
