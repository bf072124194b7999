//! Per-symbol decision engine.
//!
//! One engine instance drives the automated behavior for a single asset
//! pair: it folds the tick stream into price watermarks, derives a
//! candidate buy/sell signal, requires the signal to hold across a
//! confirmation window, and pushes at most one order at a time through
//! the order gate. Fills arrive out-of-band through the reconciliation
//! consumer in `dipper-account`, which writes back into the shared
//! [`EngineState`].

pub mod audit;
pub mod error;
pub mod gate;
pub mod history;
pub mod params;
pub mod price;
pub mod runner;
pub mod signal;
pub mod state;
pub mod transport;

pub use audit::{AuditLog, AuditRecord};
pub use error::{EngineError, EngineResult};
pub use gate::{OrderGate, Submission, TradeMode};
pub use history::{ConfirmationHistory, SignalSnapshot, MAX_ENTRIES, TRIM_BATCH};
pub use params::Params;
pub use price::{PriceLevels, Reaction};
pub use runner::DecisionLoop;
pub use signal::{evaluate, profit, profit_percent, Reason};
pub use state::{EngineState, Lot};
pub use transport::{NullTransport, OrderTransport};
