//! Shared account state and fill reconciliation.
//!
//! The reconciliation consumer is the sole writer of the account view
//! and the sole out-of-band mutator of engine holdings: it matches
//! asynchronous fills back to the per-symbol engines, clears in-flight
//! orders, and runs the drawdown breaker after every event.

pub mod error;
pub mod reconciler;
pub mod registry;
pub mod view;

pub use error::{AccountError, AccountResult};
pub use reconciler::ReconciliationConsumer;
pub use registry::EngineRegistry;
pub use view::AccountView;
