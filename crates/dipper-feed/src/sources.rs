//! Source traits for the two event streams.
//!
//! Both streams are delivered through bounded `mpsc` channels: the
//! producer side lives in a transport (or replay) task, the consumer
//! suspends on `recv()`. Dropping the receiver is how a consumer
//! releases its subscription.

use crate::error::FeedResult;
use dipper_core::{AccountEvent, Symbol, Tick};
use tokio::sync::mpsc;

/// Channel depth for stream subscriptions.
pub const CHANNEL_CAPACITY: usize = 1000;

/// Delivers the ordered, infinite trade-tick sequence for one symbol.
pub trait TickSource: Send + Sync {
    /// Open a subscription. The returned receiver yields ticks in
    /// stream order until the source ends or the receiver is dropped.
    fn subscribe(&self, symbol: &Symbol) -> FeedResult<mpsc::Receiver<Tick>>;
}

/// Delivers the ordered account-event sequence shared by all symbols.
pub trait AccountEventSource: Send + Sync {
    /// Open the account stream. One consumer only: the reconciler.
    fn events(&self) -> FeedResult<mpsc::Receiver<AccountEvent>>;
}

/// Account source that delivers nothing and ends at once.
///
/// Used by paper sessions that have no captured account data to
/// replay: fills are synthesized inline there, so an empty stream is
/// the honest contract.
#[derive(Debug, Default)]
pub struct IdleAccountSource;

impl AccountEventSource for IdleAccountSource {
    fn events(&self) -> FeedResult<mpsc::Receiver<AccountEvent>> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }
}
