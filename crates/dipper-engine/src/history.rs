//! Signal confirmation over a bounded snapshot history.
//!
//! Every tick appends one snapshot; confirmation demands a real streak
//! across raw snapshots, so a single contrary tick resets it. The buffer
//! is trimmed in batches rather than one entry at a time to avoid
//! shifting the vector on every tick of a continuous stream.

use crate::price::PriceLevels;
use crate::signal::Reason;
use dipper_core::OrderSide;
use serde::{Deserialize, Serialize};

/// Maximum retained snapshots before a trim.
pub const MAX_ENTRIES: usize = 200;
/// Oldest entries dropped per trim.
pub const TRIM_BATCH: usize = 150;

/// One evaluation snapshot: the price state and the reason it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub levels: PriceLevels,
    pub reason: Option<Reason>,
}

/// Bounded, ordered history of evaluation snapshots.
#[derive(Debug, Default)]
pub struct ConfirmationHistory {
    snapshots: Vec<SignalSnapshot>,
}

impl ConfirmationHistory {
    pub fn new() -> Self {
        Self {
            snapshots: Vec::with_capacity(MAX_ENTRIES),
        }
    }

    /// Append a snapshot, batch-evicting the oldest entries when full.
    pub fn push(&mut self, snapshot: SignalSnapshot) {
        if self.snapshots.len() >= MAX_ENTRIES {
            self.snapshots.drain(..TRIM_BATCH);
        }
        self.snapshots.push(snapshot);
    }

    /// Whether the last `window` snapshots all produced a reason on
    /// `side`.
    ///
    /// Requires a full window: fewer than `window` snapshots can never
    /// confirm, and any absent reason inside the window invalidates the
    /// streak.
    pub fn is_confirmed(&self, side: OrderSide, window: usize) -> bool {
        if window == 0 || self.snapshots.len() < window {
            return false;
        }
        self.snapshots[self.snapshots.len() - window..]
            .iter()
            .all(|s| s.reason.map(|r| r.side()) == Some(side))
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Most recent snapshot, if any.
    pub fn last(&self) -> Option<&SignalSnapshot> {
        self.snapshots.last()
    }
}
