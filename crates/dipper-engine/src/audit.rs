//! Append-only audit log.
//!
//! Every observed tick and every submission attempt lands here as part
//! of the same state transition that caused it. The log is exportable as
//! JSON for external inspection.

use crate::signal::Reason;
use chrono::{DateTime, Utc};
use dipper_core::{OrderSide, Price, Size, Tick};
use parking_lot::RwLock;
use serde::Serialize;

/// One audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AuditRecord {
    /// A trade tick as delivered by the stream.
    Trade {
        time: DateTime<Utc>,
        price: Price,
        quantity: Size,
    },
    /// An action the gate attempted.
    Action {
        time: DateTime<Utc>,
        reason: Reason,
        side: OrderSide,
    },
}

impl AuditRecord {
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Self::Trade { time, .. } | Self::Action { time, .. } => *time,
        }
    }
}

/// Append-only sequence of trade/action records for one symbol.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_trade(&self, tick: &Tick) {
        self.records.write().push(AuditRecord::Trade {
            time: tick.time,
            price: tick.price,
            quantity: tick.quantity,
        });
    }

    pub fn record_action(&self, reason: Reason) {
        self.records.write().push(AuditRecord::Action {
            time: Utc::now(),
            reason,
            side: reason.side(),
        });
    }

    /// Snapshot of all records in append order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }

    /// Only the action records, in append order.
    pub fn actions(&self) -> Vec<AuditRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| matches!(r, AuditRecord::Action { .. }))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Export the whole log as pretty JSON.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.records.read())
    }
}
