use crate::manager::Outcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide gateway counters, reported by the health endpoint.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    connections_active: AtomicU64,
    connections_total: AtomicU64,
    commands_accepted: AtomicU64,
    commands_rejected: AtomicU64,
    commands_ignored: AtomicU64,
    commands_malformed: AtomicU64,
    commands_throttled: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayMetricsSnapshot {
    pub active_connections: u64,
    pub total_connections: u64,
    pub commands_accepted: u64,
    pub commands_rejected: u64,
    pub commands_ignored: u64,
    pub commands_malformed: u64,
    pub commands_throttled: u64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_open(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_close(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(1))
            });
    }

    pub fn command_outcome(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Accepted => &self.commands_accepted,
            Outcome::Rejected(_) => &self.commands_rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Well-formed payload with an unrecognized `type`.
    pub fn command_ignored(&self) {
        self.commands_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_malformed(&self) {
        self.commands_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_throttled(&self) {
        self.commands_throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GatewayMetricsSnapshot {
        GatewayMetricsSnapshot {
            active_connections: self.connections_active.load(Ordering::Relaxed),
            total_connections: self.connections_total.load(Ordering::Relaxed),
            commands_accepted: self.commands_accepted.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            commands_ignored: self.commands_ignored.load(Ordering::Relaxed),
            commands_malformed: self.commands_malformed.load(Ordering::Relaxed),
            commands_throttled: self.commands_throttled.load(Ordering::Relaxed),
        }
    }
}
