//! Anomaly detection over the access-log buffer.
//!
//! The detector runs synchronously after every append, inside the same lock
//! as the append itself, so its view of the buffer is exactly the state the
//! triggering entry produced. Both rules count per-user entries in the
//! trailing window relative to the newest entry's timestamp:
//!
//! - Rule 1 (`rapid_session_access`): more than `rapid_access` entries with
//!   action `access`.
//! - Rule 2 (`multiple_access_failures`): more than `failures` failed
//!   entries.
//!
//! Detection is advisory: alerts go to the sink, the triggering call is
//! never blocked or rejected.

use std::collections::VecDeque;

use chrono::Duration;

use custos_contracts::{
    access::{AccessAction, AccessLogEntry},
    alert::{AlertKind, AlertThresholds, SecurityAlert},
};

use crate::config::AuditConfig;

/// The rate-based abuse scanner.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    thresholds: AlertThresholds,
    window: Duration,
}

impl AnomalyDetector {
    pub fn new(thresholds: AlertThresholds, window: Duration) -> Self {
        Self { thresholds, window }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.thresholds(), config.window())
    }

    /// Scan the buffer after `newest` was appended.
    ///
    /// Returns every alert the append tripped (possibly both rules at once).
    pub fn scan(
        &self,
        entries: &VecDeque<AccessLogEntry>,
        newest: &AccessLogEntry,
    ) -> Vec<SecurityAlert> {
        let cutoff = newest.timestamp - self.window;
        let mut alerts = Vec::new();

        let in_window = |entry: &&AccessLogEntry| {
            entry.user_id == newest.user_id && entry.timestamp > cutoff
        };

        let attempts = entries
            .iter()
            .filter(in_window)
            .filter(|entry| entry.action == AccessAction::Access)
            .count();
        if attempts > self.thresholds.rapid_access {
            alerts.push(SecurityAlert {
                kind: AlertKind::RapidSessionAccess,
                user_id: newest.user_id.clone(),
                count: attempts,
                ip_address: newest.ip_address.clone(),
                raised_at: newest.timestamp,
            });
        }

        let failures = entries
            .iter()
            .filter(in_window)
            .filter(|entry| !entry.success)
            .count();
        if failures > self.thresholds.failures {
            alerts.push(SecurityAlert {
                kind: AlertKind::MultipleAccessFailures,
                user_id: newest.user_id.clone(),
                count: failures,
                ip_address: newest.ip_address.clone(),
                raised_at: newest.timestamp,
            });
        }

        alerts
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
