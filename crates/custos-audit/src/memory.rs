//! The in-memory implementation of `AccessLog`.
//!
//! `InMemoryAccessLog` keeps normalized entries in a `VecDeque` behind a
//! `Mutex`, so the append + eviction + anomaly-scan cycle is atomic per
//! call even when request handlers share the log across threads.
//!
//! Internal failures never propagate: a poisoned lock is recovered with
//! `into_inner`, because an audit-trail hiccup must not break the session
//! operation being logged.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use custos_contracts::{
    access::{AccessLogEntry, AccessRecord},
    alert::{AlertThresholds, SecurityAlert},
    report::{AccessStatistics, StatsFilter},
};
use custos_core::traits::{AccessLog, AlertSink};

use crate::{config::AuditConfig, detect::AnomalyDetector, stats};

// ── Alert sinks ───────────────────────────────────────────────────────────────

/// The default sink: structured warning logs via `tracing`.
#[derive(Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn raise(&self, alert: &SecurityAlert) {
        warn!(
            kind = %alert.kind,
            user_id = %alert.user_id,
            count = alert.count,
            ip_address = alert.ip_address.as_deref().unwrap_or("<unknown>"),
            "security alert"
        );
    }
}

// ── Access log ────────────────────────────────────────────────────────────────

/// A bounded FIFO audit trail with synchronous anomaly detection.
///
/// # Thread safety
///
/// All operations acquire the buffer mutex internally; clone the `Arc`
/// holding the log and share freely.
pub struct InMemoryAccessLog {
    config: AuditConfig,
    detector: AnomalyDetector,
    sink: Arc<dyn AlertSink>,
    entries: Mutex<VecDeque<AccessLogEntry>>,
}

impl InMemoryAccessLog {
    /// A log with the given configuration and the default tracing sink.
    pub fn new(config: AuditConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingAlertSink))
    }

    /// A log delivering alerts to a caller-supplied sink.
    pub fn with_sink(config: AuditConfig, sink: Arc<dyn AlertSink>) -> Self {
        let detector = AnomalyDetector::from_config(&config);
        Self {
            config,
            detector,
            sink,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Snapshot of the current buffer, oldest first.
    pub fn snapshot(&self) -> Vec<AccessLogEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Acquire the buffer, recovering from poisoning.
    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AccessLogEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl AccessLog for InMemoryAccessLog {
    /// Append one access attempt.
    ///
    /// Normalizes the record (timestamp now, success defaults true), evicts
    /// oldest entries past capacity, and scans for anomalies — all under one
    /// lock acquisition. Alerts are delivered to the sink after the lock is
    /// released so a slow sink cannot stall other writers.
    fn log(&self, record: AccessRecord) {
        let entry = record.into_entry(Utc::now());

        let alerts = {
            let mut entries = self.lock();
            entries.push_back(entry.clone());
            while entries.len() > self.config.max_log_entries {
                entries.pop_front();
            }
            self.detector.scan(&entries, &entry)
        };

        if entry.success {
            debug!(
                action = %entry.action,
                session_id = %entry.session_id,
                user_id = %entry.user_id,
                "session access logged"
            );
        } else {
            warn!(
                action = %entry.action,
                session_id = %entry.session_id,
                user_id = %entry.user_id,
                error = entry.error_message.as_deref().unwrap_or("<unspecified>"),
                "failed session access logged"
            );
        }

        for alert in &alerts {
            self.sink.raise(alert);
        }
    }

    fn statistics(&self, filter: &StatsFilter) -> AccessStatistics {
        let entries = self.lock();
        stats::aggregate(entries.iter(), filter, Utc::now())
    }

    /// Drop entries older than `max_age`. Returns the number removed.
    fn cleanup(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|entry| entry.timestamp > cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "cleaned up access log");
        }
        removed
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn capacity(&self) -> usize {
        self.config.max_log_entries
    }

    fn alert_thresholds(&self) -> AlertThresholds {
        self.config.thresholds()
    }
}
