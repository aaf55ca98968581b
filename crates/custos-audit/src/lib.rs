//! custos-audit: the session access trail and its anomaly detector.
//!
//! Every session operation flows through an [`InMemoryAccessLog`], a bounded
//! FIFO buffer of normalized [`AccessLogEntry`] values. Each append runs the
//! [`AnomalyDetector`] over the trailing window and delivers any tripped
//! alerts to an [`AlertSink`] (the default sink emits `tracing` warnings).
//!
//! The buffer is capacity-bounded (oldest entries evicted first) and can be
//! aggregated into [`AccessStatistics`] with ANDed filters, or trimmed by age
//! with `cleanup`.
//!
//! [`AccessLogEntry`]: custos_contracts::access::AccessLogEntry
//! [`AccessStatistics`]: custos_contracts::report::AccessStatistics
//! [`AlertSink`]: custos_core::traits::AlertSink

pub mod config;
pub mod detect;
pub mod memory;
pub mod stats;

pub use config::AuditConfig;
pub use detect::AnomalyDetector;
pub use memory::{InMemoryAccessLog, TracingAlertSink};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Duration;

    use custos_contracts::{
        access::{AccessAction, AccessContext, AccessRecord},
        alert::{AlertKind, SecurityAlert},
        report::StatsFilter,
    };
    use custos_core::traits::{AccessLog, AlertSink};

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<SecurityAlert>>,
    }

    impl RecordingSink {
        fn taken(&self) -> Vec<SecurityAlert> {
            self.alerts.lock().unwrap().clone()
        }
    }

    impl AlertSink for RecordingSink {
        fn raise(&self, alert: &SecurityAlert) {
            self.alerts.lock().unwrap().push(alert.clone());
        }
    }

    fn ctx(user_id: &str, session_id: &str) -> AccessContext {
        AccessContext {
            session_id: session_id.to_owned(),
            lead_id: "lead-1".to_owned(),
            user_id: user_id.to_owned(),
            user_role: "agent".to_owned(),
            ip_address: Some("10.0.0.7".to_owned()),
            user_agent: Some("Mozilla/5.0".to_owned()),
        }
    }

    fn quiet_config(max_log_entries: usize) -> AuditConfig {
        AuditConfig {
            max_log_entries,
            // High enough that real-time test appends never trip them.
            rapid_access_threshold: 1000,
            failure_threshold: 1000,
            ..AuditConfig::default()
        }
    }

    #[test]
    fn buffer_evicts_oldest_beyond_capacity() {
        let log = InMemoryAccessLog::new(quiet_config(5));
        for i in 0..8 {
            let session = format!("session_{i}");
            log.log(AccessRecord::new(ctx("u1", &session), AccessAction::Store));
        }

        assert_eq!(log.len(), 5);
        let kept: Vec<String> = log
            .snapshot()
            .into_iter()
            .map(|entry| entry.session_id)
            .collect();
        assert_eq!(
            kept,
            vec!["session_3", "session_4", "session_5", "session_6", "session_7"]
        );
    }

    #[test]
    fn success_defaults_to_true_unless_stated_false() {
        let log = InMemoryAccessLog::new(quiet_config(10));
        log.log(AccessRecord::new(ctx("u1", "s1"), AccessAction::Access));
        log.log(AccessRecord::failed(
            ctx("u1", "s1"),
            AccessAction::Access,
            "decryption failed",
        ));

        let entries = log.snapshot();
        assert!(entries[0].success);
        assert!(entries[0].error_message.is_none());
        assert!(!entries[1].success);
        assert_eq!(entries[1].error_message.as_deref(), Some("decryption failed"));
    }

    #[test]
    fn statistics_apply_all_filters_together() {
        let log = InMemoryAccessLog::new(quiet_config(50));
        log.log(AccessRecord::new(ctx("alice", "s1"), AccessAction::Access));
        log.log(AccessRecord::new(ctx("alice", "s2"), AccessAction::Store));
        log.log(AccessRecord::new(ctx("bob", "s1"), AccessAction::Access));
        log.log(AccessRecord::failed(
            ctx("alice", "s1"),
            AccessAction::Access,
            "nope",
        ));

        let all = log.statistics(&StatsFilter::default());
        assert_eq!(all.total_accesses, 4);
        assert_eq!(all.unique_users, 2);
        assert_eq!(all.unique_sessions, 2);

        let filter = StatsFilter {
            user_id: Some("alice".to_owned()),
            session_id: Some("s1".to_owned()),
            action: Some(AccessAction::Access),
            time_range: None,
        };
        let narrowed = log.statistics(&filter);
        assert_eq!(narrowed.total_accesses, 2);
        assert_eq!(narrowed.successful_accesses, 1);
        assert_eq!(narrowed.failed_accesses, 1);
        assert_eq!(narrowed.unique_users, 1);
    }

    #[test]
    fn cleanup_removes_only_entries_older_than_max_age() {
        let log = InMemoryAccessLog::new(quiet_config(10));
        log.log(AccessRecord::new(ctx("u1", "s1"), AccessAction::Access));
        log.log(AccessRecord::new(ctx("u1", "s2"), AccessAction::Access));

        assert_eq!(log.cleanup(Duration::hours(1)), 0);
        assert_eq!(log.len(), 2);

        assert_eq!(log.cleanup(Duration::zero()), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn rapid_access_alert_fires_past_threshold() {
        let sink = Arc::new(RecordingSink::default());
        let config = AuditConfig {
            rapid_access_threshold: 3,
            failure_threshold: 1000,
            ..AuditConfig::default()
        };
        let log = InMemoryAccessLog::with_sink(config, sink.clone());

        for _ in 0..3 {
            log.log(AccessRecord::new(ctx("alice", "s1"), AccessAction::Access));
        }
        assert!(sink.taken().is_empty());

        log.log(AccessRecord::new(ctx("alice", "s1"), AccessAction::Access));
        let alerts = sink.taken();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::RapidSessionAccess);
        assert_eq!(alerts[0].user_id, "alice");
        assert_eq!(alerts[0].count, 4);
        assert_eq!(alerts[0].ip_address.as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn failure_alert_counts_failed_entries_only() {
        let sink = Arc::new(RecordingSink::default());
        let config = AuditConfig {
            rapid_access_threshold: 1000,
            failure_threshold: 2,
            ..AuditConfig::default()
        };
        let log = InMemoryAccessLog::with_sink(config, sink.clone());

        log.log(AccessRecord::new(ctx("bob", "s1"), AccessAction::Access));
        log.log(AccessRecord::failed(ctx("bob", "s1"), AccessAction::Access, "x"));
        log.log(AccessRecord::failed(ctx("bob", "s1"), AccessAction::Access, "x"));
        assert!(sink.taken().is_empty());

        log.log(AccessRecord::failed(ctx("bob", "s1"), AccessAction::Access, "x"));
        let alerts = sink.taken();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::MultipleAccessFailures);
        assert_eq!(alerts[0].count, 3);
    }

    #[test]
    fn alerts_are_scoped_per_user() {
        let sink = Arc::new(RecordingSink::default());
        let config = AuditConfig {
            rapid_access_threshold: 3,
            failure_threshold: 1000,
            ..AuditConfig::default()
        };
        let log = InMemoryAccessLog::with_sink(config, sink.clone());

        for user in ["alice", "bob", "carol", "dave"] {
            log.log(AccessRecord::new(ctx(user, "s1"), AccessAction::Access));
        }
        assert!(sink.taken().is_empty());
    }

    #[test]
    fn capacity_and_thresholds_reflect_config() {
        let config = AuditConfig::default();
        let log = InMemoryAccessLog::new(config.clone());
        assert_eq!(log.capacity(), 1000);
        assert_eq!(log.alert_thresholds(), config.thresholds());
    }
}
