//! The session-security manager: the pipeline the request handlers call.
//!
//! Handlers used to repeat the same sequence at every session endpoint —
//! validate, encrypt, log; decrypt, validate, log. `SessionSecurity` owns
//! that sequence and enforces its ordering:
//!
//!   store: validate → seal → fingerprint → audit(store)
//!   open:  open → [failure is audited, then re-raised] → validate → audit(access)
//!
//! Validation failures are not errors: they come back as `Rejected` /
//! `Expired` outcomes the caller maps to its own responses. Only
//! cryptographic failures propagate as `Err`, and every one of those is
//! audited with `success: false` before it leaves the manager.

use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;
use tracing::{debug, warn};

use custos_contracts::{
    access::{AccessAction, AccessContext, AccessRecord},
    error::CustosResult,
    report::{
        IntegrityReport, Priority, Recommendation, SecurityMetrics, SecurityReport,
        StatsFilter, WindowedStatistics,
    },
};

use crate::traits::{AccessLog, IntegrityChecker, SessionCipher};

/// The outcome of storing a captured session.
///
/// Callers pattern-match on this to decide the response:
/// - `Stored` → persist `sealed` verbatim, return `integrity_hash` to the UI
/// - `Rejected` → surface the report's errors as a client error
#[derive(Debug)]
pub enum StoreOutcome {
    /// The record passed validation and was sealed for persistence.
    Stored {
        /// The encrypted-at-rest record, safe to persist verbatim.
        sealed: Value,
        /// Shape fingerprint of the plaintext record.
        integrity_hash: String,
        /// The pre-storage validation report (may carry warnings).
        report: IntegrityReport,
    },

    /// Validation failed; nothing was encrypted or stored.
    Rejected {
        /// The failing report. `errors` explains the rejection.
        report: IntegrityReport,
    },
}

/// The outcome of opening a stored session.
///
/// - `Opened` → use `record`; `lastAccessedAt` maintenance is the caller's
/// - `Expired` → treat as "no active session", offer re-capture
/// - `Rejected` → tampered or malformed; report distinctly from "not found"
#[derive(Debug)]
pub enum OpenOutcome {
    /// The session decrypted cleanly and passed validation.
    Opened {
        /// The plaintext record, identical in shape to what was sealed.
        record: Value,
        /// Shape fingerprint of the decrypted record.
        integrity_hash: String,
        /// The post-decryption validation report.
        report: IntegrityReport,
    },

    /// The record decrypted but its age exceeds the maximum session age.
    Expired { report: IntegrityReport },

    /// The record decrypted but failed validation (tampered or malformed).
    Rejected { report: IntegrityReport },
}

/// The process-wide session-security component.
///
/// Construct once at startup with explicit configuration and share behind an
/// `Arc` — components are injected rather than read from the environment so
/// the manager is testable with a fake key and small limits.
pub struct SessionSecurity {
    cipher: Box<dyn SessionCipher>,
    checker: Box<dyn IntegrityChecker>,
    log: Arc<dyn AccessLog>,
}

impl SessionSecurity {
    pub fn new(
        cipher: Box<dyn SessionCipher>,
        checker: Box<dyn IntegrityChecker>,
        log: Arc<dyn AccessLog>,
    ) -> Self {
        Self { cipher, checker, log }
    }

    /// Validate and seal a freshly captured session.
    ///
    /// An invalid record is rejected before any cryptography runs; the
    /// rejection is audited as a failed `store`. A valid record is sealed,
    /// fingerprinted, and audited as a successful `store`.
    ///
    /// # Errors
    ///
    /// Only cryptographic failures (`InvalidInput` from the cipher) — and
    /// those are audited before propagating.
    pub fn store_session(
        &self,
        record: &Value,
        ctx: &AccessContext,
    ) -> CustosResult<StoreOutcome> {
        debug!(
            session_id = %ctx.session_id,
            lead_id = %ctx.lead_id,
            user_id = %ctx.user_id,
            "storing session"
        );

        let report = self.checker.validate(record);
        if !report.is_valid {
            warn!(
                session_id = %ctx.session_id,
                errors = report.errors.len(),
                "session rejected before storage"
            );
            self.log.log(AccessRecord::failed(
                ctx.clone(),
                AccessAction::Store,
                report.errors.join("; "),
            ));
            return Ok(StoreOutcome::Rejected { report });
        }

        let sealed = match self.cipher.seal(record) {
            Ok(sealed) => sealed,
            Err(e) => {
                self.log.log(AccessRecord::failed(
                    ctx.clone(),
                    AccessAction::Store,
                    e.to_string(),
                ));
                return Err(e);
            }
        };
        let integrity_hash = self.cipher.fingerprint(record);

        self.log.log(AccessRecord::new(ctx.clone(), AccessAction::Store));

        Ok(StoreOutcome::Stored { sealed, integrity_hash, report })
    }

    /// Decrypt and validate a stored session.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` and `DecryptionFailed` propagate to the caller
    /// — after a failed `access` entry has been written, so every decryption
    /// failure leaves an audit trace.
    pub fn open_session(
        &self,
        sealed: &Value,
        ctx: &AccessContext,
    ) -> CustosResult<OpenOutcome> {
        debug!(
            session_id = %ctx.session_id,
            user_id = %ctx.user_id,
            "opening session"
        );

        let record = match self.cipher.open(sealed) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    session_id = %ctx.session_id,
                    user_id = %ctx.user_id,
                    error = %e,
                    "session decryption failed"
                );
                self.log.log(AccessRecord::failed(
                    ctx.clone(),
                    AccessAction::Access,
                    e.to_string(),
                ));
                return Err(e);
            }
        };

        let report = self.checker.validate(&record);

        if report.is_expired {
            self.log.log(AccessRecord::failed(
                ctx.clone(),
                AccessAction::Access,
                "session expired",
            ));
            return Ok(OpenOutcome::Expired { report });
        }

        if !report.is_valid {
            self.log.log(AccessRecord::failed(
                ctx.clone(),
                AccessAction::Access,
                report.errors.join("; "),
            ));
            return Ok(OpenOutcome::Rejected { report });
        }

        let integrity_hash = self.cipher.fingerprint(&record);
        self.log.log(AccessRecord::new(ctx.clone(), AccessAction::Access));

        Ok(OpenOutcome::Opened { record, integrity_hash, report })
    }

    /// Audit a session operation that carries no payload of its own
    /// (clear, clear-all, launch, cleanup, pre-authorization attempts).
    pub fn record_access(&self, ctx: &AccessContext, action: AccessAction) {
        self.log.log(AccessRecord::new(ctx.clone(), action));
    }

    /// Audit a failed session operation with its reason.
    pub fn record_failure(
        &self,
        ctx: &AccessContext,
        action: AccessAction,
        error_message: impl Into<String>,
    ) {
        self.log
            .log(AccessRecord::failed(ctx.clone(), action, error_message));
    }

    /// Compute a shape fingerprint without going through store/open.
    pub fn fingerprint(&self, record: &Value) -> String {
        self.cipher.fingerprint(record)
    }

    /// Aggregate access statistics for reporting endpoints.
    pub fn statistics(&self, filter: &StatsFilter) -> custos_contracts::report::AccessStatistics {
        self.log.statistics(filter)
    }

    /// Drop audit entries older than `max_age`. Returns the number removed.
    ///
    /// Intended to be driven by an external scheduler.
    pub fn cleanup_access_logs(&self, max_age: Duration) -> usize {
        self.log.cleanup(max_age)
    }

    /// Assemble the operator-facing security report.
    ///
    /// Statistics over the standard windows, the active security posture,
    /// and prioritized recommendations derived from it.
    pub fn security_report(&self) -> SecurityReport {
        let access_statistics = WindowedStatistics {
            last_24_hours: self.log.statistics(&StatsFilter::within(Duration::hours(24))),
            last_7_days: self.log.statistics(&StatsFilter::within(Duration::days(7))),
            overall: self.log.statistics(&StatsFilter::default()),
        };

        let encryption = self.cipher.describe();
        let thresholds = self.log.alert_thresholds();
        let security_metrics = SecurityMetrics {
            total_log_entries: self.log.len(),
            max_log_entries: self.log.capacity(),
            encryption: encryption.clone(),
            rapid_access_threshold: thresholds.rapid_access,
            failure_threshold: thresholds.failures,
        };

        let mut recommendations = Vec::new();
        if !encryption.configured_key {
            recommendations.push(Recommendation {
                priority: Priority::High,
                category: "encryption".to_string(),
                message: "process is running on the built-in fallback encryption key"
                    .to_string(),
                action: "generate a 64-character hex key and supply it at startup"
                    .to_string(),
            });
        }
        if self.log.len() * 10 > self.log.capacity() * 8 {
            recommendations.push(Recommendation {
                priority: Priority::Medium,
                category: "logging".to_string(),
                message: "access log is above 80% of its capacity".to_string(),
                action: "persist audit entries externally or increase cleanup frequency"
                    .to_string(),
            });
        }
        if access_statistics.last_24_hours.failed_accesses > 10 {
            recommendations.push(Recommendation {
                priority: Priority::High,
                category: "security".to_string(),
                message: format!(
                    "{} failed access attempts in the last 24 hours",
                    access_statistics.last_24_hours.failed_accesses
                ),
                action: "review failed access patterns for the users involved".to_string(),
            });
        }

        SecurityReport {
            report_generated_at: chrono::Utc::now(),
            access_statistics,
            security_metrics,
            recommendations,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Duration;
    use serde_json::{json, Value};

    use custos_contracts::{
        access::{AccessAction, AccessContext, AccessRecord},
        alert::AlertThresholds,
        error::{CustosError, CustosResult},
        report::{AccessStatistics, CipherInfo, IntegrityReport, StatsFilter},
    };

    use crate::traits::{AccessLog, IntegrityChecker, SessionCipher};

    use super::{OpenOutcome, SessionSecurity, StoreOutcome};

    // ── Mock components ───────────────────────────────────────────────────────

    /// A cipher that wraps/unwraps records with a marker key, or fails on
    /// demand.
    struct MockCipher {
        fail_open: Option<CustosError>,
    }

    impl MockCipher {
        fn ok() -> Self {
            Self { fail_open: None }
        }

        fn failing() -> Self {
            Self {
                fail_open: Some(CustosError::DecryptionFailed {
                    reason: "corrupted payload".to_string(),
                }),
            }
        }
    }

    impl SessionCipher for MockCipher {
        fn seal(&self, record: &Value) -> CustosResult<Value> {
            let mut object = record
                .as_object()
                .cloned()
                .ok_or_else(|| CustosError::InvalidInput {
                    reason: "not an object".to_string(),
                })?;
            object.insert("_sealed".to_string(), json!(true));
            Ok(Value::Object(object))
        }

        fn open(&self, record: &Value) -> CustosResult<Value> {
            if let Some(e) = &self.fail_open {
                return Err(match e {
                    CustosError::DecryptionFailed { reason } => {
                        CustosError::DecryptionFailed { reason: reason.clone() }
                    }
                    _ => unreachable!(),
                });
            }
            let mut object = record.as_object().cloned().unwrap();
            object.remove("_sealed");
            Ok(Value::Object(object))
        }

        fn fingerprint(&self, _record: &Value) -> String {
            "f".repeat(64)
        }

        fn describe(&self) -> CipherInfo {
            CipherInfo {
                algorithm: "mock".to_string(),
                key_length: 32,
                configured_key: false,
            }
        }
    }

    /// A checker that returns a pre-configured report.
    struct MockChecker {
        report: IntegrityReport,
    }

    impl MockChecker {
        fn valid() -> Self {
            Self {
                report: IntegrityReport::from_parts(vec![], vec![], false, false),
            }
        }

        fn invalid(error: &str) -> Self {
            Self {
                report: IntegrityReport::from_parts(
                    vec![error.to_string()],
                    vec![],
                    false,
                    false,
                ),
            }
        }

        fn expired() -> Self {
            Self {
                report: IntegrityReport::from_parts(
                    vec!["session expired (31 days old)".to_string()],
                    vec![],
                    true,
                    false,
                ),
            }
        }
    }

    impl IntegrityChecker for MockChecker {
        fn validate(&self, _record: &Value) -> IntegrityReport {
            self.report.clone()
        }
    }

    /// An access log that records every call for later inspection.
    #[derive(Default)]
    struct RecordingLog {
        records: Mutex<Vec<(AccessAction, bool, Option<String>)>>,
    }

    impl AccessLog for RecordingLog {
        fn log(&self, record: AccessRecord) {
            self.records.lock().unwrap().push((
                record.action,
                record.success != Some(false),
                record.error_message,
            ));
        }

        fn statistics(&self, _filter: &StatsFilter) -> AccessStatistics {
            AccessStatistics::default()
        }

        fn cleanup(&self, _max_age: Duration) -> usize {
            0
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        fn capacity(&self) -> usize {
            1000
        }

        fn alert_thresholds(&self) -> AlertThresholds {
            AlertThresholds { rapid_access: 10, failures: 5 }
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_context() -> AccessContext {
        AccessContext {
            session_id: "session_1700000000000_ab12cd34".to_string(),
            lead_id: "lead-1".to_string(),
            user_id: "agent-1".to_string(),
            user_role: "agent".to_string(),
            ip_address: None,
            user_agent: None,
        }
    }

    fn make_record() -> Value {
        json!({
            "sessionId": "session_1700000000000_ab12cd34",
            "createdAt": "2026-08-01T00:00:00Z",
            "cookies": [],
        })
    }

    fn manager_with(
        cipher: MockCipher,
        checker: MockChecker,
    ) -> (SessionSecurity, Arc<RecordingLog>) {
        let log = Arc::new(RecordingLog::default());
        let manager =
            SessionSecurity::new(Box::new(cipher), Box::new(checker), log.clone());
        (manager, log)
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn store_valid_record_seals_and_audits() {
        let (manager, log) = manager_with(MockCipher::ok(), MockChecker::valid());

        let outcome = manager
            .store_session(&make_record(), &make_context())
            .unwrap();

        match outcome {
            StoreOutcome::Stored { sealed, integrity_hash, report } => {
                assert_eq!(sealed["_sealed"], json!(true));
                assert_eq!(integrity_hash.len(), 64);
                assert!(report.is_valid);
            }
            other => panic!("expected Stored, got {:?}", other),
        }

        let records = log.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, AccessAction::Store);
        assert!(records[0].1, "store must be audited as successful");
    }

    #[test]
    fn store_invalid_record_is_rejected_without_sealing() {
        let (manager, log) = manager_with(
            MockCipher::ok(),
            MockChecker::invalid("missing required field: cookies"),
        );

        let outcome = manager
            .store_session(&make_record(), &make_context())
            .unwrap();

        match outcome {
            StoreOutcome::Rejected { report } => {
                assert!(!report.is_valid);
                assert!(report.errors[0].contains("cookies"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }

        // The rejection itself is audited as a failed store.
        let records = log.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].1);
    }

    #[test]
    fn open_failure_is_audited_then_reraised() {
        let (manager, log) = manager_with(MockCipher::failing(), MockChecker::valid());

        let err = manager
            .open_session(&make_record(), &make_context())
            .unwrap_err();
        assert!(matches!(err, CustosError::DecryptionFailed { .. }));

        // The failed access entry must precede the propagated error.
        let records = log.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, AccessAction::Access);
        assert!(!records[0].1);
        assert!(records[0].2.as_deref().unwrap().contains("decryption failed"));
    }

    #[test]
    fn open_expired_record_yields_expired_outcome() {
        let (manager, log) = manager_with(MockCipher::ok(), MockChecker::expired());

        let outcome = manager
            .open_session(&make_record(), &make_context())
            .unwrap();

        match outcome {
            OpenOutcome::Expired { report } => assert!(report.is_expired),
            other => panic!("expected Expired, got {:?}", other),
        }

        let records = log.records.lock().unwrap();
        assert!(!records[0].1, "expired opens are audited as failures");
    }

    #[test]
    fn open_valid_record_round_trips_and_audits() {
        let (manager, log) = manager_with(MockCipher::ok(), MockChecker::valid());
        let ctx = make_context();

        let sealed = match manager.store_session(&make_record(), &ctx).unwrap() {
            StoreOutcome::Stored { sealed, .. } => sealed,
            other => panic!("expected Stored, got {:?}", other),
        };

        let outcome = manager.open_session(&sealed, &ctx).unwrap();
        match outcome {
            OpenOutcome::Opened { record, .. } => assert_eq!(record, make_record()),
            other => panic!("expected Opened, got {:?}", other),
        }

        let records = log.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].0, AccessAction::Access);
        assert!(records[1].1);
    }

    #[test]
    fn security_report_flags_fallback_key() {
        let (manager, _log) = manager_with(MockCipher::ok(), MockChecker::valid());

        let report = manager.security_report();

        assert!(!report.security_metrics.encryption.configured_key);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.category == "encryption"));
        assert_eq!(report.security_metrics.rapid_access_threshold, 10);
    }
}
