//! Core trait definitions for the Custos session-security pipeline.
//!
//! These four traits define the component seams:
//!
//! - `SessionCipher`    — seals and opens session records at rest
//! - `IntegrityChecker` — judges well-formedness, freshness, and tampering
//! - `AccessLog`        — bounded audit trail of every access attempt
//! - `AlertSink`        — receives advisory anomaly alerts
//!
//! The manager wires them together in the correct order. All implementations
//! must be `Send + Sync`; in a multi-threaded server the manager is shared
//! behind an `Arc` across request handlers.

use chrono::Duration;
use serde_json::Value;

use custos_contracts::{
    access::AccessRecord,
    alert::{AlertThresholds, SecurityAlert},
    error::CustosResult,
    report::{AccessStatistics, CipherInfo, IntegrityReport, StatsFilter},
};

/// Seals session records for persistence and opens them for use.
///
/// Implementations are pure transforms: they never mutate their input and
/// never perform I/O. The only state they carry is the immutable master key
/// derived once at construction.
pub trait SessionCipher: Send + Sync {
    /// Encrypt the sensitive fields of `record`, returning a new record safe
    /// to persist verbatim (no plaintext sensitive fields).
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `record` is not a plain key-value object.
    fn seal(&self, record: &Value) -> CustosResult<Value>;

    /// Decrypt the sensitive fields of `record`.
    ///
    /// A record without an encryption envelope is returned unchanged —
    /// legacy plaintext data is not an error.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for non-objects, `UnsupportedAlgorithm` when the
    /// envelope names a cipher this build does not implement, and
    /// `DecryptionFailed` for corrupted ciphertext, IVs, or payloads.
    fn open(&self, record: &Value) -> CustosResult<Value>;

    /// A stable fingerprint of the record's shape.
    ///
    /// Covers identity and structural fields only (id, creation time, cookie
    /// count, sorted storage key lists, user agent, domain) — deliberately
    /// not cookie or storage *values*. Used as an integrity/display token,
    /// never for authentication.
    fn fingerprint(&self, record: &Value) -> String;

    /// Static facts about the configured cipher, for the security report.
    fn describe(&self) -> CipherInfo;
}

/// Judges whether a (decrypted) session record is well-formed, fresh, and
/// untampered.
///
/// Never fails: every outcome — including a hopelessly malformed payload —
/// is expressed in the returned report.
pub trait IntegrityChecker: Send + Sync {
    fn validate(&self, record: &Value) -> IntegrityReport;
}

/// The bounded, in-memory audit trail of session access attempts.
///
/// `log()` must make the append + eviction + anomaly-scan cycle appear
/// atomic per call, and must never propagate internal failures — logging
/// can never break the operation being logged.
pub trait AccessLog: Send + Sync {
    /// Record one access attempt.
    fn log(&self, record: AccessRecord);

    /// Aggregate over the current buffer; all supplied filters are ANDed.
    fn statistics(&self, filter: &StatsFilter) -> AccessStatistics;

    /// Remove entries older than `max_age`. Returns the number removed.
    fn cleanup(&self, max_age: Duration) -> usize;

    /// Current number of buffered entries.
    fn len(&self) -> usize;

    /// True when no entries are buffered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured capacity of the buffer.
    fn capacity(&self) -> usize;

    /// The detector thresholds currently in force, for the security report.
    fn alert_thresholds(&self) -> AlertThresholds;
}

/// Receives anomaly alerts raised by the access log's detector.
///
/// Alerts are advisory: a sink must not fail and must not block the access
/// that produced the alert.
pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: &SecurityAlert);
}
