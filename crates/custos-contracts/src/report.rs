//! Report contracts: integrity results, access statistics, and the
//! operator-facing security report.
//!
//! These shapes are the stable output contract consumed by admin-facing
//! reporting endpoints, so they are serde types with camelCase field names.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::AccessAction;

/// The result of integrity validation for one session record.
///
/// Validation never raises — callers inspect this report and decide how to
/// respond (reject a tampered session, treat an expired one as absent, …).
/// `is_valid` is true iff `errors` is empty; warnings never affect validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub has_warnings: bool,
    /// The record's age exceeds the configured maximum session age.
    pub is_expired: bool,
    /// The encryption envelope is present but structurally incomplete.
    pub is_tampered: bool,
}

impl IntegrityReport {
    /// Assemble a report, deriving `is_valid` and `has_warnings`.
    pub fn from_parts(
        errors: Vec<String>,
        warnings: Vec<String>,
        is_expired: bool,
        is_tampered: bool,
    ) -> Self {
        Self {
            is_valid: errors.is_empty(),
            has_warnings: !warnings.is_empty(),
            errors,
            warnings,
            is_expired,
            is_tampered,
        }
    }
}

/// Filters for access statistics. All supplied filters are ANDed.
#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub action: Option<AccessAction>,
    /// Only entries newer than `now - time_range`.
    pub time_range: Option<chrono::Duration>,
}

impl StatsFilter {
    /// A filter covering the trailing `time_range` only.
    pub fn within(time_range: chrono::Duration) -> Self {
        Self {
            time_range: Some(time_range),
            ..Self::default()
        }
    }
}

/// Per-user success/failure counts inside `AccessStatistics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccessCounts {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// The observed timestamp span of the entries a statistics query matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Aggregated view over the access log for one filter set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessStatistics {
    pub total_accesses: usize,
    pub successful_accesses: usize,
    pub failed_accesses: usize,
    pub unique_users: usize,
    pub unique_sessions: usize,
    pub action_breakdown: BTreeMap<AccessAction, usize>,
    pub user_breakdown: BTreeMap<String, UserAccessCounts>,
    pub time_range: TimeRange,
}

/// Static facts about the cipher configuration, for the security report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherInfo {
    /// Cipher identifier, e.g. `"aes-256-cbc"`.
    pub algorithm: String,
    /// Symmetric key length in bytes.
    pub key_length: usize,
    /// False when the process is running on the insecure fallback key.
    pub configured_key: bool,
}

/// Recommendation priority, serialized the way the reporting UI sorts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One actionable recommendation in the security report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub message: String,
    pub action: String,
}

/// Access statistics over the standard reporting windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowedStatistics {
    pub last_24_hours: AccessStatistics,
    pub last_7_days: AccessStatistics,
    pub overall: AccessStatistics,
}

/// Security posture counters included in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityMetrics {
    pub total_log_entries: usize,
    pub max_log_entries: usize,
    pub encryption: CipherInfo,
    pub rapid_access_threshold: usize,
    pub failure_threshold: usize,
}

/// The operator-facing security report assembled by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    pub report_generated_at: DateTime<Utc>,
    pub access_statistics: WindowedStatistics,
    pub security_metrics: SecurityMetrics,
    pub recommendations: Vec<Recommendation>,
}
