//! Security alert types raised by the anomaly detector.
//!
//! Alerts are advisory observability signals: they never block or reject
//! the access that triggered them. Enforcement is an external concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The abuse pattern an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// More than the configured number of `access` entries for one user
    /// within the trailing 60-second window.
    RapidSessionAccess,
    /// More than the configured number of failed entries for one user
    /// within the trailing 60-second window.
    MultipleAccessFailures,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::RapidSessionAccess => "rapid_session_access",
            AlertKind::MultipleAccessFailures => "multiple_access_failures",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-user in-window entry counts above which the detector fires.
///
/// Exposed by the access log so the security report can state the active
/// detection posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertThresholds {
    /// Rule 1: `access` entries per user per window before
    /// `rapid_session_access` fires.
    pub rapid_access: usize,
    /// Rule 2: failed entries per user per window before
    /// `multiple_access_failures` fires.
    pub failures: usize,
}

/// One anomaly raised by the detector and delivered to the alert sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAlert {
    pub kind: AlertKind,

    /// The user whose access pattern tripped the rule.
    pub user_id: String,

    /// How many in-window entries matched the rule (attempts or failures,
    /// depending on `kind`).
    pub count: usize,

    /// The IP of the triggering entry, when the handler reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// Timestamp of the entry that tripped the rule.
    pub raised_at: DateTime<Utc>,
}
