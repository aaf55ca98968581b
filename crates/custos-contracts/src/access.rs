//! Access audit types: who touched which session, when, and how.
//!
//! Request handlers report every session read/write/clear/launch through an
//! `AccessRecord`. The access log normalizes records into `AccessLogEntry`
//! values (timestamp assigned, `success` defaulting to true) and keeps them
//! in a bounded FIFO buffer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kinds of session operations the audit trail distinguishes.
///
/// Serialized snake_case, matching the strings the reporting endpoints
/// consume (`"access"`, `"access_attempt"`, `"clear_all"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    /// A new session was captured and stored.
    Store,
    /// A stored session was decrypted and read.
    Access,
    /// An access was attempted before authorization was established.
    AccessAttempt,
    /// A stored session was merged with a fresh capture.
    Update,
    /// A single session was cleared.
    Clear,
    /// All sessions for a lead were cleared.
    ClearAll,
    /// A session was handed to the browser launcher for replay.
    Launch,
    /// Expired data was removed by the cleanup pass.
    Cleanup,
}

impl AccessAction {
    /// The snake_case name used on the wire and in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessAction::Store => "store",
            AccessAction::Access => "access",
            AccessAction::AccessAttempt => "access_attempt",
            AccessAction::Update => "update",
            AccessAction::Clear => "clear",
            AccessAction::ClearAll => "clear_all",
            AccessAction::Launch => "launch",
            AccessAction::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for AccessAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller identity and target attached to one session operation.
///
/// Built by request handlers from the authenticated request; all fields are
/// plain strings so the audit trail does not depend on the host
/// application's user or lead types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessContext {
    pub session_id: String,
    pub lead_id: String,
    pub user_id: String,
    pub user_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// One access report as submitted by a request handler.
///
/// `success: None` means "not stated" and normalizes to `true`; only an
/// explicit `Some(false)` produces a failed entry.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub context: AccessContext,
    pub action: AccessAction,
    pub success: Option<bool>,
    pub error_message: Option<String>,
    pub metadata: serde_json::Map<String, Value>,
}

impl AccessRecord {
    /// A plain (implicitly successful) record for `action`.
    pub fn new(context: AccessContext, action: AccessAction) -> Self {
        Self {
            context,
            action,
            success: None,
            error_message: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// A failed record carrying the failure reason.
    pub fn failed(
        context: AccessContext,
        action: AccessAction,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            context,
            action,
            success: Some(false),
            error_message: Some(error_message.into()),
            metadata: serde_json::Map::new(),
        }
    }

    /// Normalize into a stored entry with the given timestamp.
    ///
    /// `success` defaults to true unless explicitly false — the audit trail
    /// treats "caller did not say" as success, matching how handlers report.
    pub fn into_entry(self, timestamp: DateTime<Utc>) -> AccessLogEntry {
        AccessLogEntry {
            timestamp,
            session_id: self.context.session_id,
            lead_id: self.context.lead_id,
            user_id: self.context.user_id,
            user_role: self.context.user_role,
            action: self.action,
            ip_address: self.context.ip_address,
            user_agent: self.context.user_agent,
            success: self.success != Some(false),
            error_message: self.error_message,
            metadata: self.metadata,
        }
    }
}

/// A normalized, stored audit entry.
///
/// Append-only; entries are never modified after insertion and are evicted
/// oldest-first once the buffer reaches capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub lead_id: String,
    pub user_id: String,
    pub user_role: String,
    pub action: AccessAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
}
