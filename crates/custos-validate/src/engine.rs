//! The integrity validation engine.
//!
//! `IntegrityValidator` implements the `IntegrityChecker` trait from
//! custos-core. Validation runs every check and accumulates all findings
//! before returning, so callers see the full failure set in one pass:
//!
//! 1. Required fields (`sessionId`, `createdAt`, `cookies`)
//! 2. Session-id format against the accepted prefixes
//! 3. Freshness against the maximum session age
//! 4. Cookie structure (hard) and cookie count/size (soft)
//! 5. Storage item count/size (soft)
//! 6. Encryption-envelope completeness (tamper indicator)
//! 7. Viewport dimensions (hard: numeric; soft: sane pixel range)
//!
//! The engine never fails — a hopelessly malformed payload yields a report
//! with a single structural error.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use custos_contracts::{
    report::IntegrityReport,
    session::{has_canonical_id_format, ENVELOPE_KEY},
};
use custos_core::traits::IntegrityChecker;

use crate::limits::ValidationLimits;

/// The Custos integrity validator.
///
/// Construct with explicit limits (production defaults via
/// `ValidationLimits::default()`), then pass to the manager.
#[derive(Debug, Default)]
pub struct IntegrityValidator {
    limits: ValidationLimits,
}

impl IntegrityValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// The limits this validator applies.
    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }
}

/// True when the field is present for required-field purposes.
///
/// Absent, JSON `null`, and the empty string all count as missing; an empty
/// array or map is present — required-ness is about the field existing, not
/// about it having content.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Parse a record timestamp: RFC 3339 string or epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(ms) = value.as_i64() {
        return Utc.timestamp_millis_opt(ms).single();
    }
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

impl IntegrityChecker for IntegrityValidator {
    fn validate(&self, record: &Value) -> IntegrityReport {
        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut is_expired = false;
        let mut is_tampered = false;

        let Some(object) = record.as_object() else {
            errors.push("session data must be a plain object".to_string());
            return IntegrityReport::from_parts(errors, warnings, false, false);
        };

        // ── Required fields ───────────────────────────────────────────────────
        for field in ["sessionId", "createdAt", "cookies"] {
            if !is_present(object.get(field)) {
                errors.push(format!("missing required field: {}", field));
            }
        }

        // ── Session-id format ─────────────────────────────────────────────────
        if let Some(id) = object.get("sessionId").and_then(Value::as_str) {
            if !id.is_empty()
                && !self
                    .limits
                    .accepted_id_prefixes
                    .iter()
                    .any(|prefix| has_canonical_id_format(id, prefix))
            {
                errors.push("invalid session id format".to_string());
            }
        }

        // ── Freshness ─────────────────────────────────────────────────────────
        if let Some(created) = object.get("createdAt").filter(|v| !v.is_null()) {
            match parse_timestamp(created) {
                Some(created_at) => {
                    let age = Utc::now() - created_at;
                    if age > self.limits.max_session_age() {
                        errors.push(format!(
                            "session expired ({} days old)",
                            age.num_days()
                        ));
                        is_expired = true;
                    }
                }
                None => errors.push("invalid createdAt timestamp".to_string()),
            }
        }

        // ── Cookies ───────────────────────────────────────────────────────────
        if let Some(cookies) = object.get("cookies").filter(|v| !v.is_null()) {
            match cookies.as_array() {
                None => errors.push("cookies must be an array".to_string()),
                Some(list) => {
                    if list.len() > self.limits.max_total_cookies {
                        warnings.push(format!(
                            "too many cookies ({}), consider cleanup",
                            list.len()
                        ));
                    }
                    for (index, cookie) in list.iter().enumerate() {
                        let name = cookie.get("name").and_then(Value::as_str).unwrap_or("");
                        let value =
                            cookie.get("value").and_then(Value::as_str).unwrap_or("");
                        if name.is_empty() || value.is_empty() {
                            errors.push(format!(
                                "cookie at index {} missing name or value",
                                index
                            ));
                        } else if value.len() > self.limits.max_cookie_size {
                            warnings.push(format!(
                                "cookie '{}' is very large ({} bytes)",
                                name,
                                value.len()
                            ));
                        }
                    }
                }
            }
        }

        // ── Storage maps (soft limits only) ───────────────────────────────────
        for storage in ["localStorage", "sessionStorage"] {
            let Some(map) = object.get(storage).and_then(Value::as_object) else {
                continue;
            };
            // An encrypted wrapper is not a storage snapshot; size checks
            // apply to the decrypted form.
            if map.get("_encrypted").and_then(Value::as_bool).unwrap_or(false) {
                continue;
            }
            if map.len() > self.limits.max_storage_items {
                warnings.push(format!("too many {} items ({})", storage, map.len()));
            }
            for (key, value) in map {
                if let Some(s) = value.as_str() {
                    if s.len() > self.limits.max_storage_item_size {
                        warnings.push(format!(
                            "{} item '{}' is very large ({} bytes)",
                            storage,
                            key,
                            s.len()
                        ));
                    }
                }
            }
        }

        // ── Encryption envelope (tamper indicator) ────────────────────────────
        if let Some(envelope) = object.get(ENVELOPE_KEY) {
            let complete = ["salt", "algorithm", "encryptedAt"]
                .iter()
                .all(|key| is_present(envelope.get(*key)));
            if !complete {
                warn!(
                    session_id = object.get("sessionId").and_then(serde_json::Value::as_str).unwrap_or("<unknown>"),
                    "incomplete encryption metadata"
                );
                errors.push(
                    "incomplete encryption metadata - possible tampering".to_string(),
                );
                is_tampered = true;
            }
        }

        // ── Viewport ──────────────────────────────────────────────────────────
        if let Some(viewport) = object.get("viewport").filter(|v| !v.is_null()) {
            let width = viewport.get("width").and_then(Value::as_f64);
            let height = viewport.get("height").and_then(Value::as_f64);
            match (width, height) {
                (Some(w), Some(h)) => {
                    if w < 100.0 || h < 100.0 || w > 4000.0 || h > 4000.0 {
                        warnings.push("unusual viewport dimensions".to_string());
                    }
                }
                _ => errors.push("invalid viewport dimensions".to_string()),
            }
        }

        debug!(
            errors = errors.len(),
            warnings = warnings.len(),
            is_expired,
            is_tampered,
            "session record validated"
        );

        IntegrityReport::from_parts(errors, warnings, is_expired, is_tampered)
    }
}
