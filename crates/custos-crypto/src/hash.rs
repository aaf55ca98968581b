//! Session shape fingerprinting.
//!
//! The fingerprint is a SHA-256 over a normalized subset of the record.
//! Normalized input layout (canonical JSON, alphabetical keys):
//!
//!   1. cookieCount        — length of `cookies` when it is an array, else 0
//!   2. createdAt          — verbatim
//!   3. domain             — `metadata.domain`, verbatim
//!   4. localStorageKeys   — sorted key list (values excluded)
//!   5. sessionId          — verbatim
//!   6. sessionStorageKeys — sorted key list (values excluded)
//!   7. userAgent          — verbatim
//!
//! Cookie and storage *values* are deliberately excluded: two sessions with
//! identical shapes but different content fingerprint identically. This is a
//! coarse shape token for integrity display, not an authentication hash.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Compute the shape fingerprint of a session record.
///
/// Accepts any JSON value; missing fields normalize to null/zero/empty so
/// the function is total (a non-object input hashes its null-field form).
///
/// Returns a lowercase 64-character hex string, stable across calls for an
/// unmodified record.
pub fn session_fingerprint(record: &Value) -> String {
    let cookie_count = record
        .get("cookies")
        .and_then(Value::as_array)
        .map(|cookies| cookies.len())
        .unwrap_or(0);

    let normalized = json!({
        "sessionId": record.get("sessionId").cloned().unwrap_or(Value::Null),
        "createdAt": record.get("createdAt").cloned().unwrap_or(Value::Null),
        "cookieCount": cookie_count,
        "localStorageKeys": sorted_keys(record.get("localStorage")),
        "sessionStorageKeys": sorted_keys(record.get("sessionStorage")),
        "userAgent": record.get("userAgent").cloned().unwrap_or(Value::Null),
        "domain": record.pointer("/metadata/domain").cloned().unwrap_or(Value::Null),
    });

    // serde_json::to_vec is canonical and deterministic for a given value.
    let bytes = serde_json::to_vec(&normalized)
        .expect("normalized fingerprint input must always serialize");

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

/// The sorted key list of an optional JSON object; empty when absent or not
/// an object.
fn sorted_keys(value: Option<&Value>) -> Vec<String> {
    let mut keys: Vec<String> = value
        .and_then(Value::as_object)
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}
