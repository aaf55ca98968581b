//! Session record types and the encrypted-at-rest wire format.
//!
//! A captured browser session travels through Custos as a camelCase JSON
//! object (`serde_json::Value`) so the cipher and validator can operate on
//! records regardless of which producer captured them. The typed structs
//! here describe the canonical plaintext shape (`SessionRecord`, `Cookie`,
//! `Viewport`) and the encrypted-at-rest wrappers (`EncryptedField`,
//! `EncryptionEnvelope`).
//!
//! At rest, each sensitive field is replaced by an `EncryptedField` and the
//! record gains a top-level `_encryption` envelope. A record without the
//! envelope is plaintext (legacy data) and must be passed through unchanged
//! by decryption.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The top-level key holding the record's encryption envelope.
pub const ENVELOPE_KEY: &str = "_encryption";

/// The marker key tagging an individual field as encrypted.
pub const ENCRYPTED_MARKER_KEY: &str = "_encrypted";

/// The envelope format version written by this build.
pub const ENVELOPE_VERSION: &str = "1.0";

/// The canonical session-id prefix produced at capture time.
///
/// Full format: `session_<epochMillis>_<lowercase hex>`.
pub const CANONICAL_ID_PREFIX: &str = "session_";

/// A single browser cookie inside a captured session.
///
/// `name` and `value` are mandatory for a well-formed cookie; the validator
/// reports an error for entries missing either. The remaining attributes are
/// whatever the capture side recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub http_only: bool,
}

impl Cookie {
    /// Build a minimal cookie with just a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: false,
            http_only: false,
        }
    }
}

/// Browser viewport dimensions in pixels.
///
/// Both dimensions must be numeric; the validator warns when either falls
/// outside the sane range [100, 4000].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// The canonical plaintext shape of a captured browser session.
///
/// Used by capture-side code to build records; the cipher and validator
/// consume the serialized `Value` form so they also handle records produced
/// by external capture paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// `session_<epochMillis>_<hex>` — see [`CANONICAL_ID_PREFIX`].
    pub session_id: String,

    /// Capture time. Immutable for the lifetime of the record.
    pub created_at: DateTime<Utc>,

    /// Updated on every successful access. Never precedes `created_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,

    /// Whether this is the lead's current session. At most one record per
    /// owning lead may be active at a time.
    #[serde(default)]
    pub is_active: bool,

    /// Captured cookies, in browser order. Sensitive — encrypted at rest.
    pub cookies: Vec<Cookie>,

    /// Captured localStorage snapshot. Sensitive — encrypted at rest.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub local_storage: BTreeMap<String, String>,

    /// Captured sessionStorage snapshot. Sensitive — encrypted at rest.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub session_storage: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,

    /// Free-form capture metadata; commonly includes `domain`.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
}

impl SessionRecord {
    /// Serialize to the camelCase JSON object form the pipeline operates on.
    ///
    /// # Panics
    ///
    /// Never — every field of `SessionRecord` is JSON-representable.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("SessionRecord must always serialize to JSON")
    }
}

/// The at-rest wrapper for a single encrypted sensitive field.
///
/// Replaces the plaintext value of `cookies` / `localStorage` /
/// `sessionStorage`. Ciphertext and IV are lowercase hex; the IV is unique
/// per field per encryption call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    /// AES-256-CBC ciphertext of the field's canonical JSON text, hex-encoded.
    pub encrypted: String,

    /// The 16-byte initialization vector for this field, hex-encoded.
    pub iv: String,

    /// Always `true`. Distinguishes wrapped fields from plaintext values.
    #[serde(rename = "_encrypted")]
    pub is_encrypted: bool,
}

/// Record-level encryption metadata, stored under [`ENVELOPE_KEY`].
///
/// Absence of the envelope means the record is plaintext. An envelope with
/// any of `salt` / `algorithm` / `encryptedAt` missing is a tamper indicator
/// (the validator reports it and sets `is_tampered`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionEnvelope {
    /// Cipher identifier, e.g. `"aes-256-cbc"`.
    pub algorithm: String,

    /// The 32-byte per-record key-derivation salt, hex-encoded.
    pub salt: String,

    /// Wall-clock time (UTC) the record was sealed.
    pub encrypted_at: DateTime<Utc>,

    /// Envelope format version; this build writes [`ENVELOPE_VERSION`].
    pub version: String,
}

/// Return true if `value` is a sensitive field wrapped as an
/// [`EncryptedField`] (an object tagged `_encrypted: true`).
pub fn is_encrypted_field(value: &Value) -> bool {
    value
        .get(ENCRYPTED_MARKER_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Check a session id against the canonical format for a given prefix.
///
/// The id must be `<prefix><digits>_<lowercase hex>`, with both the digit
/// and hex runs non-empty. The canonical prefix is [`CANONICAL_ID_PREFIX`];
/// validator configuration may admit additional prefixes such as
/// `gui_session_` for ids minted by external capture paths.
pub fn has_canonical_id_format(id: &str, prefix: &str) -> bool {
    let Some(rest) = id.strip_prefix(prefix) else {
        return false;
    };
    let Some((millis, tail)) = rest.split_once('_') else {
        return false;
    };
    !millis.is_empty()
        && millis.bytes().all(|b| b.is_ascii_digit())
        && !tail.is_empty()
        && tail.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
