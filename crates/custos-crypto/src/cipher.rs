//! AES-256-CBC field encryption for session records.
//!
//! The cipher operates on the camelCase JSON object form of a session
//! record. Exactly the configured sensitive fields are transformed; every
//! other field passes through untouched. Wire format per sealed record:
//!
//!   - each sensitive field → `{encrypted: <hex>, iv: <hex>, _encrypted: true}`
//!   - top level gains `_encryption: {algorithm, salt, encryptedAt, version}`
//!
//! One random 32-byte salt (and thus one derived key) per record, one random
//! 16-byte IV per field. IVs are never reused across fields or calls.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::Value;
use tracing::debug;

use custos_contracts::{
    error::{CustosError, CustosResult},
    report::CipherInfo,
    session::{
        is_encrypted_field, EncryptedField, EncryptionEnvelope, ENVELOPE_KEY,
        ENVELOPE_VERSION,
    },
};
use custos_core::traits::SessionCipher;

use crate::hash::session_fingerprint;
use crate::keys::{MasterKey, KEY_LENGTH};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Cipher identifier written to (and required in) the envelope.
pub const ALGORITHM: &str = "aes-256-cbc";

/// IV length in bytes for CBC mode.
pub const IV_LENGTH: usize = 16;

/// Per-record key-derivation salt length in bytes.
pub const SALT_LENGTH: usize = 32;

/// The session fields subject to encryption, in wire-format (camelCase) form.
pub const DEFAULT_SENSITIVE_FIELDS: [&str; 3] =
    ["cookies", "localStorage", "sessionStorage"];

/// The AES-256-CBC session cipher.
///
/// Holds the immutable master key and the explicit list of sensitive field
/// names. Construct once at startup and share; both operations are pure
/// transforms over their input.
pub struct CbcSessionCipher {
    master_key: MasterKey,
    sensitive_fields: Vec<String>,
}

impl CbcSessionCipher {
    /// A cipher over the standard sensitive fields
    /// (`cookies`, `localStorage`, `sessionStorage`).
    pub fn new(master_key: MasterKey) -> Self {
        Self {
            master_key,
            sensitive_fields: DEFAULT_SENSITIVE_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Override the sensitive-field list. Field names are matched against
    /// the record's wire-format keys.
    pub fn with_sensitive_fields(mut self, fields: Vec<String>) -> Self {
        self.sensitive_fields = fields;
        self
    }

    fn as_object(record: &Value) -> CustosResult<&serde_json::Map<String, Value>> {
        record.as_object().ok_or_else(|| CustosError::InvalidInput {
            reason: "session payload must be a plain JSON object".to_string(),
        })
    }
}

impl SessionCipher for CbcSessionCipher {
    /// Encrypt the sensitive fields of `record`.
    ///
    /// Fields that are absent or JSON `null` are skipped; present fields —
    /// including empty arrays and maps — are serialized to their canonical
    /// JSON text and encrypted. The input is never mutated.
    fn seal(&self, record: &Value) -> CustosResult<Value> {
        let object = Self::as_object(record)?;
        let mut sealed = object.clone();

        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        let key = self.master_key.derive_key(&salt);

        for field in &self.sensitive_fields {
            let Some(plain) = object.get(field) else { continue };
            if plain.is_null() {
                continue;
            }

            // Canonical JSON text of the field value is the plaintext.
            let plaintext = serde_json::to_string(plain)
                .expect("JSON value must always re-serialize");

            let mut iv = [0u8; IV_LENGTH];
            OsRng.fill_bytes(&mut iv);

            let ciphertext = Aes256CbcEnc::new_from_slices(&key, &iv)
                .expect("key and IV lengths are static")
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

            let wrapped = EncryptedField {
                encrypted: hex::encode(ciphertext),
                iv: hex::encode(iv),
                is_encrypted: true,
            };
            sealed.insert(
                field.clone(),
                serde_json::to_value(wrapped)
                    .expect("EncryptedField must always serialize"),
            );
        }

        let envelope = EncryptionEnvelope {
            algorithm: ALGORITHM.to_string(),
            salt: hex::encode(salt),
            encrypted_at: Utc::now(),
            version: ENVELOPE_VERSION.to_string(),
        };
        sealed.insert(
            ENVELOPE_KEY.to_string(),
            serde_json::to_value(envelope)
                .expect("EncryptionEnvelope must always serialize"),
        );

        debug!(
            fields = self.sensitive_fields.len(),
            "session record sealed"
        );
        Ok(Value::Object(sealed))
    }

    /// Decrypt the sensitive fields of `record`.
    ///
    /// A record without an `_encryption` envelope is legacy plaintext and is
    /// returned unchanged. Only the envelope's `algorithm` and `salt` are
    /// required to open a record; structural envelope damage beyond that is
    /// the validator's tamper check.
    fn open(&self, record: &Value) -> CustosResult<Value> {
        let object = Self::as_object(record)?;

        let Some(raw_envelope) = object.get(ENVELOPE_KEY) else {
            debug!("session record carries no envelope; returning as-is");
            return Ok(record.clone());
        };
        let envelope =
            raw_envelope
                .as_object()
                .ok_or_else(|| CustosError::DecryptionFailed {
                    reason: "malformed encryption envelope".to_string(),
                })?;

        let algorithm = envelope
            .get("algorithm")
            .and_then(Value::as_str)
            .ok_or_else(|| CustosError::DecryptionFailed {
                reason: "encryption envelope missing algorithm".to_string(),
            })?;
        if algorithm != ALGORITHM {
            return Err(CustosError::UnsupportedAlgorithm {
                algorithm: algorithm.to_string(),
            });
        }

        let salt_hex = envelope
            .get("salt")
            .and_then(Value::as_str)
            .ok_or_else(|| CustosError::DecryptionFailed {
                reason: "encryption envelope missing salt".to_string(),
            })?;
        let salt = hex::decode(salt_hex).map_err(|e| CustosError::DecryptionFailed {
            reason: format!("invalid salt encoding: {}", e),
        })?;
        let key = self.master_key.derive_key(&salt);

        let mut opened = object.clone();
        for field in &self.sensitive_fields {
            let Some(value) = object.get(field) else { continue };
            if !is_encrypted_field(value) {
                continue;
            }

            let wrapped: EncryptedField =
                serde_json::from_value(value.clone()).map_err(|e| {
                    CustosError::DecryptionFailed {
                        reason: format!("malformed encrypted field '{}': {}", field, e),
                    }
                })?;
            let iv = hex::decode(&wrapped.iv).map_err(|e| {
                CustosError::DecryptionFailed {
                    reason: format!("invalid IV encoding for field '{}': {}", field, e),
                }
            })?;
            let ciphertext = hex::decode(&wrapped.encrypted).map_err(|e| {
                CustosError::DecryptionFailed {
                    reason: format!(
                        "invalid ciphertext encoding for field '{}': {}",
                        field, e
                    ),
                }
            })?;

            let plaintext = Aes256CbcDec::new_from_slices(&key, &iv)
                .map_err(|_| CustosError::DecryptionFailed {
                    reason: format!("invalid IV length for field '{}'", field),
                })?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(|_| CustosError::DecryptionFailed {
                    reason: format!(
                        "cipher rejected field '{}' (wrong key or corrupted payload)",
                        field
                    ),
                })?;

            let text = String::from_utf8(plaintext).map_err(|_| {
                CustosError::DecryptionFailed {
                    reason: format!("field '{}' decrypted to non-UTF-8 data", field),
                }
            })?;
            let parsed: Value = serde_json::from_str(&text).map_err(|_| {
                CustosError::DecryptionFailed {
                    reason: format!("field '{}' decrypted to non-JSON data", field),
                }
            })?;

            opened.insert(field.clone(), parsed);
        }

        opened.remove(ENVELOPE_KEY);
        debug!("session record opened");
        Ok(Value::Object(opened))
    }

    fn fingerprint(&self, record: &Value) -> String {
        session_fingerprint(record)
    }

    fn describe(&self) -> CipherInfo {
        CipherInfo {
            algorithm: ALGORITHM.to_string(),
            key_length: KEY_LENGTH,
            configured_key: self.master_key.configured(),
        }
    }
}
