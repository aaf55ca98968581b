//! Master-key handling and per-record key derivation.
//!
//! One master secret is supplied at process start and held immutably for the
//! process lifetime (rotation requires a restart). Every encryption call
//! derives its own 32-byte key from the master secret and a fresh random
//! salt via PBKDF2-HMAC-SHA256 at 100,000 iterations, so brute-forcing a
//! leaked salt+ciphertext pair stays expensive.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

use custos_contracts::error::{CustosError, CustosResult};

/// Derived key length in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// PBKDF2 iteration count for both key derivation and the fallback key.
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// Expected length of the operator-supplied hex key: 32 bytes.
pub const MASTER_KEY_HEX_LENGTH: usize = 64;

/// Seed for the deterministic development fallback key.
///
/// Only used when no operator key is configured. A process running on this
/// key encrypts with a guessable secret; the security report surfaces it as
/// a HIGH-priority recommendation.
const FALLBACK_SEED: &[u8] = b"custos-session-encryption-default-key";

/// The process-wide master secret for session encryption.
///
/// Key bytes are zeroized on drop. `configured()` distinguishes an
/// operator-supplied key from the insecure development fallback.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: Vec<u8>,
    configured: bool,
}

impl MasterKey {
    /// Parse an operator-supplied hex key.
    ///
    /// The expected shape is 64 hex characters (32 bytes). Longer input is
    /// truncated to the first 64 characters; shorter input is accepted as-is
    /// and fed to PBKDF2 unchanged. Both cases log a loud warning rather
    /// than failing — the shorter-key tolerance is inherited behavior, not a
    /// recommendation.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the (truncated) input is not valid hex.
    pub fn from_hex(hex_key: &str) -> CustosResult<Self> {
        let trimmed = hex_key.trim();
        if trimmed.len() != MASTER_KEY_HEX_LENGTH {
            warn!(
                supplied_length = trimmed.len(),
                expected_length = MASTER_KEY_HEX_LENGTH,
                "master key should be 64 hex characters (32 bytes)"
            );
        }
        let effective = if trimmed.len() > MASTER_KEY_HEX_LENGTH {
            // Hex is ASCII; truncation must never land inside a multibyte
            // character, so non-ASCII input is rejected up front instead.
            if !trimmed.is_char_boundary(MASTER_KEY_HEX_LENGTH) {
                return Err(CustosError::ConfigError {
                    reason: "master key is not valid hex: contains non-ASCII characters"
                        .to_string(),
                });
            }
            &trimmed[..MASTER_KEY_HEX_LENGTH]
        } else {
            trimmed
        };
        let bytes = hex::decode(effective).map_err(|e| CustosError::ConfigError {
            reason: format!("master key is not valid hex: {}", e),
        })?;
        Ok(Self { bytes, configured: true })
    }

    /// The deterministic development fallback key.
    ///
    /// Derived from a built-in seed, so every unconfigured process ends up
    /// with the same key. MUST NOT be relied upon in production.
    pub fn fallback() -> Self {
        warn!("no session encryption key configured; using built-in fallback key");
        warn!("supply a 64-character hex key at startup for production use");

        let mut bytes = vec![0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(FALLBACK_SEED, b"salt", PBKDF2_ROUNDS, &mut bytes);
        Self { bytes, configured: false }
    }

    /// Build from an optional configured key: `Some` parses, `None` falls
    /// back to the development key.
    pub fn from_configured(hex_key: Option<&str>) -> CustosResult<Self> {
        match hex_key {
            Some(key) => Self::from_hex(key),
            None => Ok(Self::fallback()),
        }
    }

    /// Derive a 32-byte symmetric key for the given salt.
    ///
    /// Deterministic per (master key, salt) pair: the same salt always
    /// yields the same key, which is what lets decryption recover the key
    /// from the envelope's stored salt.
    pub fn derive_key(&self, salt: &[u8]) -> [u8; KEY_LENGTH] {
        let mut key = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(&self.bytes, salt, PBKDF2_ROUNDS, &mut key);
        key
    }

    /// True when the key came from operator configuration rather than the
    /// built-in fallback.
    pub fn configured(&self) -> bool {
        self.configured
    }
}

impl std::fmt::Debug for MasterKey {
    /// Never prints key material.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &format!("[{} bytes]", self.bytes.len()))
            .field("configured", &self.configured)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
