//! # custos-crypto
//!
//! Cryptographic components for the Custos session-security runtime:
//!
//! - `MasterKey` — the process-wide secret and PBKDF2-HMAC-SHA256 derivation
//! - `CbcSessionCipher` — AES-256-CBC per-field encryption of session records
//! - `session_fingerprint` — SHA-256 shape token over a normalized subset
//!
//! ## Usage
//!
//! ```rust,ignore
//! use custos_crypto::{CbcSessionCipher, MasterKey};
//! use custos_core::traits::SessionCipher;
//!
//! let cipher = CbcSessionCipher::new(MasterKey::from_configured(key_hex)?);
//! let sealed = cipher.seal(&record)?;
//! let opened = cipher.open(&sealed)?;
//! ```

pub mod cipher;
pub mod hash;
pub mod keys;

pub use cipher::{CbcSessionCipher, ALGORITHM};
pub use hash::session_fingerprint;
pub use keys::MasterKey;

// ── Tests ─────────────────────────────────────────────────────────────────────
