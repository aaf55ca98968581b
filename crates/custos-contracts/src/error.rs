//! Error types for the Custos session-security pipeline.
//!
//! All fallible operations in Custos return `CustosResult<T>`. The taxonomy
//! is deliberately small: integrity validation never errors (it returns an
//! `IntegrityReport`), the access logger swallows its own internal failures,
//! and anomaly alerts are observability signals, not errors.

use thiserror::Error;

/// The unified error type for the Custos crates.
#[derive(Debug, Error)]
pub enum CustosError {
    /// The caller passed a payload that is not a plain key-value object.
    ///
    /// Never retried — the caller surfaces this as a client error.
    #[error("invalid session payload: {reason}")]
    InvalidInput { reason: String },

    /// An encrypted record declares an algorithm this build does not implement.
    ///
    /// Fatal; usually indicates version skew between the writer that sealed
    /// the record and the reader trying to open it.
    #[error("unsupported encryption algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Ciphertext, IV, or key mismatch, or a corrupted payload.
    ///
    /// Fatal for that record. The manager logs a failed access entry before
    /// propagating this, so decryption failures always leave an audit trace.
    #[error("session decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the Custos crates.
pub type CustosResult<T> = Result<T, CustosError>;
