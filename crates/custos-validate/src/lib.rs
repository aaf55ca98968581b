//! # custos-validate
//!
//! Integrity validation for Custos session records: required fields,
//! session-id format, freshness, cookie/storage structural limits, tamper
//! indicators, and viewport sanity.
//!
//! Validation never raises — every outcome is a structured
//! `IntegrityReport`, and warnings never affect validity.

pub mod engine;
pub mod limits;

pub use engine::IntegrityValidator;
pub use limits::ValidationLimits;

// ── Tests ─────────────────────────────────────────────────────────────────────
