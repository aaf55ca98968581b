//! # custos-core
//!
//! The component seams and the pipeline manager for Custos.
//!
//! This crate provides:
//! - The four core traits (`SessionCipher`, `IntegrityChecker`, `AccessLog`,
//!   `AlertSink`)
//! - The `SessionSecurity` manager that wires them into the store/open
//!   pipelines and enforces audit-before-propagate for crypto failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use custos_core::{SessionSecurity, traits::{SessionCipher, IntegrityChecker, AccessLog}};
//! ```

pub mod manager;
pub mod traits;

pub use manager::{OpenOutcome, SessionSecurity, StoreOutcome};
