//! Scenario 2: Tamper Detection
//!
//! Shows the three ways a bad record is caught before it reaches a browser:
//!
//!   1. A malformed capture is rejected up front by the validator
//!      (no cryptography ever runs).
//!   2. A sealed record whose ciphertext was flipped fails decryption with
//!      `DecryptionFailed` — and the failure is access-logged first.
//!   3. A sealed record whose envelope was stripped of `encryptedAt` is
//!      flagged `is_tampered` by the validator.

use std::sync::Arc;

use serde_json::Value;

use custos_audit::{AuditConfig, TracingAlertSink};
use custos_contracts::{
    error::{CustosError, CustosResult},
    session::ENVELOPE_KEY,
};
use custos_core::{traits::IntegrityChecker, StoreOutcome};
use custos_validate::{IntegrityValidator, ValidationLimits};

use crate::mock_data::{captured_portal_session, malformed_capture};
use crate::scenarios::{agent_context, wire};

/// Run Scenario 2: Tamper Detection.
pub fn run_scenario() -> CustosResult<()> {
    println!("=== Scenario 2: Tamper Detection ===");
    println!();

    let (security, log) = wire(AuditConfig::default(), Arc::new(TracingAlertSink))?;
    let lead_id = "lead-7302";

    // ── Case A: malformed capture rejected pre-storage ────────────────────────

    let bad = malformed_capture();
    let ctx = agent_context("", lead_id);
    match security.store_session(&bad, &ctx)? {
        StoreOutcome::Rejected { report } => {
            println!("  Case A — malformed capture:");
            for error in &report.errors {
                println!("    error: {}", error);
            }
            println!("    -> rejected before any encryption ran");
        }
        StoreOutcome::Stored { .. } => println!("  Case A UNEXPECTEDLY stored"),
    }
    println!();

    // ── Case B: flipped ciphertext fails decryption ───────────────────────────

    let captured = captured_portal_session(lead_id);
    let ctx = agent_context(&captured.session_id, lead_id);
    let record = captured.to_value();

    let sealed = match security.store_session(&record, &ctx)? {
        StoreOutcome::Stored { sealed, .. } => sealed,
        StoreOutcome::Rejected { report } => {
            println!("  UNEXPECTED rejection: {:?}", report.errors);
            return Ok(());
        }
    };

    let mut corrupted = sealed.clone();
    flip_ciphertext(&mut corrupted, "cookies");

    println!("  Case B — ciphertext flipped on the stored record:");
    match security.open_session(&corrupted, &ctx) {
        Err(CustosError::DecryptionFailed { reason }) => {
            println!("    DecryptionFailed: {}", reason);
            println!("    -> failure audited before the error propagated");
        }
        Err(e) => println!("    unexpected error: {}", e),
        Ok(_) => println!("    UNEXPECTEDLY opened"),
    }
    println!();

    // ── Case C: stripped envelope flagged as tampering ────────────────────────

    let mut stripped = sealed.clone();
    if let Some(envelope) = stripped
        .get_mut(ENVELOPE_KEY)
        .and_then(Value::as_object_mut)
    {
        envelope.remove("encryptedAt");
    }

    let validator = IntegrityValidator::new(ValidationLimits::default());
    let report = validator.validate(&stripped);
    println!("  Case C — envelope missing encryptedAt:");
    println!("    is_tampered: {}", report.is_tampered);
    for error in &report.errors {
        println!("    error: {}", error);
    }

    // Every failure above left a trace.
    let failed = log
        .snapshot()
        .iter()
        .filter(|entry| !entry.success)
        .count();
    println!();
    println!("  Audit trail recorded {} failed accesses", failed);
    println!();
    Ok(())
}

/// Flip a hex digit inside the named field's ciphertext.
fn flip_ciphertext(sealed: &mut Value, field: &str) {
    if let Some(encrypted) = sealed
        .get_mut(field)
        .and_then(|f| f.get_mut("encrypted"))
    {
        if let Some(hex_text) = encrypted.as_str() {
            let mut flipped: String = hex_text.to_string();
            let replacement = if flipped.starts_with('0') { "1" } else { "0" };
            flipped.replace_range(0..1, replacement);
            *encrypted = Value::String(flipped);
        }
    }
}
