//! Scenario 1: Capture and Replay
//!
//! The happy path the CRM runs dozens of times a day: an agent captures a
//! lead's portal session, the backend validates and seals it, and later the
//! launcher opens it for replay.
//!
//! Walk-through for the demo run:
//!   1. Capture a mock portal session for the lead
//!   2. `store_session` — pre-validate, encrypt sensitive fields, fingerprint
//!   3. Persist the sealed record in the per-lead store (demoting any
//!      previous active session)
//!   4. Fetch the active record and `open_session` for replay
//!   5. Compare fingerprints: the opened record must hash to the stored one
//!   6. Audit a `launch` entry and print the access statistics

use std::sync::Arc;

use custos_audit::{AuditConfig, TracingAlertSink};
use custos_contracts::{
    access::AccessAction,
    error::CustosResult,
    report::StatsFilter,
};
use custos_core::{OpenOutcome, StoreOutcome};

use crate::mock_data::captured_portal_session;
use crate::scenarios::{agent_context, wire};
use crate::store::{LeadSessionStore, StoredSession};

/// Run Scenario 1: Capture and Replay.
pub fn run_scenario() -> CustosResult<()> {
    println!("=== Scenario 1: Capture and Replay ===");
    println!();

    let (security, _log) = wire(AuditConfig::default(), Arc::new(TracingAlertSink))?;
    let store = LeadSessionStore::new();
    let lead_id = "lead-7301";

    // ── Capture and store ─────────────────────────────────────────────────────

    let captured = captured_portal_session(lead_id);
    let session_id = captured.session_id.clone();
    let record = captured.to_value();
    let ctx = agent_context(&session_id, lead_id);

    println!("  Captured session {} for {}", session_id, lead_id);
    println!("  Cookies: {}  localStorage keys: {}",
        captured.cookies.len(),
        captured.local_storage.len(),
    );

    let outcome = security.store_session(&record, &ctx)?;
    let stored = match outcome {
        StoreOutcome::Stored { sealed, integrity_hash, report } => {
            println!("  Validation:   PASS ({} warnings)", report.warnings.len());
            println!("  Sealed:       cookies -> _encrypted blob, envelope attached");
            println!("  Fingerprint:  {}", &integrity_hash[..16]);
            StoredSession { session_id: session_id.clone(), sealed, integrity_hash }
        }
        StoreOutcome::Rejected { report } => {
            println!("  UNEXPECTED rejection: {:?}", report.errors);
            return Ok(());
        }
    };

    let stored_hash = stored.integrity_hash.clone();
    store.store(lead_id, stored);

    // ── Replay ────────────────────────────────────────────────────────────────

    let active = match store.active(lead_id) {
        Some(active) => active,
        None => {
            println!("  UNEXPECTED: no active session after store");
            return Ok(());
        }
    };

    match security.open_session(&active.sealed, &ctx)? {
        OpenOutcome::Opened { record, integrity_hash, .. } => {
            let cookie_count = record["cookies"].as_array().map_or(0, |c| c.len());
            println!();
            println!("  Opened for replay: {} cookies restored", cookie_count);
            println!(
                "  Fingerprint match: {}",
                if integrity_hash == stored_hash { "YES" } else { "NO (record drifted)" }
            );
        }
        OpenOutcome::Expired { .. } => println!("  UNEXPECTED: session reported expired"),
        OpenOutcome::Rejected { report } => {
            println!("  UNEXPECTED rejection: {:?}", report.errors)
        }
    }

    // The launcher reports the replay as a `launch` access.
    security.record_access(&ctx, AccessAction::Launch);

    let stats = security.statistics(&StatsFilter::default());
    println!();
    println!(
        "  Audit trail: {} entries ({} successful), actions: {:?}",
        stats.total_accesses,
        stats.successful_accesses,
        stats.action_breakdown.keys().collect::<Vec<_>>(),
    );
    println!();
    Ok(())
}
