//! Scenario 3: Abuse Detection
//!
//! Simulates the two access patterns the anomaly detector watches for and
//! finishes with the operator-facing security report:
//!
//!   1. One agent opens the same lead's session 12 times inside a minute —
//!      `rapid_session_access` fires past the 10-attempt threshold.
//!   2. A second agent fails decryption 6 times (wrong master key) —
//!      `multiple_access_failures` fires past the 5-failure threshold.
//!   3. `security_report()` summarizes both incidents with prioritized
//!      recommendations.

use std::sync::{Arc, Mutex};

use custos_audit::AuditConfig;
use custos_contracts::{
    alert::SecurityAlert,
    error::CustosResult,
};
use custos_core::{traits::AlertSink, StoreOutcome};
use custos_crypto::{CbcSessionCipher, MasterKey};

use crate::mock_data::captured_portal_session;
use crate::scenarios::{agent_context, wire};

/// Collects raised alerts so the scenario can print them at the end.
#[derive(Default)]
struct CollectingSink {
    alerts: Mutex<Vec<SecurityAlert>>,
}

impl CollectingSink {
    fn drain(&self) -> Vec<SecurityAlert> {
        match self.alerts.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl AlertSink for CollectingSink {
    fn raise(&self, alert: &SecurityAlert) {
        if let Ok(mut guard) = self.alerts.lock() {
            guard.push(alert.clone());
        }
    }
}

/// Run Scenario 3: Abuse Detection.
pub fn run_scenario() -> CustosResult<()> {
    println!("=== Scenario 3: Abuse Detection ===");
    println!();

    let sink = Arc::new(CollectingSink::default());
    let (security, _log) = wire(AuditConfig::default(), sink.clone())?;
    let lead_id = "lead-7303";

    // ── Seal one session to hammer on ─────────────────────────────────────────

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

    // ── Pattern 1: rapid access ───────────────────────────────────────────────

    println!("  Agent agent-maria opens the session 12 times in rapid succession…");
    for _ in 0..12 {
        security.open_session(&sealed, &ctx)?;
    }
    for alert in sink.drain() {
        println!(
            "  ALERT {}: user={} count={} ip={}",
            alert.kind,
            alert.user_id,
            alert.count,
            alert.ip_address.as_deref().unwrap_or("<unknown>"),
        );
    }
    println!();

    // ── Pattern 2: repeated decryption failures ───────────────────────────────

    // A record sealed under a different master key cannot be opened here.
    let foreign_key = MasterKey::from_hex(
        "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff",
    )?;
    let foreign_cipher = CbcSessionCipher::new(foreign_key);
    let foreign_sealed = {
        use custos_core::traits::SessionCipher;
        foreign_cipher.seal(&record)?
    };

    let mut intruder_ctx = agent_context(&captured.session_id, lead_id);
    intruder_ctx.user_id = "agent-unknown".to_string();
    intruder_ctx.ip_address = Some("203.0.113.77".to_string());

    println!("  Agent agent-unknown fails to decrypt 6 times (wrong key)…");
    for _ in 0..6 {
        if security.open_session(&foreign_sealed, &intruder_ctx).is_ok() {
            println!("  UNEXPECTED: foreign record opened");
        }
    }
    for alert in sink.drain() {
        println!(
            "  ALERT {}: user={} count={} ip={}",
            alert.kind,
            alert.user_id,
            alert.count,
            alert.ip_address.as_deref().unwrap_or("<unknown>"),
        );
    }
    println!();

    // ── Security report ───────────────────────────────────────────────────────

    let report = security.security_report();
    let day = &report.access_statistics.last_24_hours;
    println!("  Security report:");
    println!(
        "    last 24h: {} accesses ({} failed), {} unique users",
        day.total_accesses, day.failed_accesses, day.unique_users,
    );
    println!(
        "    log: {}/{} entries, cipher {} (operator key: {})",
        report.security_metrics.total_log_entries,
        report.security_metrics.max_log_entries,
        report.security_metrics.encryption.algorithm,
        report.security_metrics.encryption.configured_key,
    );
    for rec in &report.recommendations {
        println!("    [{:?}] {}: {}", rec.priority, rec.category, rec.message);
    }
    println!();
    Ok(())
}
