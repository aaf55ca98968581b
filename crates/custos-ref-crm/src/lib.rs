//! # custos-ref-crm
//!
//! CRM reference adapter for the Custos session-security stack.
//!
//! Demonstrates three scenarios against mock capture data:
//!
//! 1. **Capture and Replay** — validate, seal, persist per-lead, reopen for
//!    replay, fingerprint comparison.
//! 2. **Tamper Detection** — pre-storage rejection, flipped ciphertext, and
//!    a stripped encryption envelope.
//! 3. **Abuse Detection** — rapid-access and repeated-failure alerts plus
//!    the operator security report.
//!
//! All data is hardcoded and fictional. No browser or database is contacted.

pub mod mock_data;
pub mod scenarios;
pub mod store;

pub use store::{LeadSessionStore, LeadSessions, StoredSession};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use serde_json::json;

    use custos_audit::{AuditConfig, TracingAlertSink};
    use custos_contracts::access::AccessAction;
    use custos_core::{OpenOutcome, StoreOutcome};

    use crate::mock_data::{captured_portal_session, malformed_capture};
    use crate::scenarios::{agent_context, wire};
    use crate::store::{LeadSessionStore, StoredSession};

    #[test]
    fn full_capture_store_replay_round_trip() {
        let (security, _log) =
            wire(AuditConfig::default(), Arc::new(TracingAlertSink)).unwrap();
        let store = LeadSessionStore::new();

        let captured = captured_portal_session("lead-1");
        let record = captured.to_value();
        let ctx = agent_context(&captured.session_id, "lead-1");

        let (sealed, hash) = match security.store_session(&record, &ctx).unwrap() {
            StoreOutcome::Stored { sealed, integrity_hash, .. } => (sealed, integrity_hash),
            StoreOutcome::Rejected { report } => panic!("rejected: {:?}", report.errors),
        };
        store.store(
            "lead-1",
            StoredSession {
                session_id: captured.session_id.clone(),
                sealed,
                integrity_hash: hash.clone(),
            },
        );

        let active = store.active("lead-1").unwrap();
        match security.open_session(&active.sealed, &ctx).unwrap() {
            OpenOutcome::Opened { record: opened, integrity_hash, .. } => {
                assert_eq!(opened, record);
                assert_eq!(integrity_hash, hash);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn merged_capture_updates_in_place_and_audits_update() {
        let (security, log) =
            wire(AuditConfig::default(), Arc::new(TracingAlertSink)).unwrap();
        let store = LeadSessionStore::new();

        let captured = captured_portal_session("lead-1");
        let ctx = agent_context(&captured.session_id, "lead-1");
        let record = captured.to_value();

        let (sealed, hash) = match security.store_session(&record, &ctx).unwrap() {
            StoreOutcome::Stored { sealed, integrity_hash, .. } => (sealed, integrity_hash),
            StoreOutcome::Rejected { report } => panic!("rejected: {:?}", report.errors),
        };
        store.store(
            "lead-1",
            StoredSession {
                session_id: captured.session_id.clone(),
                sealed,
                integrity_hash: hash.clone(),
            },
        );

        // A fresh capture for the same session: re-validate, re-seal, and
        // replace the stored payload in place.
        let mut merged = record.clone();
        merged["lastAccessedAt"] = json!(Utc::now().to_rfc3339());
        merged["cookies"]
            .as_array_mut()
            .unwrap()
            .push(json!({"name": "refresh_token", "value": "rt-41aa"}));

        let (resealed, merged_hash) = match security.store_session(&merged, &ctx).unwrap() {
            StoreOutcome::Stored { sealed, integrity_hash, .. } => (sealed, integrity_hash),
            StoreOutcome::Rejected { report } => panic!("rejected: {:?}", report.errors),
        };
        assert!(store.update(
            "lead-1",
            &captured.session_id,
            resealed,
            merged_hash.clone(),
        ));
        security.record_access(&ctx, AccessAction::Update);

        // Still one session for the lead, now carrying the merged payload.
        assert_eq!(store.all("lead-1").len(), 1);
        let active = store.active("lead-1").unwrap();
        assert_eq!(active.integrity_hash, merged_hash);
        assert_ne!(active.integrity_hash, hash);

        assert!(log
            .snapshot()
            .iter()
            .any(|entry| entry.action == AccessAction::Update && entry.success));
    }

    #[test]
    fn malformed_capture_is_rejected_and_audited() {
        let (security, log) =
            wire(AuditConfig::default(), Arc::new(TracingAlertSink)).unwrap();
        let ctx = agent_context("", "lead-1");

        match security.store_session(&malformed_capture(), &ctx).unwrap() {
            StoreOutcome::Rejected { report } => {
                assert!(!report.is_valid);
                assert!(report
                    .errors
                    .iter()
                    .any(|e| e.contains("missing required field")));
            }
            StoreOutcome::Stored { .. } => panic!("malformed capture stored"),
        }

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
    }
}
