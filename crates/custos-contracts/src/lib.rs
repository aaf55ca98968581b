//! # custos-contracts
//!
//! Shared types, contracts, and error taxonomy for the Custos
//! session-security runtime.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, the wire format of encrypted-at-rest
//! session records, and the report shapes consumed by admin reporting.

pub mod access;
pub mod alert;
pub mod error;
pub mod report;
pub mod session;

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use crate::access::{AccessAction, AccessContext, AccessRecord};
    use crate::report::IntegrityReport;
    use crate::session::{
        has_canonical_id_format, is_encrypted_field, Cookie, EncryptedField,
        EncryptionEnvelope, SessionRecord, Viewport, CANONICAL_ID_PREFIX, ENVELOPE_VERSION,
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_context() -> AccessContext {
        AccessContext {
            session_id: "session_1700000000000_ab12cd34".to_string(),
            lead_id: "lead-42".to_string(),
            user_id: "agent-7".to_string(),
            user_role: "agent".to_string(),
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        }
    }

    // ── Session id format ─────────────────────────────────────────────────────

    #[test]
    fn canonical_id_accepts_wellformed() {
        assert!(has_canonical_id_format(
            "session_1700000000000_ab12cd34",
            CANONICAL_ID_PREFIX
        ));
    }

    #[test]
    fn canonical_id_rejects_malformed() {
        // Wrong prefix.
        assert!(!has_canonical_id_format("gui_session_1_ab", CANONICAL_ID_PREFIX));
        // Missing hex tail.
        assert!(!has_canonical_id_format("session_1700000000000", CANONICAL_ID_PREFIX));
        // Empty digit run.
        assert!(!has_canonical_id_format("session__ab12", CANONICAL_ID_PREFIX));
        // Uppercase hex is not canonical.
        assert!(!has_canonical_id_format("session_1_AB12", CANONICAL_ID_PREFIX));
        // Non-digit millis.
        assert!(!has_canonical_id_format("session_17x0_ab12", CANONICAL_ID_PREFIX));
    }

    #[test]
    fn alternate_prefix_is_opt_in() {
        // The same id fails the canonical prefix but passes when the caller
        // supplies the producer's prefix explicitly.
        let id = "gui_session_1700000000000_ab12cd34";
        assert!(!has_canonical_id_format(id, CANONICAL_ID_PREFIX));
        assert!(has_canonical_id_format(id, "gui_session_"));
    }

    // ── Wire format ───────────────────────────────────────────────────────────

    #[test]
    fn session_record_serializes_camel_case() {
        let record = SessionRecord {
            session_id: "session_1_ab".to_string(),
            created_at: Utc::now(),
            last_accessed_at: None,
            is_active: true,
            cookies: vec![Cookie::new("sid", "abc")],
            local_storage: [("k".to_string(), "v".to_string())].into(),
            session_storage: Default::default(),
            user_agent: Some("UA".to_string()),
            viewport: Some(Viewport { width: 1280, height: 720 }),
            metadata: serde_json::Map::new(),
        };
        let value = record.to_value();

        assert_eq!(value["sessionId"], json!("session_1_ab"));
        assert_eq!(value["isActive"], json!(true));
        assert_eq!(value["localStorage"]["k"], json!("v"));
        assert_eq!(value["cookies"][0]["name"], json!("sid"));
        // Empty sessionStorage is omitted entirely.
        assert!(value.get("sessionStorage").is_none());
    }

    #[test]
    fn encrypted_field_marker_round_trips() {
        let field = EncryptedField {
            encrypted: "deadbeef".to_string(),
            iv: "00112233445566778899aabbccddeeff".to_string(),
            is_encrypted: true,
        };
        let value = serde_json::to_value(&field).unwrap();

        assert_eq!(value["_encrypted"], json!(true));
        assert!(is_encrypted_field(&value));
        assert!(!is_encrypted_field(&json!({"name": "sid", "value": "abc"})));

        let back: EncryptedField = serde_json::from_value(value).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn envelope_uses_camel_case_keys() {
        let envelope = EncryptionEnvelope {
            algorithm: "aes-256-cbc".to_string(),
            salt: "00".repeat(32),
            encrypted_at: Utc::now(),
            version: ENVELOPE_VERSION.to_string(),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("encryptedAt").is_some());
        assert_eq!(value["version"], json!("1.0"));
    }

    // ── Access normalization ──────────────────────────────────────────────────

    #[test]
    fn access_record_defaults_to_success() {
        let entry = AccessRecord::new(make_context(), AccessAction::Access)
            .into_entry(Utc::now());
        assert!(entry.success);
        assert!(entry.error_message.is_none());
    }

    #[test]
    fn access_record_failed_is_explicit() {
        let entry = AccessRecord::failed(make_context(), AccessAction::Access, "boom")
            .into_entry(Utc::now());
        assert!(!entry.success);
        assert_eq!(entry.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(AccessAction::AccessAttempt).unwrap(),
            json!("access_attempt")
        );
        assert_eq!(AccessAction::ClearAll.as_str(), "clear_all");
    }

    // ── Integrity report ──────────────────────────────────────────────────────

    #[test]
    fn integrity_report_derives_flags() {
        let report = IntegrityReport::from_parts(
            vec!["missing required field: cookies".to_string()],
            vec!["unusual viewport dimensions".to_string()],
            false,
            false,
        );
        assert!(!report.is_valid);
        assert!(report.has_warnings);

        let clean = IntegrityReport::from_parts(vec![], vec![], false, false);
        assert!(clean.is_valid);
        assert!(!clean.has_warnings);
    }
}
