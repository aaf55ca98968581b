//! Simulated CRM capture data for the Custos reference adapter.
//!
//! All sessions, leads, and cookie values in this module are hardcoded and
//! fictional. No browser is contacted; this module stands in for the capture
//! extension that records a lead's authenticated browser state in a real
//! deployment.

use chrono::Utc;
use rand::RngCore;
use serde_json::Value;

use custos_contracts::session::{Cookie, SessionRecord, Viewport};

/// Generate a capture-format session id: `session_<epochMillis>_<hex>`.
pub fn new_session_id() -> String {
    let mut suffix = [0u8; 8];
    rand::rngs::OsRng.fill_bytes(&mut suffix);
    format!(
        "session_{}_{}",
        Utc::now().timestamp_millis(),
        hex::encode(suffix)
    )
}

/// A freshly captured portal session for the given lead.
///
/// Cookies and storage mirror what the capture extension records from a
/// logged-in benefits-portal tab: auth token, CSRF token, UI preferences.
pub fn captured_portal_session(lead_id: &str) -> SessionRecord {
    let mut record = SessionRecord {
        session_id: new_session_id(),
        created_at: Utc::now(),
        last_accessed_at: None,
        is_active: true,
        cookies: vec![
            {
                let mut c = Cookie::new("auth_token", "eyJhbGciOiJIUzI1NiJ9.mock-portal-token");
                c.domain = Some(".portal.example.com".to_string());
                c.path = Some("/".to_string());
                c.secure = true;
                c.http_only = true;
                c
            },
            {
                let mut c = Cookie::new("csrf_token", "f3a9c2d41b8e7706");
                c.domain = Some(".portal.example.com".to_string());
                c.secure = true;
                c
            },
            Cookie::new("locale", "en-US"),
        ],
        local_storage: Default::default(),
        session_storage: Default::default(),
        user_agent: Some(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/122.0 Safari/537.36"
                .to_string(),
        ),
        viewport: Some(Viewport { width: 1920, height: 1080 }),
        metadata: serde_json::Map::new(),
    };

    record
        .local_storage
        .insert("portal.theme".to_string(), "dark".to_string());
    record
        .local_storage
        .insert("portal.recentQuotes".to_string(), "[\"Q-4410\",\"Q-4388\"]".to_string());
    record
        .session_storage
        .insert("portal.wizardStep".to_string(), "3".to_string());

    record
        .metadata
        .insert("domain".to_string(), Value::String("portal.example.com".to_string()));
    record
        .metadata
        .insert("leadId".to_string(), Value::String(lead_id.to_string()));

    record
}

/// A deliberately malformed capture: no cookies array, blank id.
///
/// Used by the tamper scenario to show pre-storage rejection.
pub fn malformed_capture() -> Value {
    serde_json::json!({
        "sessionId": "",
        "createdAt": Utc::now().to_rfc3339(),
        "userAgent": "broken-capture/0.1"
    })
}

// ── Leads (mock) ──────────────────────────────────────────────────────────────

/// The fictional leads the scenarios operate on.
pub fn mock_lead_ids() -> Vec<&'static str> {
    vec!["lead-7301", "lead-7302", "lead-7303"]
}
