//! CRM reference scenarios.
//!
//! Each scenario wires real Custos components (cipher, validator, access
//! log, detector) against mock capture data and walks through one security
//! pattern the CRM backend relies on.

use std::sync::Arc;

use custos_audit::{AuditConfig, InMemoryAccessLog};
use custos_contracts::access::AccessContext;
use custos_contracts::error::CustosResult;
use custos_core::{traits::AlertSink, SessionSecurity};
use custos_crypto::{CbcSessionCipher, MasterKey};
use custos_validate::{IntegrityValidator, ValidationLimits};

pub mod abuse_detection;
pub mod capture_replay;
pub mod tamper_detection;

/// A demo master key: 64 hex chars, as an operator would configure.
///
/// Fictional; a real deployment generates its own and keeps it out of
/// source control.
pub(crate) const DEMO_MASTER_KEY: &str =
    "6f1d2c3b4a5968778695a4b3c2d1e0ff00112233445566778899aabbccddeeff";

/// Wire up a full session-security stack around the given audit config.
///
/// Returns the manager plus a handle to the concrete log so scenarios can
/// inspect the buffer after the fact.
pub(crate) fn wire(
    config: AuditConfig,
    sink: Arc<dyn AlertSink>,
) -> CustosResult<(SessionSecurity, Arc<InMemoryAccessLog>)> {
    let key = MasterKey::from_hex(DEMO_MASTER_KEY)?;
    let cipher = CbcSessionCipher::new(key);
    let validator = IntegrityValidator::new(ValidationLimits::default());
    let log = Arc::new(InMemoryAccessLog::with_sink(config, sink));

    let security = SessionSecurity::new(
        Box::new(cipher),
        Box::new(validator),
        log.clone(),
    );
    Ok((security, log))
}

/// The access context a scenario's mock agent operates under.
pub(crate) fn agent_context(session_id: &str, lead_id: &str) -> AccessContext {
    AccessContext {
        session_id: session_id.to_string(),
        lead_id: lead_id.to_string(),
        user_id: "agent-maria".to_string(),
        user_role: "sales_agent".to_string(),
        ip_address: Some("198.51.100.23".to_string()),
        user_agent: Some("crm-backend/1.0".to_string()),
    }
}
