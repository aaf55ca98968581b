//! In-memory per-lead session store.
//!
//! Holds sealed (encrypted-at-rest) records the way the CRM backend stores
//! them on the lead document: at most one active session per lead plus an
//! ordered history of demoted ones. Storing a new session demotes the
//! previous active record into history; the one-active invariant holds after
//! every operation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// One lead's sealed sessions.
#[derive(Debug, Default, Clone)]
pub struct LeadSessions {
    /// The current session, if any. Exactly what `store` last sealed.
    pub active: Option<StoredSession>,
    /// Demoted sessions, oldest first.
    pub history: Vec<StoredSession>,
}

/// A sealed record plus the identity and fingerprint it was stored under.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session_id: String,
    pub sealed: Value,
    pub integrity_hash: String,
}

/// The mock persistence layer the scenarios store into.
///
/// A `Mutex<HashMap>` stands in for the CRM's lead collection; records are
/// kept sealed, exactly as a database would hold them.
#[derive(Debug, Default)]
pub struct LeadSessionStore {
    leads: Mutex<HashMap<String, LeadSessions>>,
}

impl LeadSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sealed session as the lead's active one.
    ///
    /// A previously active session is demoted into history, never dropped.
    pub fn store(&self, lead_id: &str, session: StoredSession) {
        let mut leads = self.lock();
        let entry = leads.entry(lead_id.to_string()).or_default();
        if let Some(previous) = entry.active.take() {
            debug!(
                lead_id,
                demoted = %previous.session_id,
                "demoting previous active session"
            );
            entry.history.push(previous);
        }
        entry.active = Some(session);
    }

    /// The lead's active sealed session, if any.
    pub fn active(&self, lead_id: &str) -> Option<StoredSession> {
        self.lock()
            .get(lead_id)
            .and_then(|sessions| sessions.active.clone())
    }

    /// All of the lead's sessions: history oldest-first, then active.
    pub fn all(&self, lead_id: &str) -> Vec<StoredSession> {
        let leads = self.lock();
        let Some(sessions) = leads.get(lead_id) else {
            return Vec::new();
        };
        let mut out = sessions.history.clone();
        out.extend(sessions.active.clone());
        out
    }

    /// Bump a stored session's `lastAccessedAt` after a successful access.
    ///
    /// The timestamp lands in the sealed record's plaintext passthrough
    /// field, so it survives the next open unchanged and never precedes
    /// `createdAt` (it is always "now"). Returns false when the session is
    /// not present.
    pub fn touch(&self, lead_id: &str, session_id: &str, at: DateTime<Utc>) -> bool {
        let mut leads = self.lock();
        let Some(sessions) = leads.get_mut(lead_id) else {
            return false;
        };
        let Some(session) = Self::find_mut(sessions, session_id) else {
            return false;
        };
        match session.sealed.as_object_mut() {
            Some(object) => {
                object.insert(
                    "lastAccessedAt".to_string(),
                    Value::String(at.to_rfc3339()),
                );
                true
            }
            None => false,
        }
    }

    /// Replace a session's sealed payload after a fresh capture was merged
    /// into it.
    ///
    /// The session keeps its id and its active/history position; only the
    /// payload and fingerprint change. Returns false when the session is
    /// not present.
    pub fn update(
        &self,
        lead_id: &str,
        session_id: &str,
        sealed: Value,
        integrity_hash: String,
    ) -> bool {
        let mut leads = self.lock();
        let Some(sessions) = leads.get_mut(lead_id) else {
            return false;
        };
        let Some(session) = Self::find_mut(sessions, session_id) else {
            return false;
        };
        debug!(lead_id, session_id, "replacing sealed session payload");
        session.sealed = sealed;
        session.integrity_hash = integrity_hash;
        true
    }

    fn find_mut<'a>(
        sessions: &'a mut LeadSessions,
        session_id: &str,
    ) -> Option<&'a mut StoredSession> {
        if sessions
            .active
            .as_ref()
            .is_some_and(|s| s.session_id == session_id)
        {
            return sessions.active.as_mut();
        }
        sessions
            .history
            .iter_mut()
            .find(|s| s.session_id == session_id)
    }

    /// Remove one session by id (active or historical).
    ///
    /// Returns true when a record was removed.
    pub fn clear(&self, lead_id: &str, session_id: &str) -> bool {
        let mut leads = self.lock();
        let Some(sessions) = leads.get_mut(lead_id) else {
            return false;
        };
        if sessions
            .active
            .as_ref()
            .is_some_and(|s| s.session_id == session_id)
        {
            sessions.active = None;
            return true;
        }
        let before = sessions.history.len();
        sessions.history.retain(|s| s.session_id != session_id);
        sessions.history.len() != before
    }

    /// Remove every session for the lead. Returns the number removed.
    pub fn clear_all(&self, lead_id: &str) -> usize {
        let mut leads = self.lock();
        match leads.remove(lead_id) {
            Some(sessions) => sessions.history.len() + usize::from(sessions.active.is_some()),
            None => 0,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LeadSessions>> {
        match self.leads.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
