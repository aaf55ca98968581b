//! Validation limit configuration.
//!
//! `ValidationLimits` is deserialized from TOML (or built from `Default`,
//! which carries the production constants). Hard limits produce errors;
//! soft limits produce warnings and never invalidate a record.
//!
//! Example:
//! ```toml
//! max_session_age_ms = 2592000000   # 30 days
//! max_cookie_size = 4096
//! max_storage_item_size = 1048576   # 1 MiB
//! max_total_cookies = 100
//! max_storage_items = 50
//! accepted_id_prefixes = ["session_", "gui_session_"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use custos_contracts::error::{CustosError, CustosResult};
use custos_contracts::session::CANONICAL_ID_PREFIX;

/// Structural and freshness limits applied by the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum record age in milliseconds before it is expired (hard limit).
    pub max_session_age_ms: i64,

    /// Cookie values above this byte length draw a warning (soft limit).
    pub max_cookie_size: usize,

    /// Storage values above this byte length draw a warning (soft limit).
    pub max_storage_item_size: usize,

    /// Cookie counts above this draw a warning (soft limit).
    pub max_total_cookies: usize,

    /// Storage item counts above this draw a warning (soft limit).
    pub max_storage_items: usize,

    /// Session-id prefixes the format check accepts. The canonical producer
    /// writes `session_`; external capture paths minting `gui_session_` /
    /// `test_session_` ids must be admitted here explicitly.
    pub accepted_id_prefixes: Vec<String>,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_session_age_ms: 30 * 24 * 60 * 60 * 1000,
            max_cookie_size: 4096,
            max_storage_item_size: 1024 * 1024,
            max_total_cookies: 100,
            max_storage_items: 50,
            accepted_id_prefixes: vec![CANONICAL_ID_PREFIX.to_string()],
        }
    }
}

impl ValidationLimits {
    /// Parse `s` as a TOML limits document.
    ///
    /// Unspecified keys take their defaults, so a partial document is valid.
    pub fn from_toml_str(s: &str) -> CustosResult<Self> {
        toml::from_str(s).map_err(|e| CustosError::ConfigError {
            reason: format!("failed to parse validation limits TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as a TOML limits document.
    pub fn from_file(path: &Path) -> CustosResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CustosError::ConfigError {
                reason: format!(
                    "failed to read limits file '{}': {}",
                    path.display(),
                    e
                ),
            }
        })?;
        Self::from_toml_str(&contents)
    }

    /// The maximum session age as a `chrono::Duration`.
    pub fn max_session_age(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.max_session_age_ms)
    }
}
