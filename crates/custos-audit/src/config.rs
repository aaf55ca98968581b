//! Audit and anomaly-detection configuration.
//!
//! Example:
//! ```toml
//! max_log_entries = 1000
//! rapid_access_threshold = 10
//! failure_threshold = 5
//! window_ms = 60000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use custos_contracts::alert::AlertThresholds;
use custos_contracts::error::{CustosError, CustosResult};

/// Configuration for the in-memory access log and its detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Buffer capacity. Oldest entries are evicted first past this count.
    pub max_log_entries: usize,

    /// Rule 1: in-window `access` entries per user before
    /// `rapid_session_access` fires.
    pub rapid_access_threshold: usize,

    /// Rule 2: in-window failed entries per user before
    /// `multiple_access_failures` fires.
    pub failure_threshold: usize,

    /// Trailing detection window in milliseconds, relative to the newest
    /// entry.
    pub window_ms: i64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_log_entries: 1000,
            rapid_access_threshold: 10,
            failure_threshold: 5,
            window_ms: 60 * 1000,
        }
    }
}

impl AuditConfig {
    /// Parse `s` as a TOML audit configuration document.
    ///
    /// Unspecified keys take their defaults.
    pub fn from_toml_str(s: &str) -> CustosResult<Self> {
        toml::from_str(s).map_err(|e| CustosError::ConfigError {
            reason: format!("failed to parse audit config TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML audit configuration.
    pub fn from_file(path: &Path) -> CustosResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CustosError::ConfigError {
                reason: format!("failed to read audit config '{}': {}", path.display(), e),
            }
        })?;
        Self::from_toml_str(&contents)
    }

    /// The detection window as a `chrono::Duration`.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.window_ms)
    }

    /// The detector thresholds, for the security report.
    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            rapid_access: self.rapid_access_threshold,
            failures: self.failure_threshold,
        }
    }
}
