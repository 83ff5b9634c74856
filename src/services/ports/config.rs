use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_LOG_FILTER: &str = "eduframe=info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    pub connect_timeout_ms: u64,
    /// Upper bound for one adaptive candidate's `init`. Unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            candidate_timeout_ms: None,
            log_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl FrameworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn candidate_timeout(&self) -> Option<Duration> {
        self.candidate_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/services/ports/config.rs"]
mod tests;
