//! Runtime configuration for a machine.

use serde::{Deserialize, Serialize};

/// Settings that do not change what a machine does, only how it reports.
///
/// # Example
///
/// ```rust
/// use tantamount::config::MachineConfig;
///
/// let config = MachineConfig::from_json_str(r#"{ "name": "door" }"#).unwrap();
/// assert_eq!(config.name, "door");
/// assert_eq!(config.history_limit, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Label used in log records, snapshots and background thread names.
    pub name: String,

    /// Number of transitions kept in the machine's history.
    pub history_limit: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "machine".to_string(),
            history_limit: 64,
        }
    }
}

impl MachineConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
