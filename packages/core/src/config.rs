use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ConfigError;

pub const DEFAULT_CONFIG_NAME: &str = "plugdoc.config.json";

/// Limits applied by the reducer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Maximum number of undo batches kept (0 = unlimited, the default)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum number of documents kept on the clipboard
    #[serde(default = "default_clipboard_size")]
    pub clipboard_size: usize,
}

fn default_history_limit() -> usize {
    0
}

fn default_clipboard_size() -> usize {
    3
}

impl StoreConfig {
    /// Parse config from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(StoreConfig::default())
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            clipboard_size: default_clipboard_size(),
        }
    }
}
