//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [storage]                # where client-local state is persisted
//! path = "/home/me/.local/share/evexia/storage.json"
//!
//! [logging]
//! level = "info"
//! file = true
//! directory = "/var/log/evexia"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvexiaConfig {
    /// Local storage configuration.
    pub storage: Option<StorageConfig>,

    /// Logging configuration.
    pub logging: Option<LoggingConfig>,
}

impl EvexiaConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: EvexiaConfig) {
        if other.storage.is_some() {
            self.storage = other.storage;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Effective storage settings.
    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }

    /// Effective logging settings.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Local storage section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file. Defaults to `storage.json` in the data directory.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the storage file path.
    pub fn resolve_path(&self) -> PathBuf {
        self.path
            .clone()
            .or_else(|| crate::data_dir().map(|d| d.join(crate::STORAGE_FILE)))
            .unwrap_or_else(|| PathBuf::from(crate::STORAGE_FILE))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console filter level for evexia crates (`error` .. `trace`).
    pub level: String,
    /// Also write JSON logs to a daily-rotating file.
    pub file: bool,
    /// Directory for log files. Defaults to `logs/` in the config directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: false,
            directory: None,
        }
    }
}
