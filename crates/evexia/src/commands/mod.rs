//! CLI command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use evexia_config::EvexiaConfig;
use evexia_store::FileStorage;

pub mod auth;
pub mod cache;
pub mod config;
pub mod prefs;
pub mod session;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration.
    pub config: EvexiaConfig,
    /// Local storage file.
    pub storage_path: PathBuf,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Open the local storage file.
    pub fn open_storage(&self) -> Result<Arc<FileStorage>> {
        let storage = FileStorage::open(&self.storage_path).with_context(|| {
            format!(
                "Failed to open local storage at {}",
                self.storage_path.display()
            )
        })?;
        Ok(Arc::new(storage))
    }
}
