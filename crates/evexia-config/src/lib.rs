//! Configuration for the Evexia command-line host.
//!
//! A small TOML schema (`[storage]` and `[logging]`) read from a user file
//! and an optional project file layered on top.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigPaths, Layer, LayerReport, LayerStatus, LoadedConfig, STORAGE_FILE, config_dir,
    data_dir, load_config, user_config_path, write_config,
};
pub use error::{ConfigError, Result};
pub use types::*;
