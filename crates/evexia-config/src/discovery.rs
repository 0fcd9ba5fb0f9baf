//! Where Evexia's config and local state live, and how config layers stack.
//!
//! Two files are read: the user file (`config.toml` in the config
//! directory) and the project file (`evexia.toml` in the working
//! directory). The project file replaces the user file section by section.
//! `EVEXIA_CONFIG_DIR` relocates both the user file and the default storage
//! file, so one variable isolates a whole run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{ConfigError, EvexiaConfig, Result};

const APP_DIR: &str = "evexia";
const USER_FILE: &str = "config.toml";
const PROJECT_FILE: &str = "evexia.toml";
const DIR_OVERRIDE_ENV: &str = "EVEXIA_CONFIG_DIR";

/// Default local storage filename within the data directory.
pub const STORAGE_FILE: &str = "storage.json";

/// A config file position in the stack, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    User,
    Project,
}

/// What happened to one layer during loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStatus {
    /// No file at the path.
    Missing,
    /// Parsed and merged.
    Applied,
    /// Present but unreadable or malformed; skipped with a warning.
    Rejected,
}

/// Outcome for one layer.
#[derive(Debug, Clone)]
pub struct LayerReport {
    pub layer: Layer,
    pub path: PathBuf,
    pub status: LayerStatus,
}

/// Merged config plus a record of how it was assembled.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: EvexiaConfig,
    pub layers: Vec<LayerReport>,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the layers that contributed to `config`.
    pub fn applied(&self) -> Vec<&Path> {
        self.layers
            .iter()
            .filter(|report| report.status == LayerStatus::Applied)
            .map(|report| report.path.as_path())
            .collect()
    }
}

/// Locations of the two config layers.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Directory holding the user file; `None` when the platform has none.
    pub user_dir: Option<PathBuf>,
    /// Directory holding the project file.
    pub project_dir: PathBuf,
}

impl ConfigPaths {
    /// The standard locations: the config directory and the working directory.
    pub fn discover() -> Self {
        Self {
            user_dir: config_dir(),
            project_dir: PathBuf::new(),
        }
    }

    pub fn user_file(&self) -> Option<PathBuf> {
        self.user_dir.as_ref().map(|dir| dir.join(USER_FILE))
    }

    pub fn project_file(&self) -> PathBuf {
        self.project_dir.join(PROJECT_FILE)
    }

    /// Read and merge every layer. A bad layer is reported, never fatal.
    pub fn load(&self) -> LoadedConfig {
        let mut loaded = LoadedConfig::default();

        let stack = self
            .user_file()
            .map(|path| (Layer::User, path))
            .into_iter()
            .chain(std::iter::once((Layer::Project, self.project_file())));

        for (layer, path) in stack {
            let status = match read_layer(&path) {
                Ok(None) => LayerStatus::Missing,
                Ok(Some(config)) => {
                    loaded.config.merge(config);
                    LayerStatus::Applied
                }
                Err(e) => {
                    loaded
                        .warnings
                        .push(format!("Ignoring {}: {}", path.display(), e));
                    LayerStatus::Rejected
                }
            };
            loaded.layers.push(LayerReport {
                layer,
                path,
                status,
            });
        }

        loaded
    }
}

/// Load config from the standard locations.
pub fn load_config() -> LoadedConfig {
    ConfigPaths::discover().load()
}

/// Directory for the user config file.
pub fn config_dir() -> Option<PathBuf> {
    dir_override().or_else(|| dirs::config_dir().map(|d| d.join(APP_DIR)))
}

/// The user config file, where `config init` writes by default.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_FILE))
}

/// Directory for local storage when `[storage] path` is unset.
pub fn data_dir() -> Option<PathBuf> {
    dir_override().or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
}

/// Write `config` as TOML, creating missing parent directories.
pub fn write_config(config: &EvexiaConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    std::fs::write(path, config.to_toml()?).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}

fn dir_override() -> Option<PathBuf> {
    std::env::var_os(DIR_OVERRIDE_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}

fn read_layer(path: &Path) -> Result<Option<EvexiaConfig>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => EvexiaConfig::from_toml(&contents).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(user: &TempDir, project: &TempDir) -> ConfigPaths {
        ConfigPaths {
            user_dir: Some(user.path().to_path_buf()),
            project_dir: project.path().to_path_buf(),
        }
    }

    #[test]
    fn test_no_files_gives_defaults() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let loaded = paths(&user, &project).load();

        assert_eq!(loaded.config, EvexiaConfig::default());
        assert!(loaded.applied().is_empty());
        assert!(loaded.warnings.is_empty());
        let statuses: Vec<_> = loaded.layers.iter().map(|r| (r.layer, r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (Layer::User, LayerStatus::Missing),
                (Layer::Project, LayerStatus::Missing)
            ]
        );
    }

    #[test]
    fn test_project_logging_over_user_storage() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            user.path().join("config.toml"),
            "[storage]\npath = \"/srv/evexia/state.json\"\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        fs::write(
            project.path().join("evexia.toml"),
            "[logging]\nlevel = \"debug\"\nfile = true\n",
        )
        .unwrap();

        let loaded = paths(&user, &project).load();

        assert_eq!(
            loaded.config.storage().resolve_path(),
            PathBuf::from("/srv/evexia/state.json")
        );
        let logging = loaded.config.logging();
        assert_eq!(logging.level, "debug");
        assert!(logging.file);
        assert_eq!(loaded.applied().len(), 2);
    }

    #[test]
    fn test_malformed_project_file_is_rejected() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "[logging]\nlevel = \"warn\"\n").unwrap();
        fs::write(project.path().join("evexia.toml"), "[logging\nlevel = ").unwrap();

        let loaded = paths(&user, &project).load();

        assert_eq!(loaded.config.logging().level, "warn");
        assert_eq!(loaded.layers[1].status, LayerStatus::Rejected);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("evexia.toml"));
    }

    #[test]
    fn test_without_user_dir_only_project_is_read() {
        let project = TempDir::new().unwrap();
        let loaded = ConfigPaths {
            user_dir: None,
            project_dir: project.path().to_path_buf(),
        }
        .load();

        assert_eq!(loaded.layers.len(), 1);
        assert_eq!(loaded.layers[0].layer, Layer::Project);
    }

    #[test]
    fn test_write_config_then_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = EvexiaConfig::new();
        config.logging = Some(crate::LoggingConfig {
            level: "trace".to_string(),
            ..Default::default()
        });
        write_config(&config, &path).unwrap();

        let loaded = ConfigPaths {
            user_dir: Some(path.parent().unwrap().to_path_buf()),
            project_dir: dir.path().to_path_buf(),
        }
        .load();
        assert_eq!(loaded.config.logging().level, "trace");
    }

    #[test]
    fn test_write_config_to_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let err = write_config(&EvexiaConfig::new(), &blocker.join("config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::WriteFile { .. }));
    }
}
