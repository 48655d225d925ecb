use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default log filter when `RUST_LOG` is unset.
fn default_log_filter() -> String {
    "info".to_string()
}

/// Where the client config record is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One JSON file per key under the data directory.
    #[default]
    File,
    /// Process memory only. Everything is lost on exit.
    Memory,
}

/// Settings file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to data directory. If relative, resolved from the settings file location.
    /// If not specified, defaults to the settings file's directory.
    pub data_dir: Option<PathBuf>,

    pub storage: StorageKind,

    /// `tracing_subscriber::EnvFilter` directive.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage: StorageKind::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `settings_dir`.
    /// If `data_dir` is not set, returns `settings_dir`.
    pub fn resolve_data_dir(&self, settings_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => settings_dir.join(data_dir),
            None => settings_dir.to_path_buf(),
        }
    }
}

/// Loaded settings with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub log_filter: String,
}

/// Returns the default settings file path.
///
/// Resolution order:
/// 1. `./clientconf.toml` if it exists in current directory
/// 2. `~/.local/share/clientconf/clientconf.toml` (XDG data directory)
pub fn default_settings_path() -> PathBuf {
    let local = PathBuf::from("clientconf.toml");
    if local.exists() {
        return local;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("clientconf").join("clientconf.toml");
    }

    local
}

impl ResolvedSettings {
    fn from_settings(settings: Settings, settings_dir: &Path) -> Self {
        Self {
            data_dir: settings.resolve_data_dir(settings_dir),
            storage: settings.storage,
            log_filter: settings.log_filter,
        }
    }

    /// Load and resolve settings from a file path.
    pub fn load(settings_path: &Path) -> Result<Self> {
        let settings_path = settings_path
            .canonicalize()
            .with_context(|| format!("Settings file not found: {}", settings_path.display()))?;

        let settings_dir = settings_path
            .parent()
            .context("Settings file has no parent directory")?;

        let settings = Settings::load(&settings_path)?;
        Ok(Self::from_settings(settings, settings_dir))
    }

    /// Load settings, falling back to defaults if the file doesn't exist.
    ///
    /// Without a file, the file's intended parent directory is the data directory.
    pub fn load_or_default(settings_path: &Path) -> Result<Self> {
        if settings_path.exists() {
            return Self::load(settings_path);
        }

        let settings_path = if settings_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(settings_path)
        } else {
            settings_path.to_path_buf()
        };

        let settings_dir = settings_path
            .parent()
            .context("Settings path has no parent directory")?;

        Ok(Self::from_settings(Settings::default(), settings_dir))
    }
}
