//! Persistence configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default quiescence window before an edit is written, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where documents and settings live, and how eagerly edits are saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InkboardConfig {
    /// Root directory for documents and settings.
    pub data_dir: Option<PathBuf>,
    /// Autosave quiescence window in milliseconds.
    pub debounce_ms: u64,
    /// Settings file, defaults to `settings.json` inside the data directory.
    pub settings_file: Option<PathBuf>,
}

impl Default for InkboardConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            settings_file: None,
        }
    }
}

impl InkboardConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Load `path` if given, else the per-user config file if present,
    /// else defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("Using config {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/inkboard/config.toml`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("inkboard").join("config.toml"))
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The configured data directory, or the platform default.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(|| {
            dirs::data_local_dir()
                .or_else(dirs::home_dir)
                .map(|base| base.join("inkboard"))
        })
    }

    /// Directory holding one file per document.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn documents_dir(&self) -> Option<PathBuf> {
        self.resolve_data_dir().map(|dir| dir.join("documents"))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings_file
            .clone()
            .or_else(|| self.resolve_data_dir().map(|dir| dir.join("settings.json")))
    }
}
