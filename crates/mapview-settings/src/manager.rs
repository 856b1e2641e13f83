//! Config file location
//!
//! Resolves where MapView keeps its configuration on the current platform.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ConfigError, SettingsError, SettingsResult};

const APP_DIR: &str = "mapview";
const CONFIG_FILE: &str = "config.toml";

/// Platform config directory handling
pub struct ConfigLocation;

impl ConfigLocation {
    /// Directory holding MapView's configuration
    pub fn config_dir() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()).into())
    }

    /// Default config file path
    pub fn config_file_path() -> SettingsResult<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Create the config directory if needed
    pub fn ensure_config_dir() -> SettingsResult<PathBuf> {
        let dir = Self::config_dir()?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", dir.display(), e)))?;
        Ok(dir)
    }

    /// Load `path`, or the default config file when `path` is `None`.
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Config> {
        match path {
            Some(path) => Config::load_from_file(path),
            None => {
                let default = Self::config_file_path()?;
                if default.exists() {
                    Config::load_from_file(&default)
                } else {
                    tracing::debug!("No config at {}, using defaults", default.display());
                    Ok(Config::default())
                }
            }
        }
    }
}
