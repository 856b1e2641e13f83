//! Configuration for MapView
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - View defaults (output size, DPI, device pixel ratio, background, CRS)
//! - Logging (level filter, JSON output)
//! - Recently opened projects

use mapview_core::{Color, CoordinateReferenceSystem, Size};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::controller::MapSettingsController;
use crate::error::{ConfigError, SettingsError, SettingsResult};
use crate::map_settings::DEFAULT_DPI;

/// Defaults applied to a new map view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Output width in device-independent pixels
    pub output_width: u32,
    /// Output height in device-independent pixels
    pub output_height: u32,
    /// Output DPI before device pixel ratio scaling
    pub output_dpi: f64,
    /// Physical pixels per device-independent pixel
    pub device_pixel_ratio: f64,
    /// Map background
    #[serde(default)]
    pub background_color: Color,
    /// CRS used until a project provides one
    #[serde(default)]
    pub fallback_crs: Option<String>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            output_width: 800,
            output_height: 600,
            output_dpi: DEFAULT_DPI,
            device_pixel_ratio: 1.0,
            background_color: Color::WHITE,
            fallback_crs: Some("EPSG:3857".to_string()),
        }
    }
}

impl ViewSettings {
    /// Push these defaults into a controller.
    ///
    /// The device pixel ratio goes first so size and DPI get scaled by it.
    pub fn apply(&self, controller: &MapSettingsController) {
        controller.set_device_pixel_ratio(self.device_pixel_ratio);
        controller.set_output_size(Size::new(self.output_width, self.output_height));
        controller.set_output_dpi(self.output_dpi);
        controller.set_background_color(self.background_color);
        if let Some(crs) = &self.fallback_crs {
            controller.set_destination_crs(CoordinateReferenceSystem::from_auth_id(crs));
        }
    }
}

/// Logging preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing` filter directive, e.g. "info" or "mapview_settings=debug"
    pub level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// View defaults
    #[serde(default)]
    pub view: ViewSettings,
    /// Logging preferences
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Recently opened projects, newest first
    #[serde(default)]
    pub recent_projects: Vec<PathBuf>,
    /// Number of recent projects to keep
    #[serde(default = "default_recent_count")]
    pub recent_projects_count: usize,
}

fn default_recent_count() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view: ViewSettings::default(),
            logging: LoggingSettings::default(),
            recent_projects: Vec::new(),
            recent_projects_count: default_recent_count(),
        }
    }
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("<none>").to_string()).into()),
    }
}

fn out_of_range(key: &str, value: impl ToString) -> SettingsError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let view = &self.view;
        if view.output_width == 0 || view.output_height == 0 {
            return Err(out_of_range(
                "view.output_size",
                Size::new(view.output_width, view.output_height),
            ));
        }

        if !(view.output_dpi.is_finite() && view.output_dpi > 0.0) {
            return Err(out_of_range("view.output_dpi", view.output_dpi));
        }

        if !(view.device_pixel_ratio.is_finite() && view.device_pixel_ratio > 0.0) {
            return Err(out_of_range("view.device_pixel_ratio", view.device_pixel_ratio));
        }

        if let Some(crs) = &view.fallback_crs {
            if !CoordinateReferenceSystem::from_auth_id(crs).is_valid() {
                return Err(SettingsError::InvalidSetting {
                    key: "view.fallback_crs".to_string(),
                    reason: format!("'{}' is not an AUTHORITY:CODE identifier", crs),
                });
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::InvalidSetting {
                key: "logging.level".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Add a project to the recent projects list
    pub fn add_recent_project(&mut self, path: PathBuf) {
        self.recent_projects.retain(|p| p != &path);
        self.recent_projects.insert(0, path);
        self.recent_projects.truncate(self.recent_projects_count);
    }

    /// Merge another config into this one.
    ///
    /// Sections of `other` that still hold their defaults leave this
    /// config's values in place.
    pub fn merge(&mut self, other: &Config) {
        if other.view != ViewSettings::default() {
            self.view = other.view.clone();
        }
        if other.logging != LoggingSettings::default() {
            self.logging = other.logging.clone();
        }
        for path in other.recent_projects.iter().rev() {
            self.add_recent_project(path.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.view.output_dpi, 96.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.view.device_pixel_ratio = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));

        let mut config = Config::default();
        config.view.fallback_crs = Some("mercator".to_string());
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_recent_projects() {
        let mut config = Config::default();
        config.recent_projects_count = 2;
        config.add_recent_project(PathBuf::from("a.qgs"));
        config.add_recent_project(PathBuf::from("b.qgs"));
        config.add_recent_project(PathBuf::from("a.qgs"));
        config.add_recent_project(PathBuf::from("c.qgs"));
        assert_eq!(
            config.recent_projects,
            vec![PathBuf::from("c.qgs"), PathBuf::from("a.qgs")]
        );
    }

    #[test]
    fn test_merge_keeps_values_for_default_sections() {
        let mut base = Config::default();
        base.view.output_dpi = 120.0;

        let mut other = Config::default();
        other.logging.json = true;

        base.merge(&other);
        assert_eq!(base.view.output_dpi, 120.0);
        assert!(base.logging.json);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::default()
            .save_to_file(Path::new("config.yaml"))
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_apply_view_settings() {
        let controller = MapSettingsController::new();
        let view = ViewSettings {
            device_pixel_ratio: 2.0,
            ..ViewSettings::default()
        };
        view.apply(&controller);
        assert_eq!(controller.output_size(), Size::new(1600, 1200));
        assert_eq!(controller.output_dpi(), 192.0);
        assert_eq!(controller.destination_crs().auth_id(), "EPSG:3857");
    }
}
