//! MapView Settings Crate
//!
//! Map settings value object, the observable settings controller that
//! follows a project, and application configuration.

pub mod config;
pub mod controller;
pub mod error;
pub mod manager;
pub mod map_settings;
pub mod map_to_pixel;
pub mod scale;

pub use config::{Config, LoggingSettings, ViewSettings};
pub use controller::MapSettingsController;
pub use error::{ConfigError, SettingsError, SettingsResult};
pub use manager::ConfigLocation;
pub use map_settings::{read_canvas_xml, CanvasState, MapSettings, DEFAULT_DPI};
pub use map_to_pixel::MapToPixel;
pub use scale::ScaleCalculator;
