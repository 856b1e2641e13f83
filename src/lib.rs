//! # MapView
//!
//! Observable map view settings for declarative GIS front-ends.
//!
//! ## Architecture
//!
//! MapView is organized as a workspace with multiple crates:
//!
//! 1. **mapview-core** - Geometry, CRS, coordinate transforms, temporal ranges, XML DOM, events
//! 2. **mapview-project** - Project object: layers, project CRS, property entries, document loading
//! 3. **mapview-settings** - Map settings value, settings controller, configuration
//! 4. **mapview** - This crate: re-exports, logging setup and the `mapview` binary
//!
//! ## Features
//!
//! - **Project following**: a controller attached to a project picks up the
//!   stored extent, CRS, output size, DPI, background and temporal state
//! - **Change notification**: every property raises its own event, only on change
//! - **Screen conversion**: map ↔ screen coordinates with device pixel ratio support

pub mod view_state;

pub use mapview_core::{
    Color, CoordinateReferenceSystem, CoordinateTransform, DateTimeRange, DistanceUnit, Error,
    EventBus, EventFilter, MapSettingsEvent, Point, ProjectEvent, Rectangle, Result, ScreenPoint,
    Size, TransformContext, TransformError,
};
pub use mapview_project::{GeometryType, LayerKind, MapLayer, Project};
pub use mapview_settings::{
    Config, ConfigLocation, LoggingSettings, MapSettings, MapSettingsController, MapToPixel,
    SettingsError, ViewSettings,
};
pub use view_state::ViewState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr, so stdout stays free for command output
/// - RUST_LOG environment variable support, falling back to the configured level
/// - Optional JSON lines instead of human readable output
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;

    if settings.json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
