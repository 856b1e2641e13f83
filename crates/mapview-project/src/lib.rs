//! # MapView Project
//!
//! The project a map view follows: layer registry, project CRS, transform
//! context, scoped property entries and project document loading.

pub mod entries;
pub mod layer;
pub mod project;

pub use entries::ProjectEntries;
pub use layer::{read_rectangle, GeometryType, LayerKind, MapLayer};
pub use project::Project;
