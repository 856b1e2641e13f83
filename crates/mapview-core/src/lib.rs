//! # MapView Core
//!
//! Core types, traits, and utilities for MapView.
//! Provides the fundamental abstractions shared by the project and map
//! settings crates: geometry, coordinate reference systems, coordinate
//! transforms, temporal ranges, the project DOM and the event bus.

pub mod color;
pub mod crs;
pub mod dom;
pub mod error;
pub mod event_bus;
pub mod geometry;
pub mod temporal;
pub mod transform;
pub mod types;
pub mod units;

pub use color::Color;
pub use crs::CoordinateReferenceSystem;
pub use dom::{XmlDocument, XmlElement};
pub use error::{DocumentError, Error, Result, TransformError};
pub use geometry::{Point, Rectangle, ScreenPoint, Size};
pub use temporal::DateTimeRange;
pub use transform::{CoordinateOperation, CoordinateTransform, TransformContext};
pub use units::DistanceUnit;

// Re-export event bus for convenience
pub use event_bus::{
    BusEvent, EventBus, EventFilter, MapSettingsEvent, ProjectEvent,
    ProjectEventKind, SubscriptionId,
};

// Re-export type aliases for convenience
pub use types::{shared, Shared, WeakShared};
