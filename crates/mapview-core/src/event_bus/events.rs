//! Event type definitions for the event bus.
//!
//! Two families exist: notifications a project raises for its observers,
//! and the per-property change notifications of a map settings controller.

use std::fmt;
use std::sync::Arc;

use crate::dom::XmlDocument;

/// An event that can travel over an [`super::EventBus`].
pub trait BusEvent: Clone + fmt::Debug + 'static {
    /// Discriminant used by [`super::EventFilter`].
    type Kind: Copy + PartialEq + fmt::Debug;

    /// The kind of this event
    fn kind(&self) -> Self::Kind;
}

/// Notifications raised by a project
#[derive(Debug, Clone)]
pub enum ProjectEvent {
    /// A project document has been read; carries the parsed DOM.
    ReadProject(Arc<XmlDocument>),
    /// The project CRS changed.
    CrsChanged,
    /// Layers were registered (ids).
    LayersAdded(Vec<String>),
    /// Layers were removed from the registry (ids).
    LayersRemoved(Vec<String>),
    /// The project was reset to an empty state.
    Cleared,
}

/// Kinds of [`ProjectEvent`] for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectEventKind {
    /// [`ProjectEvent::ReadProject`]
    ReadProject,
    /// [`ProjectEvent::CrsChanged`]
    CrsChanged,
    /// [`ProjectEvent::LayersAdded`]
    LayersAdded,
    /// [`ProjectEvent::LayersRemoved`]
    LayersRemoved,
    /// [`ProjectEvent::Cleared`]
    Cleared,
}

impl BusEvent for ProjectEvent {
    type Kind = ProjectEventKind;

    fn kind(&self) -> ProjectEventKind {
        match self {
            ProjectEvent::ReadProject(_) => ProjectEventKind::ReadProject,
            ProjectEvent::CrsChanged => ProjectEventKind::CrsChanged,
            ProjectEvent::LayersAdded(_) => ProjectEventKind::LayersAdded,
            ProjectEvent::LayersRemoved(_) => ProjectEventKind::LayersRemoved,
            ProjectEvent::Cleared => ProjectEventKind::Cleared,
        }
    }
}

impl fmt::Display for ProjectEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectEvent::ReadProject(doc) => write!(f, "Project read (<{}>)", doc.root().name),
            ProjectEvent::CrsChanged => write!(f, "Project CRS changed"),
            ProjectEvent::LayersAdded(ids) => write!(f, "Layers added: {}", ids.join(", ")),
            ProjectEvent::LayersRemoved(ids) => write!(f, "Layers removed: {}", ids.join(", ")),
            ProjectEvent::Cleared => write!(f, "Project cleared"),
        }
    }
}

/// Change notifications of a map settings controller.
///
/// One variant per bindable property. `center` shares
/// [`MapSettingsEvent::ExtentChanged`]; the three temporal properties share
/// [`MapSettingsEvent::TemporalStateChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapSettingsEvent {
    ProjectChanged,
    ExtentChanged,
    DestinationCrsChanged,
    MapUnitsPerPixelChanged,
    MapUnitsPerPointChanged,
    RotationChanged,
    BackgroundColorChanged,
    VisibleExtentChanged,
    OutputSizeChanged,
    OutputDpiChanged,
    LayersChanged,
    TemporalStateChanged,
    DevicePixelRatioChanged,
}

impl BusEvent for MapSettingsEvent {
    type Kind = MapSettingsEvent;

    fn kind(&self) -> MapSettingsEvent {
        *self
    }
}

impl fmt::Display for MapSettingsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MapSettingsEvent::ProjectChanged => "projectChanged",
            MapSettingsEvent::ExtentChanged => "extentChanged",
            MapSettingsEvent::DestinationCrsChanged => "destinationCrsChanged",
            MapSettingsEvent::MapUnitsPerPixelChanged => "mapUnitsPerPixelChanged",
            MapSettingsEvent::MapUnitsPerPointChanged => "mapUnitsPerPointChanged",
            MapSettingsEvent::RotationChanged => "rotationChanged",
            MapSettingsEvent::BackgroundColorChanged => "backgroundColorChanged",
            MapSettingsEvent::VisibleExtentChanged => "visibleExtentChanged",
            MapSettingsEvent::OutputSizeChanged => "outputSizeChanged",
            MapSettingsEvent::OutputDpiChanged => "outputDpiChanged",
            MapSettingsEvent::LayersChanged => "layersChanged",
            MapSettingsEvent::TemporalStateChanged => "temporalStateChanged",
            MapSettingsEvent::DevicePixelRatioChanged => "devicePixelRatioChanged",
        };
        f.write_str(name)
    }
}
