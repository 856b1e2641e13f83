//! The project object map views attach to.
//!
//! A project owns the layer registry, the project CRS, the transform
//! context and the property entries. Observers learn about changes through
//! [`Project::signals`]; in particular every successful [`Project::read_str`]
//! ends with a [`ProjectEvent::ReadProject`] carrying the parsed document.
//!
//! Projects are single-threaded and are shared as `Rc<Project>`. Observers
//! that must not keep the project alive hold a `Weak<Project>`.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mapview_core::event_bus::{EventBus, ProjectEvent};
use mapview_core::{CoordinateReferenceSystem, Result, TransformContext, XmlDocument};

use crate::entries::ProjectEntries;
use crate::layer::MapLayer;

#[derive(Debug, Default)]
struct ProjectState {
    file_name: Option<PathBuf>,
    title: String,
    crs: CoordinateReferenceSystem,
    transform_context: TransformContext,
    layers: Vec<Arc<MapLayer>>,
    entries: ProjectEntries,
}

/// A map project.
#[derive(Debug, Default)]
pub struct Project {
    state: RefCell<ProjectState>,
    signals: EventBus<ProjectEvent>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications raised by this project.
    pub fn signals(&self) -> &EventBus<ProjectEvent> {
        &self.signals
    }

    /// Read a project file from disk.
    ///
    /// The file name is already set when the load notifications go out.
    pub fn read(&self, path: &Path) -> Result<()> {
        let xml = std::fs::read_to_string(path)?;
        self.read_document(&xml, Some(path.to_path_buf()))
    }

    /// Replace the project contents with the given project document.
    ///
    /// The document is parsed completely before anything is replaced, so a
    /// malformed document leaves the project untouched and raises no
    /// notification. The project has no file name afterwards.
    pub fn read_str(&self, xml: &str) -> Result<()> {
        self.read_document(xml, None)
    }

    fn read_document(&self, xml: &str, file_name: Option<PathBuf>) -> Result<()> {
        let document = Arc::new(XmlDocument::parse(xml)?);
        let root = document.root();

        let title = root
            .child_text("title")
            .filter(|t| !t.is_empty())
            .or_else(|| root.attribute("projectname"))
            .unwrap_or_default()
            .to_string();
        let crs = root
            .first_child("projectCrs")
            .and_then(CoordinateReferenceSystem::from_xml)
            .unwrap_or_default();
        let mut layers: Vec<Arc<MapLayer>> = Vec::new();
        for element in root.elements_by_tag_name("maplayer") {
            match MapLayer::from_xml(element) {
                Some(layer) if layers.iter().any(|l| l.id == layer.id) => {
                    tracing::warn!("Duplicate layer id '{}' ignored", layer.id);
                }
                Some(layer) => layers.push(Arc::new(layer)),
                None => tracing::warn!("Skipping <maplayer> without an id"),
            }
        }
        let entries = root
            .first_child("properties")
            .map(ProjectEntries::from_xml)
            .unwrap_or_default();

        let (removed, crs_changed) = {
            let mut state = self.state.borrow_mut();
            let removed: Vec<String> = state.layers.iter().map(|l| l.id.clone()).collect();
            let crs_changed = state.crs != crs;
            state.file_name = file_name;
            state.title = title;
            state.crs = crs;
            state.layers = layers;
            state.entries = entries;
            state.transform_context = TransformContext::new();
            (removed, crs_changed)
        };

        let added = self.layer_ids();
        tracing::info!(
            "Read project '{}' ({} layers, CRS {})",
            self.title(),
            added.len(),
            self.crs()
        );

        if !removed.is_empty() {
            self.signals.publish(ProjectEvent::LayersRemoved(removed));
        }
        if !added.is_empty() {
            self.signals.publish(ProjectEvent::LayersAdded(added));
        }
        if crs_changed {
            self.signals.publish(ProjectEvent::CrsChanged);
        }
        self.signals.publish(ProjectEvent::ReadProject(document));
        Ok(())
    }

    /// Reset to an empty project.
    pub fn clear(&self) {
        let crs_changed = {
            let mut state = self.state.borrow_mut();
            let crs_changed = state.crs.is_valid();
            *state = ProjectState::default();
            crs_changed
        };
        if crs_changed {
            self.signals.publish(ProjectEvent::CrsChanged);
        }
        self.signals.publish(ProjectEvent::Cleared);
    }

    pub fn file_name(&self) -> Option<PathBuf> {
        self.state.borrow().file_name.clone()
    }

    pub fn title(&self) -> String {
        self.state.borrow().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state.borrow_mut().title = title.into();
    }

    /// The project CRS.
    pub fn crs(&self) -> CoordinateReferenceSystem {
        self.state.borrow().crs.clone()
    }

    /// Change the project CRS. Notifies only when the CRS differs.
    pub fn set_crs(&self, crs: CoordinateReferenceSystem) {
        {
            let mut state = self.state.borrow_mut();
            if state.crs == crs {
                return;
            }
            state.crs = crs;
        }
        self.signals.publish(ProjectEvent::CrsChanged);
    }

    pub fn transform_context(&self) -> TransformContext {
        self.state.borrow().transform_context.clone()
    }

    pub fn set_transform_context(&self, context: TransformContext) {
        self.state.borrow_mut().transform_context = context;
    }

    /// Register layers. Layers whose id is already registered are skipped.
    ///
    /// Returns the layers that were added.
    pub fn add_map_layers(&self, layers: Vec<MapLayer>) -> Vec<Arc<MapLayer>> {
        let added: Vec<Arc<MapLayer>> = {
            let mut state = self.state.borrow_mut();
            let mut added = Vec::new();
            for layer in layers {
                if state.layers.iter().any(|l| l.id == layer.id) {
                    tracing::warn!("Layer '{}' is already registered", layer.id);
                    continue;
                }
                let layer = Arc::new(layer);
                state.layers.push(layer.clone());
                added.push(layer);
            }
            added
        };
        if !added.is_empty() {
            self.signals.publish(ProjectEvent::LayersAdded(
                added.iter().map(|l| l.id.clone()).collect(),
            ));
        }
        added
    }

    /// Register a single layer. `None` if the id was already taken.
    pub fn add_map_layer(&self, layer: MapLayer) -> Option<Arc<MapLayer>> {
        self.add_map_layers(vec![layer]).into_iter().next()
    }

    /// Remove a layer from the registry.
    pub fn remove_map_layer(&self, id: &str) -> Option<Arc<MapLayer>> {
        let removed = {
            let mut state = self.state.borrow_mut();
            let index = state.layers.iter().position(|l| l.id == id)?;
            state.layers.remove(index)
        };
        self.signals
            .publish(ProjectEvent::LayersRemoved(vec![removed.id.clone()]));
        Some(removed)
    }

    pub fn map_layer(&self, id: &str) -> Option<Arc<MapLayer>> {
        self.state
            .borrow()
            .layers
            .iter()
            .find(|l| l.id == id)
            .cloned()
    }

    /// Registered layers, in registration order.
    pub fn map_layers(&self) -> Vec<Arc<MapLayer>> {
        self.state.borrow().layers.clone()
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.state.borrow().layers.iter().map(|l| l.id.clone()).collect()
    }

    pub fn read_entry(&self, scope: &str, key: &str) -> Option<String> {
        self.state
            .borrow()
            .entries
            .read_entry(scope, key)
            .map(str::to_string)
    }

    pub fn read_num_entry(&self, scope: &str, key: &str, default: i64) -> i64 {
        self.state.borrow().entries.read_num_entry(scope, key, default)
    }

    pub fn read_double_entry(&self, scope: &str, key: &str, default: f64) -> f64 {
        self.state.borrow().entries.read_double_entry(scope, key, default)
    }

    pub fn read_bool_entry(&self, scope: &str, key: &str, default: bool) -> bool {
        self.state.borrow().entries.read_bool_entry(scope, key, default)
    }

    pub fn write_entry(&self, scope: &str, key: &str, value: impl ToString) {
        self.state.borrow_mut().entries.write_entry(scope, key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{GeometryType, LayerKind};
    use mapview_core::event_bus::{BusEvent, EventFilter, ProjectEventKind};
    use mapview_core::Rectangle;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(project: &Project) -> Rc<RefCell<Vec<ProjectEventKind>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        project
            .signals()
            .subscribe(EventFilter::All, move |e| sink.borrow_mut().push(e.kind()));
        log
    }

    fn layer(id: &str) -> MapLayer {
        MapLayer::new(
            id,
            id,
            LayerKind::Vector(GeometryType::Point),
            CoordinateReferenceSystem::from_auth_id("EPSG:4326"),
            Rectangle::new(0.0, 0.0, 1.0, 1.0),
        )
    }

    #[test]
    fn test_set_crs_notifies_only_on_change() {
        let project = Project::new();
        let log = record(&project);

        project.set_crs(CoordinateReferenceSystem::from_auth_id("EPSG:3857"));
        project.set_crs(CoordinateReferenceSystem::from_auth_id("EPSG:3857"));

        assert_eq!(*log.borrow(), vec![ProjectEventKind::CrsChanged]);
        assert_eq!(project.crs().auth_id(), "EPSG:3857");
    }

    #[test]
    fn test_layer_registry() {
        let project = Project::new();
        let log = record(&project);

        assert!(project.add_map_layer(layer("a")).is_some());
        assert!(project.add_map_layer(layer("a")).is_none());
        project.add_map_layers(vec![layer("b"), layer("c")]);
        assert_eq!(project.layer_ids(), vec!["a", "b", "c"]);

        assert_eq!(project.remove_map_layer("b").map(|l| l.id.clone()), Some("b".into()));
        assert!(project.remove_map_layer("b").is_none());
        assert!(project.map_layer("c").is_some());

        assert_eq!(
            *log.borrow(),
            vec![
                ProjectEventKind::LayersAdded,
                ProjectEventKind::LayersAdded,
                ProjectEventKind::LayersRemoved
            ]
        );
    }

    #[test]
    fn test_malformed_document_leaves_project_untouched() {
        let project = Project::new();
        project.set_crs(CoordinateReferenceSystem::from_auth_id("EPSG:3857"));
        let log = record(&project);

        assert!(project.read_str("<qgis><projectCrs></qgis>").is_err());
        assert!(log.borrow().is_empty());
        assert_eq!(project.crs().auth_id(), "EPSG:3857");
    }

    #[test]
    fn test_clear() {
        let project = Project::new();
        project.set_crs(CoordinateReferenceSystem::from_auth_id("EPSG:3857"));
        project.add_map_layer(layer("a"));
        let log = record(&project);

        project.clear();
        assert!(project.map_layers().is_empty());
        assert!(!project.crs().is_valid());
        assert_eq!(
            *log.borrow(),
            vec![ProjectEventKind::CrsChanged, ProjectEventKind::Cleared]
        );
    }
}
