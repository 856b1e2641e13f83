//! Map Settings Controller
//!
//! Exposes a [`MapSettings`] value as a set of observable properties for a
//! UI layer. Every setter forwards to the settings value and raises its
//! [`MapSettingsEvent`] only when the value actually changed. Attached to a
//! [`Project`], the controller follows the project's document loads and CRS
//! changes.
//!
//! The controller never owns the project. It keeps a `Weak` reference and
//! drops its subscriptions when reattached or dropped; once the caller drops
//! the project, the controller simply stops following it.

use std::cell::Ref;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mapview_core::event_bus::{
    EventBus, EventFilter, MapSettingsEvent, ProjectEvent, ProjectEventKind, SubscriptionId,
};
use mapview_core::temporal::parse_datetime;
use mapview_core::types::{shared, Shared, WeakShared};
use mapview_core::{
    Color, CoordinateReferenceSystem, CoordinateTransform, DateTimeRange, Point, Rectangle,
    ScreenPoint, Size, TransformContext, TransformError, XmlDocument,
};
use mapview_project::{MapLayer, Project};

use crate::error::SettingsResult;
use crate::map_settings::{read_canvas_xml, MapSettings};

/// Name of the canvas element holding the main view in a project document
const MAIN_CANVAS: &str = "theMapCanvas";

/// Notifications collected while state is borrowed, raised afterwards.
#[derive(Debug, Default)]
struct PendingSignals(Vec<MapSettingsEvent>);

impl PendingSignals {
    fn push(&mut self, event: MapSettingsEvent) {
        if !self.0.contains(&event) {
            self.0.push(event);
        }
    }

    /// Signals of the values derived from extent, size, DPI, CRS and rotation.
    fn push_derived(&mut self) {
        self.push(MapSettingsEvent::VisibleExtentChanged);
        self.push(MapSettingsEvent::MapUnitsPerPixelChanged);
        self.push(MapSettingsEvent::MapUnitsPerPointChanged);
    }
}

struct ControllerState {
    project: Option<Weak<Project>>,
    subscriptions: Vec<SubscriptionId>,
    settings: MapSettings,
    device_pixel_ratio: f64,
}

impl ControllerState {
    fn project(&self) -> Option<Rc<Project>> {
        self.project.as_ref().and_then(Weak::upgrade)
    }

    fn apply_extent(&mut self, extent: Rectangle, signals: &mut PendingSignals) {
        if self.settings.extent() != extent {
            self.settings.set_extent(extent);
            signals.push(MapSettingsEvent::ExtentChanged);
            signals.push_derived();
        }
    }

    fn apply_destination_crs(&mut self, crs: CoordinateReferenceSystem, signals: &mut PendingSignals) {
        if *self.settings.destination_crs() != crs {
            self.settings.set_destination_crs(crs);
            signals.push(MapSettingsEvent::DestinationCrsChanged);
            signals.push_derived();
        }
    }

    fn apply_rotation(&mut self, degrees: f64, signals: &mut PendingSignals) {
        if self.settings.rotation() != degrees {
            self.settings.set_rotation(degrees);
            signals.push(MapSettingsEvent::RotationChanged);
            signals.push_derived();
        }
    }

    fn apply_output_size(&mut self, size: Size, signals: &mut PendingSignals) {
        if self.settings.output_size() != size {
            self.settings.set_output_size(size);
            signals.push(MapSettingsEvent::OutputSizeChanged);
            signals.push_derived();
        }
    }

    fn apply_output_dpi(&mut self, dpi: f64, signals: &mut PendingSignals) {
        if self.settings.output_dpi() != dpi {
            self.settings.set_output_dpi(dpi);
            signals.push(MapSettingsEvent::OutputDpiChanged);
            signals.push_derived();
        }
    }

    fn apply_background_color(&mut self, color: Color, signals: &mut PendingSignals) {
        if self.settings.background_color() != color {
            self.settings.set_background_color(color);
            signals.push(MapSettingsEvent::BackgroundColorChanged);
        }
    }

    fn apply_temporal(&mut self, temporal: bool, range: DateTimeRange, signals: &mut PendingSignals) {
        if self.settings.is_temporal() != temporal || self.settings.temporal_range() != range {
            self.settings.set_is_temporal(temporal);
            self.settings.set_temporal_range(range);
            signals.push(MapSettingsEvent::TemporalStateChanged);
        }
    }

    fn detach(&mut self) {
        let subscriptions = std::mem::take(&mut self.subscriptions);
        if let Some(project) = self.project() {
            for id in subscriptions {
                project.signals().unsubscribe(id);
            }
            tracing::debug!("Detached map settings from project '{}'", project.title());
        }
        self.project = None;
    }
}

impl Drop for ControllerState {
    fn drop(&mut self) {
        self.detach();
    }
}

fn same_layers(a: &[Arc<MapLayer>], b: &[Arc<MapLayer>]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| Arc::ptr_eq(x, y) || x.id == y.id)
}

/// Observable map settings bound to an optional project.
///
/// Clones are handles to the same controller.
#[derive(Clone)]
pub struct MapSettingsController {
    state: Shared<ControllerState>,
    signals: Rc<EventBus<MapSettingsEvent>>,
}

impl Default for MapSettingsController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MapSettingsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MapSettingsController")
            .field("attached", &state.project().is_some())
            .field("settings", &state.settings)
            .field("device_pixel_ratio", &state.device_pixel_ratio)
            .finish()
    }
}

impl MapSettingsController {
    /// Create an unattached controller with default settings
    pub fn new() -> Self {
        Self::with_settings(MapSettings::default())
    }

    /// Create an unattached controller starting from `settings`
    pub fn with_settings(settings: MapSettings) -> Self {
        Self {
            state: shared(ControllerState {
                project: None,
                subscriptions: Vec::new(),
                settings,
                device_pixel_ratio: 1.0,
            }),
            signals: Rc::new(EventBus::new()),
        }
    }

    fn from_weak(
        state: &WeakShared<ControllerState>,
        signals: &Weak<EventBus<MapSettingsEvent>>,
    ) -> Option<Self> {
        Some(Self {
            state: state.upgrade()?,
            signals: signals.upgrade()?,
        })
    }

    /// Notifications raised by this controller
    pub fn signals(&self) -> &EventBus<MapSettingsEvent> {
        &self.signals
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut ControllerState, &mut PendingSignals),
    {
        let mut pending = PendingSignals::default();
        {
            let mut state = self.state.borrow_mut();
            apply(&mut state, &mut pending);
        }
        self.emit(pending);
    }

    fn emit(&self, pending: PendingSignals) {
        for event in pending.0 {
            self.signals.publish(event);
        }
    }

    fn settings(&self) -> Ref<'_, MapSettings> {
        Ref::map(self.state.borrow(), |state| &state.settings)
    }

    /// The attached project, if it is still alive
    pub fn project(&self) -> Option<Rc<Project>> {
        self.state.borrow().project()
    }

    /// Attach to `project`, or detach with `None`.
    ///
    /// The controller holds only a weak reference; keeping the project alive
    /// is the caller's job. Attaching adopts the project's CRS and transform
    /// context and follows its document loads and CRS changes from then on.
    /// Passing the currently attached project again does nothing.
    pub fn set_project(&self, project: Option<&Rc<Project>>) {
        let current = self.project();
        let unchanged = match (&current, project) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => self.state.borrow().project.is_none(),
            _ => false,
        };
        if unchanged {
            return;
        }

        self.state.borrow_mut().detach();

        match project {
            Some(project) => {
                let state = Rc::downgrade(&self.state);
                let signals = Rc::downgrade(&self.signals);
                let id = project.signals().subscribe(
                    EventFilter::Kinds(vec![ProjectEventKind::ReadProject, ProjectEventKind::CrsChanged]),
                    move |event| {
                        let Some(controller) = Self::from_weak(&state, &signals) else {
                            return;
                        };
                        match event {
                            ProjectEvent::ReadProject(document) => controller.on_read_project(document),
                            ProjectEvent::CrsChanged => controller.on_crs_changed(),
                            _ => {}
                        }
                    },
                );
                {
                    let mut state = self.state.borrow_mut();
                    state.project = Some(Rc::downgrade(project));
                    state.subscriptions.push(id);
                }
                tracing::debug!("Attached map settings to project '{}'", project.title());

                self.set_destination_crs(project.crs());
                self.set_transform_context(project.transform_context());
            }
            None => self.set_transform_context(TransformContext::new()),
        }

        self.signals.publish(MapSettingsEvent::ProjectChanged);
    }

    /// Apply the view state stored in a freshly loaded project document.
    fn on_read_project(&self, document: &XmlDocument) {
        let Some(project) = self.project() else {
            return;
        };

        let background = Color::from_channels(
            project.read_num_entry("Gui", "/CanvasColorRedPart", 255),
            project.read_num_entry("Gui", "/CanvasColorGreenPart", 255),
            project.read_num_entry("Gui", "/CanvasColorBluePart", 255),
        );
        let temporal = project.read_num_entry("TemporalControllerWidget", "/NavigationMode", 0) != 0;
        let range = DateTimeRange::new(
            project
                .read_entry("TemporalControllerWidget", "/StartDateTime")
                .and_then(|s| parse_datetime(&s)),
            project
                .read_entry("TemporalControllerWidget", "/EndDateTime")
                .and_then(|s| parse_datetime(&s)),
        );
        let canvas = document
            .elements_by_tag_name("mapcanvas")
            .into_iter()
            .find(|e| e.attribute("name") == Some(MAIN_CANVAS))
            .map(read_canvas_xml);
        let project_crs = project.crs();
        let transform_context = project.transform_context();

        tracing::debug!(
            "Applying project state (canvas: {}, temporal: {})",
            canvas.is_some(),
            temporal
        );

        self.update(|state, signals| {
            state.apply_background_color(background, signals);
            state.apply_temporal(temporal, range, signals);

            match canvas {
                Some(canvas) => {
                    if let Some(extent) = canvas.extent {
                        state.apply_extent(extent, signals);
                    }
                    if let Some(crs) = canvas.destination_crs {
                        state.apply_destination_crs(crs, signals);
                    }
                    if let Some(size) = canvas.output_size {
                        state.apply_output_size(size, signals);
                    }
                    if let Some(dpi) = canvas.output_dpi {
                        state.apply_output_dpi(dpi, signals);
                    }
                    if let Some(rotation) = canvas.rotation.filter(|r| *r != 0.0) {
                        tracing::warn!(
                            "Map canvas rotation is not supported, resetting from {} to 0",
                            rotation
                        );
                    }
                }
                None => {
                    state.apply_destination_crs(project_crs, signals);
                    state.settings.set_transform_context(transform_context.clone());
                    let full = state.settings.full_extent();
                    if !full.is_null() {
                        state.apply_extent(full, signals);
                    }
                }
            }

            state.apply_rotation(0.0, signals);
            state.settings.set_transform_context(transform_context);
        });
    }

    /// Follow a CRS change of the attached project.
    fn on_crs_changed(&self) {
        if let Some(project) = self.project() {
            self.set_destination_crs(project.crs());
        }
    }

    /// The transform context used for layer → map transforms
    pub fn transform_context(&self) -> TransformContext {
        self.settings().transform_context().clone()
    }

    pub fn set_transform_context(&self, context: TransformContext) {
        self.state.borrow_mut().settings.set_transform_context(context);
    }

    /// Copy of the underlying settings value
    pub fn map_settings(&self) -> MapSettings {
        self.settings().clone()
    }

    pub fn extent(&self) -> Rectangle {
        self.settings().extent()
    }

    pub fn set_extent(&self, extent: Rectangle) {
        self.update(|state, signals| state.apply_extent(extent, signals));
    }

    /// Center of the current extent
    pub fn center(&self) -> Point {
        self.extent().center()
    }

    /// Move the extent so it is centered on `center`, keeping its size.
    pub fn set_center(&self, center: Point) {
        let extent = self.extent().centered_on(center);
        self.set_extent(extent);
    }

    /// Bring `layer` into view.
    ///
    /// With `should_zoom` the extent becomes the layer extent in destination
    /// CRS units; otherwise only the center moves to the layer's center. A
    /// layer whose extent has no area in destination units is ignored.
    /// Transform failures are returned unchanged and leave the view as it was.
    pub fn set_center_to_layer(&self, layer: &MapLayer, should_zoom: bool) -> Result<(), TransformError> {
        if layer.extent.is_null() {
            return Ok(());
        }
        let extent = self.settings().layer_to_map_coordinates(layer, &layer.extent)?;
        if extent.is_empty() {
            return Ok(());
        }

        if should_zoom {
            self.set_extent(extent);
        } else {
            self.set_center(extent.center());
        }
        Ok(())
    }

    pub fn destination_crs(&self) -> CoordinateReferenceSystem {
        self.settings().destination_crs().clone()
    }

    /// Set the CRS the map is drawn in. Invalid CRSes are stored as given.
    pub fn set_destination_crs(&self, crs: CoordinateReferenceSystem) {
        self.update(|state, signals| state.apply_destination_crs(crs, signals));
    }

    /// Rotation in degrees, clockwise
    pub fn rotation(&self) -> f64 {
        self.settings().rotation()
    }

    pub fn set_rotation(&self, degrees: f64) {
        self.update(|state, signals| state.apply_rotation(degrees, signals));
    }

    pub fn background_color(&self) -> Color {
        self.settings().background_color()
    }

    pub fn set_background_color(&self, color: Color) {
        self.update(|state, signals| state.apply_background_color(color, signals));
    }

    /// Output size in physical pixels
    pub fn output_size(&self) -> Size {
        self.settings().output_size()
    }

    /// Set the output size from device-independent pixels.
    pub fn set_output_size(&self, size: Size) {
        self.update(|state, signals| {
            let physical = size.scaled(state.device_pixel_ratio);
            state.apply_output_size(physical, signals);
        });
    }

    /// Output DPI in physical dots
    pub fn output_dpi(&self) -> f64 {
        self.settings().output_dpi()
    }

    /// Set the output DPI from a device-independent value.
    pub fn set_output_dpi(&self, dpi: f64) {
        self.update(|state, signals| {
            let physical = dpi * state.device_pixel_ratio;
            state.apply_output_dpi(physical, signals);
        });
    }

    /// Physical pixels per device-independent pixel
    pub fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        self.update(|state, signals| {
            if state.device_pixel_ratio != ratio {
                state.device_pixel_ratio = ratio;
                signals.push(MapSettingsEvent::DevicePixelRatioChanged);
                signals.push(MapSettingsEvent::MapUnitsPerPointChanged);
            }
        });
    }

    /// The extent actually shown on the output
    pub fn visible_extent(&self) -> Rectangle {
        self.settings().visible_extent()
    }

    pub fn map_units_per_pixel(&self) -> f64 {
        self.settings().map_units_per_pixel()
    }

    /// Map units per device-independent pixel
    pub fn map_units_per_point(&self) -> f64 {
        let state = self.state.borrow();
        state.settings.map_units_per_pixel() * state.device_pixel_ratio
    }

    /// Scale denominator. Changes whenever `MapUnitsPerPixelChanged` fires.
    pub fn scale(&self) -> f64 {
        self.settings().scale()
    }

    /// Layers to render, index 0 on top
    pub fn layers(&self) -> Vec<Arc<MapLayer>> {
        self.settings().layers().to_vec()
    }

    /// Set the layers to render. Layers without geometry are dropped.
    pub fn set_layers(&self, layers: Vec<Arc<MapLayer>>) {
        let layers: Vec<Arc<MapLayer>> = layers.into_iter().filter(|l| l.is_spatial()).collect();
        self.update(|state, signals| {
            if !same_layers(state.settings.layers(), &layers) {
                state.settings.set_layers(layers);
                signals.push(MapSettingsEvent::LayersChanged);
            }
        });
    }

    pub fn is_temporal(&self) -> bool {
        self.settings().is_temporal()
    }

    pub fn set_is_temporal(&self, temporal: bool) {
        self.update(|state, signals| {
            let range = state.settings.temporal_range();
            state.apply_temporal(temporal, range, signals);
        });
    }

    pub fn temporal_begin(&self) -> Option<DateTime<Utc>> {
        self.settings().temporal_range().begin
    }

    pub fn set_temporal_begin(&self, begin: Option<DateTime<Utc>>) {
        self.update(|state, signals| {
            let temporal = state.settings.is_temporal();
            let range = DateTimeRange::new(begin, state.settings.temporal_range().end);
            state.apply_temporal(temporal, range, signals);
        });
    }

    pub fn temporal_end(&self) -> Option<DateTime<Utc>> {
        self.settings().temporal_range().end
    }

    pub fn set_temporal_end(&self, end: Option<DateTime<Utc>>) {
        self.update(|state, signals| {
            let temporal = state.settings.is_temporal();
            let range = DateTimeRange::new(state.settings.temporal_range().begin, end);
            state.apply_temporal(temporal, range, signals);
        });
    }

    /// Map coordinates to device-independent screen coordinates.
    pub fn coordinate_to_screen(&self, point: Point) -> SettingsResult<ScreenPoint> {
        let state = self.state.borrow();
        let pixel = state.settings.map_to_pixel()?.transform(point);
        Ok(pixel.scaled(1.0 / state.device_pixel_ratio))
    }

    /// Device-independent screen coordinates to map coordinates.
    pub fn screen_to_coordinate(&self, point: ScreenPoint) -> SettingsResult<Point> {
        let state = self.state.borrow();
        let m2p = state.settings.map_to_pixel()?;
        Ok(m2p.to_map_coordinates(point.scaled(state.device_pixel_ratio)))
    }

    /// Reinterpret a screen point as a map point without transforming it
    pub fn to_point(&self, point: ScreenPoint) -> Point {
        Point::from(point)
    }

    /// Transform from a layer's CRS into the destination CRS
    pub fn layer_transform(&self, layer: &MapLayer) -> Result<CoordinateTransform, TransformError> {
        self.settings().layer_transform(layer)
    }
}
