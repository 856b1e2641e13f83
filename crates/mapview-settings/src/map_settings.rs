//! Map settings value object
//!
//! Holds everything needed to place a map on an output device: the
//! requested extent, destination CRS, rotation, output size and DPI, the
//! layers to draw and the temporal filter. Derived values (visible extent,
//! map units per pixel, scale, map-to-pixel transform) are recomputed on
//! demand from these fields.

use std::sync::Arc;

use mapview_core::dom::XmlElement;
use mapview_core::{
    Color, CoordinateReferenceSystem, CoordinateTransform, DateTimeRange, Rectangle, Size,
    TransformContext, TransformError,
};
use mapview_project::{read_rectangle, MapLayer};

use crate::error::{SettingsError, SettingsResult};
use crate::map_to_pixel::MapToPixel;
use crate::scale::ScaleCalculator;

/// Default output resolution in dots per inch
pub const DEFAULT_DPI: f64 = 96.0;

/// Settings describing how a map is rendered.
#[derive(Debug, Clone)]
pub struct MapSettings {
    extent: Rectangle,
    destination_crs: CoordinateReferenceSystem,
    rotation: f64,
    background_color: Color,
    output_size: Size,
    output_dpi: f64,
    layers: Vec<Arc<MapLayer>>,
    is_temporal: bool,
    temporal_range: DateTimeRange,
    transform_context: TransformContext,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            extent: Rectangle::null(),
            destination_crs: CoordinateReferenceSystem::invalid(),
            rotation: 0.0,
            background_color: Color::WHITE,
            output_size: Size::default(),
            output_dpi: DEFAULT_DPI,
            layers: Vec::new(),
            is_temporal: false,
            temporal_range: DateTimeRange::default(),
            transform_context: TransformContext::new(),
        }
    }
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The requested extent, in destination CRS units.
    pub fn extent(&self) -> Rectangle {
        self.extent
    }

    pub fn set_extent(&mut self, extent: Rectangle) {
        self.extent = extent;
    }

    pub fn destination_crs(&self) -> &CoordinateReferenceSystem {
        &self.destination_crs
    }

    pub fn set_destination_crs(&mut self, crs: CoordinateReferenceSystem) {
        self.destination_crs = crs;
    }

    /// Rotation in degrees, clockwise.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = degrees;
    }

    pub fn background_color(&self) -> Color {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.background_color = color;
    }

    /// Output size in physical pixels.
    pub fn output_size(&self) -> Size {
        self.output_size
    }

    pub fn set_output_size(&mut self, size: Size) {
        self.output_size = size;
    }

    pub fn output_dpi(&self) -> f64 {
        self.output_dpi
    }

    pub fn set_output_dpi(&mut self, dpi: f64) {
        self.output_dpi = dpi;
    }

    /// Layers to render. Index 0 is drawn on top.
    pub fn layers(&self) -> &[Arc<MapLayer>] {
        &self.layers
    }

    pub fn set_layers(&mut self, layers: Vec<Arc<MapLayer>>) {
        self.layers = layers;
    }

    pub fn is_temporal(&self) -> bool {
        self.is_temporal
    }

    pub fn set_is_temporal(&mut self, temporal: bool) {
        self.is_temporal = temporal;
    }

    pub fn temporal_range(&self) -> DateTimeRange {
        self.temporal_range
    }

    pub fn set_temporal_range(&mut self, range: DateTimeRange) {
        self.temporal_range = range;
    }

    pub fn transform_context(&self) -> &TransformContext {
        &self.transform_context
    }

    pub fn set_transform_context(&mut self, context: TransformContext) {
        self.transform_context = context;
    }

    /// Whether the derived values are meaningful: a non-empty output, a
    /// non-empty finite extent, a positive DPI and a finite rotation.
    pub fn has_valid_settings(&self) -> bool {
        !self.output_size.is_empty()
            && self.extent.is_finite()
            && !self.extent.is_empty()
            && self.output_dpi > 0.0
            && self.rotation.is_finite()
    }

    /// Map units per output pixel. 1.0 when the settings are not valid.
    pub fn map_units_per_pixel(&self) -> f64 {
        if !self.has_valid_settings() {
            return 1.0;
        }
        let x = self.extent.width() / self.output_size.width as f64;
        let y = self.extent.height() / self.output_size.height as f64;
        x.max(y)
    }

    /// The extent actually shown on the output.
    ///
    /// The requested extent grown along its short axis so it matches the
    /// output aspect ratio. With a rotation this is the bounding box of the
    /// rotated viewport. Invalid settings return the requested extent.
    pub fn visible_extent(&self) -> Rectangle {
        match self.map_to_pixel() {
            Ok(m2p) if self.rotation == 0.0 => self.unrotated_visible_extent(m2p.map_units_per_pixel()),
            Ok(m2p) => Rectangle::bounding(m2p.viewport_corners()).unwrap_or(self.extent),
            Err(_) => self.extent,
        }
    }

    fn unrotated_visible_extent(&self, mupp: f64) -> Rectangle {
        Rectangle::from_center(
            self.extent.center(),
            mupp * self.output_size.width as f64,
            mupp * self.output_size.height as f64,
        )
    }

    /// Scale denominator of the current view. 0 when not valid.
    pub fn scale(&self) -> f64 {
        if !self.has_valid_settings() {
            return 0.0;
        }
        ScaleCalculator::new(self.output_dpi, self.destination_crs.map_units())
            .calculate(&self.visible_extent(), self.output_size.width as f64)
    }

    /// The map ↔ pixel transform for these settings.
    pub fn map_to_pixel(&self) -> SettingsResult<MapToPixel> {
        if !self.has_valid_settings() {
            return Err(SettingsError::InvalidSettings(format!(
                "extent {} on a {} output at {} dpi",
                self.extent, self.output_size, self.output_dpi
            )));
        }
        Ok(MapToPixel::new(
            self.map_units_per_pixel(),
            self.extent.center(),
            self.output_size.width as f64,
            self.output_size.height as f64,
            self.rotation,
        ))
    }

    /// Transform from a layer's CRS into the destination CRS.
    pub fn layer_transform(&self, layer: &MapLayer) -> Result<CoordinateTransform, TransformError> {
        CoordinateTransform::new(&layer.crs, &self.destination_crs, &self.transform_context)
    }

    /// A rectangle in layer coordinates, expressed in destination CRS units.
    pub fn layer_to_map_coordinates(
        &self,
        layer: &MapLayer,
        rect: &Rectangle,
    ) -> Result<Rectangle, TransformError> {
        self.layer_transform(layer)?.transform_bounding_box(rect)
    }

    /// Union of all layer extents in destination CRS units.
    ///
    /// Layers whose extent cannot be transformed are left out.
    pub fn full_extent(&self) -> Rectangle {
        self.layers
            .iter()
            .filter(|layer| !layer.extent.is_null())
            .filter_map(|layer| match self.layer_to_map_coordinates(layer, &layer.extent) {
                Ok(rect) => Some(rect),
                Err(e) => {
                    tracing::warn!("Leaving layer '{}' out of the full extent: {}", layer.id, e);
                    None
                }
            })
            .fold(Rectangle::null(), |acc, rect| acc.combine(&rect))
    }
}

/// View state stored in a project's `<mapcanvas>` element.
///
/// Every field is optional; a missing or malformed field is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasState {
    pub extent: Option<Rectangle>,
    pub destination_crs: Option<CoordinateReferenceSystem>,
    pub rotation: Option<f64>,
    pub output_size: Option<Size>,
    pub output_dpi: Option<f64>,
}

/// Read the view state from a `<mapcanvas>` element.
pub fn read_canvas_xml(canvas: &XmlElement) -> CanvasState {
    let extent = canvas.first_child("extent").and_then(|e| {
        let rect = read_rectangle(e).filter(Rectangle::is_finite);
        if rect.is_none() {
            tracing::warn!("Ignoring malformed <extent> in map canvas");
        }
        rect
    });

    let destination_crs = canvas
        .first_child("destinationsrs")
        .and_then(CoordinateReferenceSystem::from_xml);

    let rotation = canvas.child_text("rotation").and_then(|text| {
        let value = text.parse::<f64>().ok().filter(|v| v.is_finite());
        if value.is_none() {
            tracing::warn!("Ignoring malformed <rotation> '{}' in map canvas", text);
        }
        value
    });

    let output_size = canvas.first_child("outputsize").and_then(|e| {
        let dimension = |name: &str| e.attribute(name)?.trim().parse::<u32>().ok();
        let size = dimension("width")
            .zip(dimension("height"))
            .map(|(width, height)| Size::new(width, height));
        if size.is_none() {
            tracing::warn!("Ignoring malformed <outputsize> in map canvas");
        }
        size
    });

    let output_dpi = canvas.child_text("outputdpi").and_then(|text| {
        let value = text.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0);
        if value.is_none() {
            tracing::warn!("Ignoring malformed <outputdpi> '{}' in map canvas", text);
        }
        value
    });

    CanvasState {
        extent,
        destination_crs,
        rotation,
        output_size,
        output_dpi,
    }
}
