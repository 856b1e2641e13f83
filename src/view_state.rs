//! Serializable snapshot of a map view

use chrono::{DateTime, Utc};
use serde::Serialize;

use mapview_core::{Color, Rectangle, Size};
use mapview_settings::MapSettingsController;

/// One layer as listed in a [`ViewState`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub crs: String,
}

/// Everything a map view currently shows, in printable form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub project: Option<String>,
    pub extent: Rectangle,
    pub visible_extent: Rectangle,
    pub destination_crs: String,
    pub rotation: f64,
    pub map_units_per_pixel: f64,
    pub map_units_per_point: f64,
    pub scale: f64,
    pub output_size: Size,
    pub output_dpi: f64,
    pub device_pixel_ratio: f64,
    pub background_color: Color,
    pub layers: Vec<LayerSummary>,
    pub is_temporal: bool,
    pub temporal_begin: Option<DateTime<Utc>>,
    pub temporal_end: Option<DateTime<Utc>>,
}

impl ViewState {
    pub fn capture(controller: &MapSettingsController) -> Self {
        Self {
            project: controller.project().map(|p| p.title()),
            extent: controller.extent(),
            visible_extent: controller.visible_extent(),
            destination_crs: controller.destination_crs().auth_id().to_string(),
            rotation: controller.rotation(),
            map_units_per_pixel: controller.map_units_per_pixel(),
            map_units_per_point: controller.map_units_per_point(),
            scale: controller.scale(),
            output_size: controller.output_size(),
            output_dpi: controller.output_dpi(),
            device_pixel_ratio: controller.device_pixel_ratio(),
            background_color: controller.background_color(),
            layers: controller
                .layers()
                .iter()
                .map(|layer| LayerSummary {
                    id: layer.id.clone(),
                    name: layer.name.clone(),
                    kind: layer.kind.to_string(),
                    crs: layer.crs.auth_id().to_string(),
                })
                .collect(),
            is_temporal: controller.is_temporal(),
            temporal_begin: controller.temporal_begin(),
            temporal_end: controller.temporal_end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_unattached_controller() {
        let controller = MapSettingsController::new();
        controller.set_output_size(Size::new(100, 50));
        controller.set_extent(Rectangle::new(0.0, 0.0, 10.0, 10.0));

        let state = ViewState::capture(&controller);
        assert!(state.project.is_none());
        assert_eq!(state.output_size, Size::new(100, 50));
        assert_eq!(state.map_units_per_pixel, 0.2);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["background_color"], "#ffffff");
        assert_eq!(json["output_size"]["width"], 100);
    }
}
