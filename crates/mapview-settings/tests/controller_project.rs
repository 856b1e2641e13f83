//! Integration tests for a settings controller following a project

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use mapview_core::event_bus::{EventFilter, MapSettingsEvent};
use mapview_core::{Color, CoordinateReferenceSystem, Point, Rectangle, Size};
use mapview_project::{GeometryType, LayerKind, MapLayer, Project};
use mapview_settings::MapSettingsController;

fn project_xml(canvas: &str) -> String {
    format!(
        r#"<qgis projectname="Sample" version="3.34.0">
  <projectCrs><spatialrefsys><authid>EPSG:3857</authid></spatialrefsys></projectCrs>
  <projectlayers>
    <maplayer type="vector" geometry="Point">
      <extent><xmin>0</xmin><ymin>0</ymin><xmax>1</xmax><ymax>1</ymax></extent>
      <id>wells_1</id>
      <srs><spatialrefsys><authid>EPSG:4326</authid></spatialrefsys></srs>
    </maplayer>
  </projectlayers>
  {canvas}
  <properties>
    <Gui>
      <CanvasColorRedPart type="int">10</CanvasColorRedPart>
      <CanvasColorGreenPart type="int">20</CanvasColorGreenPart>
      <CanvasColorBluePart type="int">30</CanvasColorBluePart>
    </Gui>
    <TemporalControllerWidget>
      <NavigationMode type="int">1</NavigationMode>
      <StartDateTime type="QString">2021-01-01T00:00:00.000</StartDateTime>
      <EndDateTime type="QString">2021-06-30T12:00:00.000</EndDateTime>
    </TemporalControllerWidget>
  </properties>
</qgis>"#
    )
}

const CANVAS: &str = r#"<mapcanvas name="theMapCanvas">
    <units>degrees</units>
    <extent><xmin>0</xmin><ymin>0</ymin><xmax>100</xmax><ymax>100</ymax></extent>
    <rotation>0</rotation>
    <destinationsrs><spatialrefsys><authid>EPSG:4326</authid></spatialrefsys></destinationsrs>
    <outputsize width="800" height="600"/>
    <outputdpi>120</outputdpi>
  </mapcanvas>"#;

fn record(controller: &MapSettingsController) -> Rc<RefCell<Vec<MapSettingsEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    controller
        .signals()
        .subscribe(EventFilter::All, move |e: &MapSettingsEvent| sink.borrow_mut().push(*e));
    log
}

fn count(log: &[MapSettingsEvent], event: MapSettingsEvent) -> usize {
    log.iter().filter(|e| **e == event).count()
}

#[test]
fn test_loading_project_applies_canvas() {
    let project = Rc::new(Project::new());
    let controller = MapSettingsController::new();
    controller.set_project(Some(&project));
    let log = record(&controller);

    project.read_str(&project_xml(CANVAS)).unwrap();

    assert_eq!(controller.extent(), Rectangle::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(controller.destination_crs().auth_id(), "EPSG:4326");
    assert_eq!(controller.output_size(), Size::new(800, 600));
    assert_eq!(controller.output_dpi(), 120.0);
    assert_eq!(controller.background_color(), Color::rgb(10, 20, 30));
    assert!(controller.is_temporal());
    assert!(controller.temporal_begin().is_some());
    assert!(controller.temporal_end().is_some());

    let log = log.borrow();
    for event in [
        MapSettingsEvent::ExtentChanged,
        MapSettingsEvent::OutputSizeChanged,
        MapSettingsEvent::OutputDpiChanged,
        MapSettingsEvent::BackgroundColorChanged,
        MapSettingsEvent::TemporalStateChanged,
    ] {
        assert_eq!(count(&log, event), 1, "{:?}", event);
    }
    // Project CRS (EPSG:3857) first, then the canvas view state, each
    // raising the derived signals once.
    assert_eq!(count(&log, MapSettingsEvent::DestinationCrsChanged), 2);
    assert_eq!(count(&log, MapSettingsEvent::VisibleExtentChanged), 2);
    assert_eq!(count(&log, MapSettingsEvent::MapUnitsPerPixelChanged), 2);
    assert_eq!(count(&log, MapSettingsEvent::RotationChanged), 0);
}

#[test]
fn test_reloading_same_project_is_quiet() {
    let project = Rc::new(Project::new());
    let controller = MapSettingsController::new();
    controller.set_project(Some(&project));
    project.read_str(&project_xml(CANVAS)).unwrap();

    let log = record(&controller);
    project.read_str(&project_xml(CANVAS)).unwrap();
    assert!(log.borrow().is_empty(), "{:?}", log.borrow());
}

#[test]
fn test_rotation_from_document_is_reset() {
    let project = Rc::new(Project::new());
    let controller = MapSettingsController::new();
    controller.set_project(Some(&project));
    controller.set_rotation(15.0);

    let canvas = CANVAS.replace("<rotation>0</rotation>", "<rotation>45</rotation>");
    project.read_str(&project_xml(&canvas)).unwrap();
    assert_eq!(controller.rotation(), 0.0);
}

#[test]
fn test_malformed_canvas_fields_are_skipped() {
    let project = Rc::new(Project::new());
    let controller = MapSettingsController::new();
    controller.set_extent(Rectangle::new(-1.0, -1.0, 1.0, 1.0));
    controller.set_project(Some(&project));

    let canvas = CANVAS
        .replace("<xmin>0</xmin>", "<xmin>west</xmin>")
        .replace(r#"width="800""#, r#"width="wide""#);
    project.read_str(&project_xml(&canvas)).unwrap();

    assert_eq!(controller.extent(), Rectangle::new(-1.0, -1.0, 1.0, 1.0));
    assert_eq!(controller.output_size(), Size::default());
    assert_eq!(controller.destination_crs().auth_id(), "EPSG:4326");
}

#[test]
fn test_without_canvas_uses_project_crs_and_full_extent() {
    let project = Rc::new(Project::new());
    let controller = MapSettingsController::new();
    controller.set_project(Some(&project));
    controller.set_layers(vec![Arc::new(MapLayer::new(
        "local",
        "Local",
        LayerKind::Vector(GeometryType::Line),
        CoordinateReferenceSystem::from_auth_id("EPSG:3857"),
        Rectangle::new(100.0, 200.0, 300.0, 400.0),
    ))]);

    project.read_str(&project_xml("")).unwrap();

    assert_eq!(controller.destination_crs().auth_id(), "EPSG:3857");
    assert_eq!(controller.extent(), Rectangle::new(100.0, 200.0, 300.0, 400.0));
}

#[test]
fn test_reattach_detaches_old_project() {
    let old = Rc::new(Project::new());
    let new = Rc::new(Project::new());
    let controller = MapSettingsController::new();
    controller.set_project(Some(&old));
    controller.set_project(Some(&new));
    assert_eq!(old.signals().subscriber_count(), 0);
    assert_eq!(new.signals().subscriber_count(), 1);

    let log = record(&controller);
    old.read_str(&project_xml(CANVAS)).unwrap();
    old.set_crs(CoordinateReferenceSystem::from_auth_id("EPSG:27700"));

    assert!(log.borrow().is_empty());
    assert!(controller.extent().is_null());
    assert!(!controller.destination_crs().is_valid());
}

#[test]
fn test_attach_adopts_project_crs() {
    let project = Rc::new(Project::new());
    project.set_crs(CoordinateReferenceSystem::from_auth_id("EPSG:4326"));

    let controller = MapSettingsController::new();
    let log = record(&controller);
    controller.set_project(Some(&project));

    assert_eq!(controller.destination_crs().auth_id(), "EPSG:4326");
    let log = log.borrow();
    assert_eq!(log.first(), Some(&MapSettingsEvent::DestinationCrsChanged));
    assert_eq!(log.last(), Some(&MapSettingsEvent::ProjectChanged));
}

#[test]
fn test_center_to_layer() {
    let controller = MapSettingsController::new();
    controller.set_destination_crs(CoordinateReferenceSystem::from_auth_id("EPSG:3857"));
    controller.set_output_size(Size::new(100, 100));
    controller.set_extent(Rectangle::new(0.0, 0.0, 10.0, 10.0));

    let layer = MapLayer::new(
        "l",
        "l",
        LayerKind::Raster,
        CoordinateReferenceSystem::from_auth_id("EPSG:3857"),
        Rectangle::new(100.0, 100.0, 200.0, 300.0),
    );

    controller.set_center_to_layer(&layer, false).unwrap();
    assert_eq!(controller.center(), Point::new(150.0, 200.0));
    assert_eq!(controller.extent().width(), 10.0);

    controller.set_center_to_layer(&layer, true).unwrap();
    assert_eq!(controller.extent(), Rectangle::new(100.0, 100.0, 200.0, 300.0));
}

#[test]
fn test_center_to_layer_ignores_zero_area_extent() {
    let controller = MapSettingsController::new();
    controller.set_destination_crs(CoordinateReferenceSystem::from_auth_id("EPSG:3857"));
    controller.set_output_size(Size::new(100, 100));
    controller.set_extent(Rectangle::new(0.0, 0.0, 10.0, 10.0));
    let log = record(&controller);

    let point_layer = MapLayer::new(
        "wells",
        "Wells",
        LayerKind::Vector(GeometryType::Point),
        CoordinateReferenceSystem::from_auth_id("EPSG:3857"),
        Rectangle::new(500.0, 500.0, 500.0, 500.0),
    );

    controller.set_center_to_layer(&point_layer, true).unwrap();
    controller.set_center_to_layer(&point_layer, false).unwrap();

    assert_eq!(controller.extent(), Rectangle::new(0.0, 0.0, 10.0, 10.0));
    assert!(log.borrow().is_empty(), "{:?}", log.borrow());
}

#[test]
fn test_center_to_layer_propagates_transform_errors() {
    let controller = MapSettingsController::new();
    controller.set_destination_crs(CoordinateReferenceSystem::from_auth_id("EPSG:27700"));
    controller.set_extent(Rectangle::new(0.0, 0.0, 10.0, 10.0));

    let layer = MapLayer::new(
        "l",
        "l",
        LayerKind::Raster,
        CoordinateReferenceSystem::from_auth_id("EPSG:4326"),
        Rectangle::new(0.0, 0.0, 1.0, 1.0),
    );
    assert!(controller.set_center_to_layer(&layer, true).is_err());
    assert_eq!(controller.extent(), Rectangle::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn test_set_layers_keeps_spatial_layers_in_order() {
    let controller = MapSettingsController::new();
    let layer = |id: &str, kind| {
        Arc::new(MapLayer::new(
            id,
            id,
            kind,
            CoordinateReferenceSystem::from_auth_id("EPSG:4326"),
            Rectangle::null(),
        ))
    };
    let log = record(&controller);

    controller.set_layers(vec![
        layer("a", LayerKind::Raster),
        layer("table", LayerKind::Vector(GeometryType::NoGeometry)),
        layer("b", LayerKind::Vector(GeometryType::Polygon)),
    ]);
    let ids: Vec<String> = controller.layers().iter().map(|l| l.id.clone()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    controller.set_layers(controller.layers());
    assert_eq!(*log.borrow(), vec![MapSettingsEvent::LayersChanged]);
}
