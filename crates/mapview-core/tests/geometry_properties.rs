//! Property tests for geometry and transforms

use mapview_core::{
    CoordinateReferenceSystem, CoordinateTransform, Point, Rectangle, TransformContext,
};
use proptest::prelude::*;

fn rect_strategy() -> impl Strategy<Value = Rectangle> {
    (-1.0e3..1.0e3f64, -1.0e3..1.0e3f64, -1.0e3..1.0e3f64, -1.0e3..1.0e3f64)
        .prop_map(|(a, b, c, d)| Rectangle::new(a, b, c, d))
}

proptest! {
    #[test]
    fn new_normalizes_corners(rect in rect_strategy()) {
        prop_assert!(rect.xmin <= rect.xmax);
        prop_assert!(rect.ymin <= rect.ymax);
    }

    #[test]
    fn combine_contains_both(a in rect_strategy(), b in rect_strategy()) {
        let union = a.combine(&b);
        for corner in a.corners().iter().chain(b.corners().iter()) {
            prop_assert!(union.contains_point(corner));
        }
    }

    #[test]
    fn centered_on_preserves_size(rect in rect_strategy(), x in -1.0e3..1.0e3f64, y in -1.0e3..1.0e3f64) {
        let moved = rect.centered_on(Point::new(x, y));
        prop_assert!((moved.width() - rect.width()).abs() < 1e-9);
        prop_assert!((moved.height() - rect.height()).abs() < 1e-9);
        prop_assert!((moved.center().x - x).abs() < 1e-9);
        prop_assert!((moved.center().y - y).abs() < 1e-9);
    }

    #[test]
    fn web_mercator_round_trip(lon in -180.0..180.0f64, lat in -85.0..85.0f64) {
        let transform = CoordinateTransform::new(
            &CoordinateReferenceSystem::from_auth_id("EPSG:4326"),
            &CoordinateReferenceSystem::from_auth_id("EPSG:3857"),
            &TransformContext::new(),
        ).unwrap();
        let projected = transform.transform(Point::new(lon, lat)).unwrap();
        let back = transform.transform_reverse(projected).unwrap();
        prop_assert!((back.x - lon).abs() < 1e-9);
        prop_assert!((back.y - lat).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_covers_transformed_corners(
        lon in -170.0..160.0f64,
        lat in -80.0..70.0f64,
        w in 0.1..10.0f64,
        h in 0.1..10.0f64,
    ) {
        let transform = CoordinateTransform::new(
            &CoordinateReferenceSystem::from_auth_id("EPSG:4326"),
            &CoordinateReferenceSystem::from_auth_id("EPSG:3857"),
            &TransformContext::new(),
        ).unwrap();
        let rect = Rectangle::new(lon, lat, lon + w, lat + h);
        let bbox = transform.transform_bounding_box(&rect).unwrap();
        for corner in rect.corners() {
            let p = transform.transform(corner).unwrap();
            prop_assert!(p.x >= bbox.xmin - 1e-6 && p.x <= bbox.xmax + 1e-6);
            prop_assert!(p.y >= bbox.ymin - 1e-6 && p.y <= bbox.ymax + 1e-6);
        }
    }
}
