//! Affine transform between map coordinates and output pixels.

use glam::{DAffine2, DVec2};
use mapview_core::{Point, ScreenPoint};

/// Map ↔ pixel transform for one set of map settings.
///
/// Pixels have their origin in the top left corner with y pointing down.
/// Rotation is in degrees, clockwise on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapToPixel {
    map_units_per_pixel: f64,
    center: Point,
    width: f64,
    height: f64,
    rotation: f64,
    matrix: DAffine2,
    inverse: DAffine2,
}

impl MapToPixel {
    /// Build the transform centered on `center` for a `width` × `height`
    /// pixel output.
    pub fn new(map_units_per_pixel: f64, center: Point, width: f64, height: f64, rotation: f64) -> Self {
        let matrix = DAffine2::from_translation(DVec2::new(width / 2.0, height / 2.0))
            * DAffine2::from_angle(rotation.to_radians())
            * DAffine2::from_scale(DVec2::new(
                1.0 / map_units_per_pixel,
                -1.0 / map_units_per_pixel,
            ))
            * DAffine2::from_translation(DVec2::new(-center.x, -center.y));
        Self {
            map_units_per_pixel,
            center,
            width,
            height,
            rotation,
            matrix,
            inverse: matrix.inverse(),
        }
    }

    /// Map coordinates to output pixels.
    pub fn transform(&self, point: Point) -> ScreenPoint {
        let p = self.matrix.transform_point2(DVec2::new(point.x, point.y));
        ScreenPoint::new(p.x, p.y)
    }

    /// Output pixels to map coordinates.
    pub fn to_map_coordinates(&self, pixel: ScreenPoint) -> Point {
        let p = self.inverse.transform_point2(DVec2::new(pixel.x, pixel.y));
        Point::new(p.x, p.y)
    }

    pub fn map_units_per_pixel(&self) -> f64 {
        self.map_units_per_pixel
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Map coordinates of the four output corners, clockwise from top left.
    pub fn viewport_corners(&self) -> [Point; 4] {
        [
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(self.width, 0.0),
            ScreenPoint::new(self.width, self.height),
            ScreenPoint::new(0.0, self.height),
        ]
        .map(|p| self.to_map_coordinates(p))
    }
}
