//! Geometry value types shared by the map view.
//!
//! Map coordinates are `f64` in the units of whatever CRS they belong to.
//! Screen coordinates are device-independent pixels with the origin at the
//! top-left corner and Y growing downwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coordinate in map units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl From<ScreenPoint> for Point {
    fn from(p: ScreenPoint) -> Self {
        Self::new(p.x, p.y)
    }
}

/// A position on screen, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Multiply both components by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Pixel dimensions of a rendered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scale both dimensions, truncating towards zero.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(
            (self.width as f64 * factor) as u32,
            (self.height as f64 * factor) as u32,
        )
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis aligned rectangle in map units.
///
/// Equality is exact; the map view compares extents without tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Rectangle {
    /// Build a rectangle from two corners in any order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            xmin: x1.min(x2),
            ymin: y1.min(y2),
            xmax: x1.max(x2),
            ymax: y1.max(y2),
        }
    }

    /// The null rectangle: all zero, used for "no extent".
    pub const fn null() -> Self {
        Self {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 0.0,
            ymax: 0.0,
        }
    }

    /// Build a rectangle of the given size centered on `center`.
    pub fn from_center(center: Point, width: f64, height: f64) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            center.x + width / 2.0,
            center.y + height / 2.0,
        )
    }

    pub fn is_null(&self) -> bool {
        self.xmin == 0.0 && self.ymin == 0.0 && self.xmax == 0.0 && self.ymax == 0.0
    }

    /// True when the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        !(self.xmax > self.xmin && self.ymax > self.ymin)
    }

    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite() && self.ymin.is_finite() && self.xmax.is_finite() && self.ymax.is_finite()
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.xmin + self.width() / 2.0,
            self.ymin + self.height() / 2.0,
        )
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// Shift the rectangle by (`dx`, `dy`).
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            xmin: self.xmin + dx,
            ymin: self.ymin + dy,
            xmax: self.xmax + dx,
            ymax: self.ymax + dy,
        }
    }

    /// Same width and height, with the centroid moved onto `center`.
    pub fn centered_on(&self, center: Point) -> Self {
        let current = self.center();
        self.translated(center.x - current.x, center.y - current.y)
    }

    /// Grow or shrink around the center by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_center(self.center(), self.width() * factor, self.height() * factor)
    }

    /// Union of two rectangles. A null rectangle contributes nothing.
    pub fn combine(&self, other: &Rectangle) -> Self {
        if self.is_null() {
            return *other;
        }
        if other.is_null() {
            return *self;
        }
        Self {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// Smallest rectangle containing every point, or `None` for no points.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self {
            xmin: first.x,
            ymin: first.y,
            xmax: first.x,
            ymax: first.y,
        };
        for p in iter {
            rect.xmin = rect.xmin.min(p.x);
            rect.ymin = rect.ymin.min(p.y);
            rect.xmax = rect.xmax.max(p.x);
            rect.ymax = rect.ymax.max(p.y);
        }
        Some(rect)
    }

    /// The four corners, counter-clockwise from the lower left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.xmin, self.ymin),
            Point::new(self.xmax, self.ymin),
            Point::new(self.xmax, self.ymax),
            Point::new(self.xmin, self.ymax),
        ]
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} : {},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}
