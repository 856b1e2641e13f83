//! Coordinate transforms between reference systems.
//!
//! The projection math is pluggable through [`CoordinateOperation`]; a
//! [`TransformContext`] holds the operations a project registers for
//! specific CRS pairs. Identity and WGS 84 ↔ Web Mercator are built in so a
//! bare context is still useful.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::crs::CoordinateReferenceSystem;
use crate::error::TransformError;
use crate::geometry::{Point, Rectangle};

/// Spherical Mercator earth radius in meters.
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;
/// Latitude at which Web Mercator becomes square.
pub const WEB_MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_8;
/// Samples taken along each edge when transforming a rectangle.
const EDGE_SAMPLES: usize = 21;

const GEOGRAPHIC_WGS84: &[&str] = &["EPSG:4326", "OGC:CRS84"];
const WEB_MERCATOR: &[&str] = &["EPSG:3857", "EPSG:900913"];

/// A coordinate operation between two fixed reference systems.
pub trait CoordinateOperation: Send + Sync + fmt::Debug {
    /// Source to destination.
    fn forward(&self, point: Point) -> Result<Point, TransformError>;

    /// Destination to source.
    fn inverse(&self, point: Point) -> Result<Point, TransformError>;
}

/// WGS 84 longitude/latitude to spherical (Web) Mercator meters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl CoordinateOperation for WebMercator {
    fn forward(&self, point: Point) -> Result<Point, TransformError> {
        if !point.is_finite() {
            return Err(TransformError::NonFinite);
        }
        if point.y.abs() > WEB_MERCATOR_MAX_LATITUDE || point.x.abs() > 180.0 {
            return Err(TransformError::OutOfDomain {
                x: point.x,
                y: point.y,
                crs: "EPSG:3857".to_string(),
            });
        }
        let x = WEB_MERCATOR_RADIUS * point.x.to_radians();
        let y = WEB_MERCATOR_RADIUS * (PI / 4.0 + point.y.to_radians() / 2.0).tan().ln();
        Ok(Point::new(x, y))
    }

    fn inverse(&self, point: Point) -> Result<Point, TransformError> {
        if !point.is_finite() {
            return Err(TransformError::NonFinite);
        }
        let lon = (point.x / WEB_MERCATOR_RADIUS).to_degrees();
        let lat = (2.0 * (point.y / WEB_MERCATOR_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        if lon.abs() > 180.0 + 1e-9 {
            return Err(TransformError::OutOfDomain {
                x: point.x,
                y: point.y,
                crs: "EPSG:4326".to_string(),
            });
        }
        Ok(Point::new(lon, lat))
    }
}

/// Operations registered for specific source/destination pairs.
#[derive(Clone, Default)]
pub struct TransformContext {
    operations: HashMap<(String, String), Arc<dyn CoordinateOperation>>,
}

impl TransformContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the operation to use from `source` to `destination`.
    ///
    /// The reverse direction is served by [`CoordinateOperation::inverse`].
    pub fn add_operation(
        &mut self,
        source: &CoordinateReferenceSystem,
        destination: &CoordinateReferenceSystem,
        operation: Arc<dyn CoordinateOperation>,
    ) {
        self.operations.insert(
            (source.auth_id().to_string(), destination.auth_id().to_string()),
            operation,
        );
    }

    /// Remove a registered operation. Returns true if one was present.
    pub fn remove_operation(
        &mut self,
        source: &CoordinateReferenceSystem,
        destination: &CoordinateReferenceSystem,
    ) -> bool {
        self.operations
            .remove(&(source.auth_id().to_string(), destination.auth_id().to_string()))
            .is_some()
    }

    pub fn has_operation(
        &self,
        source: &CoordinateReferenceSystem,
        destination: &CoordinateReferenceSystem,
    ) -> bool {
        self.lookup(source, destination).is_some()
    }

    /// Number of explicitly registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn lookup(
        &self,
        source: &CoordinateReferenceSystem,
        destination: &CoordinateReferenceSystem,
    ) -> Option<(Arc<dyn CoordinateOperation>, bool)> {
        let key = |a: &CoordinateReferenceSystem, b: &CoordinateReferenceSystem| {
            (a.auth_id().to_string(), b.auth_id().to_string())
        };
        if let Some(op) = self.operations.get(&key(source, destination)) {
            return Some((op.clone(), false));
        }
        if let Some(op) = self.operations.get(&key(destination, source)) {
            return Some((op.clone(), true));
        }
        let src = source.auth_id();
        let dst = destination.auth_id();
        if GEOGRAPHIC_WGS84.contains(&src) && WEB_MERCATOR.contains(&dst) {
            return Some((Arc::new(WebMercator), false));
        }
        if WEB_MERCATOR.contains(&src) && GEOGRAPHIC_WGS84.contains(&dst) {
            return Some((Arc::new(WebMercator), true));
        }
        None
    }
}

impl fmt::Debug for TransformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<String> = self
            .operations
            .keys()
            .map(|(s, d)| format!("{} -> {}", s, d))
            .collect();
        pairs.sort();
        f.debug_struct("TransformContext")
            .field("operations", &pairs)
            .finish()
    }
}

/// A resolved transform from one CRS to another.
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    source: CoordinateReferenceSystem,
    destination: CoordinateReferenceSystem,
    /// `None` for the identity.
    operation: Option<Arc<dyn CoordinateOperation>>,
    reversed: bool,
}

impl CoordinateTransform {
    /// Resolve the operation between `source` and `destination`.
    pub fn new(
        source: &CoordinateReferenceSystem,
        destination: &CoordinateReferenceSystem,
        context: &TransformContext,
    ) -> Result<Self, TransformError> {
        for crs in [source, destination] {
            if !crs.is_valid() {
                return Err(TransformError::InvalidCrs {
                    auth_id: crs.auth_id().to_string(),
                });
            }
        }

        let (operation, reversed) = if source == destination {
            (None, false)
        } else {
            let (op, reversed) =
                context
                    .lookup(source, destination)
                    .ok_or_else(|| TransformError::Unsupported {
                        source_crs: source.auth_id().to_string(),
                        destination_crs: destination.auth_id().to_string(),
                    })?;
            (Some(op), reversed)
        };

        Ok(Self {
            source: source.clone(),
            destination: destination.clone(),
            operation,
            reversed,
        })
    }

    pub fn source_crs(&self) -> &CoordinateReferenceSystem {
        &self.source
    }

    pub fn destination_crs(&self) -> &CoordinateReferenceSystem {
        &self.destination
    }

    pub fn is_identity(&self) -> bool {
        self.operation.is_none()
    }

    /// Transform a point from the source to the destination CRS.
    pub fn transform(&self, point: Point) -> Result<Point, TransformError> {
        self.apply(point, false)
    }

    /// Transform a point from the destination back to the source CRS.
    pub fn transform_reverse(&self, point: Point) -> Result<Point, TransformError> {
        self.apply(point, true)
    }

    fn apply(&self, point: Point, backwards: bool) -> Result<Point, TransformError> {
        let Some(op) = &self.operation else {
            return Ok(point);
        };
        let result = if backwards != self.reversed {
            op.inverse(point)?
        } else {
            op.forward(point)?
        };
        if !result.is_finite() {
            return Err(TransformError::NonFinite);
        }
        Ok(result)
    }

    /// Transform a rectangle into the bounding box of its transformed edges.
    ///
    /// Each edge is densified so curved projections are covered. Samples
    /// outside the operation's domain are skipped; the call fails only when
    /// no sample could be transformed. A null rectangle is returned as-is.
    pub fn transform_bounding_box(&self, rect: &Rectangle) -> Result<Rectangle, TransformError> {
        if rect.is_null() || self.is_identity() {
            return Ok(*rect);
        }

        let mut points = Vec::with_capacity(EDGE_SAMPLES * 4);
        let mut first_error = None;
        for i in 0..EDGE_SAMPLES {
            let t = i as f64 / (EDGE_SAMPLES - 1) as f64;
            let x = rect.xmin + rect.width() * t;
            let y = rect.ymin + rect.height() * t;
            for sample in [
                Point::new(x, rect.ymin),
                Point::new(x, rect.ymax),
                Point::new(rect.xmin, y),
                Point::new(rect.xmax, y),
            ] {
                match self.transform(sample) {
                    Ok(p) => points.push(p),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        match Rectangle::bounding(points) {
            Some(bbox) => Ok(bbox),
            None => Err(first_error.unwrap_or(TransformError::NonFinite)),
        }
    }
}
