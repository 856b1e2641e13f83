//! Scale denominator calculation.

use mapview_core::{DistanceUnit, Rectangle};

/// Computes the scale denominator of a map for an output device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleCalculator {
    dpi: f64,
    map_units: DistanceUnit,
}

impl ScaleCalculator {
    pub fn new(dpi: f64, map_units: DistanceUnit) -> Self {
        Self { dpi, map_units }
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    pub fn map_units(&self) -> DistanceUnit {
        self.map_units
    }

    /// Scale denominator for `extent` drawn `width_px` pixels wide.
    ///
    /// Returns 0 when the width or DPI is not positive.
    pub fn calculate(&self, extent: &Rectangle, width_px: f64) -> f64 {
        if width_px <= 0.0 || self.dpi <= 0.0 {
            return 0.0;
        }
        let delta = if self.map_units.is_angular() {
            Self::geographic_distance(extent)
        } else {
            extent.width()
        };
        delta * self.map_units.inches_per_unit() / (width_px / self.dpi)
    }

    /// Approximate ground distance in meters across the extent, measured
    /// along its center latitude.
    pub fn geographic_distance(extent: &Rectangle) -> f64 {
        const RA: f64 = 6_378_000.0;
        const RB: f64 = 6_357_000.0;

        let lat = extent.center().y.clamp(-90.0, 90.0).to_radians();
        let a = lat.cos().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        let e2 = 1.0 - (RB * RB) / (RA * RA);
        let radius = RA * (1.0 - e2) / (1.0 - e2 * lat.sin().powi(2)).powf(1.5);
        extent.width() / 180.0 * radius * c
    }
}
