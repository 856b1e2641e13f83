//! Coordinate reference system identity.
//!
//! A CRS here is an authority id plus the metadata the map view needs
//! (map units, geographic flag). Projection math lives behind
//! [`crate::transform::CoordinateOperation`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dom::XmlElement;
use crate::units::DistanceUnit;

/// Geographic CRSes known to use degrees.
const GEOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("EPSG:4326", "WGS 84"),
    ("EPSG:4258", "ETRS89"),
    ("EPSG:4269", "NAD83"),
    ("EPSG:4283", "GDA94"),
    ("EPSG:4674", "SIRGAS 2000"),
    ("OGC:CRS84", "WGS 84 (CRS84)"),
];

/// Projected CRSes with known descriptions.
const PROJECTED_CODES: &[(&str, &str, DistanceUnit)] = &[
    ("EPSG:3857", "WGS 84 / Pseudo-Mercator", DistanceUnit::Meters),
    ("EPSG:900913", "Google Maps Global Mercator", DistanceUnit::Meters),
    ("EPSG:3395", "WGS 84 / World Mercator", DistanceUnit::Meters),
    ("EPSG:27700", "OSGB36 / British National Grid", DistanceUnit::Meters),
    ("EPSG:2263", "NAD83 / New York Long Island (ftUS)", DistanceUnit::Feet),
];

/// A coordinate reference system.
///
/// Two CRSes are equal when their authority ids match. A CRS with an
/// empty or malformed id is invalid but can still be stored and compared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinateReferenceSystem {
    auth_id: String,
    description: String,
    map_units: DistanceUnit,
    geographic: bool,
}

impl CoordinateReferenceSystem {
    /// Create a CRS from an authority id such as `EPSG:4326`.
    ///
    /// Well-known codes get their description and units from a built-in
    /// table; any other projected code is assumed to be in meters.
    pub fn from_auth_id(auth_id: &str) -> Self {
        let auth_id = auth_id.trim().to_uppercase();
        if let Some((_, name)) = GEOGRAPHIC_CODES.iter().find(|(id, _)| *id == auth_id) {
            return Self {
                auth_id,
                description: name.to_string(),
                map_units: DistanceUnit::Degrees,
                geographic: true,
            };
        }
        if let Some((_, name, units)) = PROJECTED_CODES.iter().find(|(id, _, _)| *id == auth_id) {
            return Self {
                auth_id,
                description: name.to_string(),
                map_units: *units,
                geographic: false,
            };
        }
        Self {
            auth_id,
            description: String::new(),
            map_units: DistanceUnit::Meters,
            geographic: false,
        }
    }

    /// An invalid (empty) CRS.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Read a CRS from a `<spatialrefsys>` element, or from an element that
    /// wraps one (`<destinationsrs>`, `<projectCrs>`, `<srs>`).
    ///
    /// Returns `None` when no `authid` is present.
    pub fn from_xml(element: &XmlElement) -> Option<Self> {
        let srs = if element.name == "spatialrefsys" {
            element
        } else {
            element.first_child("spatialrefsys")?
        };
        let auth_id = srs.child_text("authid")?;
        if auth_id.trim().is_empty() {
            return None;
        }
        let mut crs = Self::from_auth_id(auth_id);
        if let Some(description) = srs.child_text("description") {
            if !description.is_empty() {
                crs.description = description.to_string();
            }
        }
        if let Some(flag) = srs.child_text("geographicflag") {
            crs.geographic = flag.trim().eq_ignore_ascii_case("true");
            crs.map_units = if crs.geographic {
                DistanceUnit::Degrees
            } else if crs.map_units == DistanceUnit::Degrees {
                DistanceUnit::Meters
            } else {
                crs.map_units
            };
        }
        Some(crs)
    }

    /// Authority id, e.g. `EPSG:4326`. Empty for an invalid CRS.
    pub fn auth_id(&self) -> &str {
        &self.auth_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn map_units(&self) -> DistanceUnit {
        self.map_units
    }

    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    /// True for a well-formed `AUTHORITY:CODE` id.
    pub fn is_valid(&self) -> bool {
        match self.auth_id.split_once(':') {
            Some((authority, code)) => {
                !authority.is_empty() && !code.is_empty() && !code.contains(':')
            }
            None => false,
        }
    }
}

impl PartialEq for CoordinateReferenceSystem {
    fn eq(&self, other: &Self) -> bool {
        self.auth_id == other.auth_id
    }
}

impl Eq for CoordinateReferenceSystem {}

impl fmt::Display for CoordinateReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.auth_id.is_empty() {
            write!(f, "<invalid CRS>")
        } else {
            write!(f, "{}", self.auth_id)
        }
    }
}
