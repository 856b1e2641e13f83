//! Distance unit utilities
//!
//! Map units of a coordinate reference system and their conversion to
//! inches, which is what the scale calculation works in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inches per meter.
pub const INCHES_PER_METER: f64 = 39.370_078_7;

/// Unit of distance used by a coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    /// Meters
    Meters,
    /// Kilometers
    Kilometers,
    /// International feet
    Feet,
    /// Nautical miles
    NauticalMiles,
    /// Degrees (geographic CRS)
    Degrees,
    /// Unknown unit
    Unknown,
}

impl Default for DistanceUnit {
    fn default() -> Self {
        Self::Meters
    }
}

impl DistanceUnit {
    /// Inches in one unit.
    ///
    /// Degrees have no fixed length; callers convert them to meters first
    /// (see the scale calculator), so this returns the meter factor for them.
    /// Unknown units are treated as inches so a scale can still be formed.
    pub fn inches_per_unit(self) -> f64 {
        match self {
            Self::Meters | Self::Degrees => INCHES_PER_METER,
            Self::Kilometers => INCHES_PER_METER * 1000.0,
            Self::Feet => 12.0,
            Self::NauticalMiles => INCHES_PER_METER * 1852.0,
            Self::Unknown => 1.0,
        }
    }

    /// Whether this unit is angular
    pub fn is_angular(self) -> bool {
        matches!(self, Self::Degrees)
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Meters => write!(f, "meters"),
            Self::Kilometers => write!(f, "km"),
            Self::Feet => write!(f, "feet"),
            Self::NauticalMiles => write!(f, "nautical miles"),
            Self::Degrees => write!(f, "degrees"),
            Self::Unknown => write!(f, "<unknown>"),
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "meters" | "m" | "metre" | "metres" => Ok(Self::Meters),
            "km" | "kilometers" | "kilometres" => Ok(Self::Kilometers),
            "feet" | "ft" | "foot" => Ok(Self::Feet),
            "nautical miles" | "nm" | "nautical" => Ok(Self::NauticalMiles),
            "degrees" | "deg" => Ok(Self::Degrees),
            "<unknown>" | "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Unknown distance unit: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("meters".parse::<DistanceUnit>(), Ok(DistanceUnit::Meters));
        assert_eq!("Degrees".parse::<DistanceUnit>(), Ok(DistanceUnit::Degrees));
        assert_eq!(" ft ".parse::<DistanceUnit>(), Ok(DistanceUnit::Feet));
        assert!("parsecs".parse::<DistanceUnit>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for unit in [
            DistanceUnit::Meters,
            DistanceUnit::Kilometers,
            DistanceUnit::Feet,
            DistanceUnit::NauticalMiles,
            DistanceUnit::Degrees,
            DistanceUnit::Unknown,
        ] {
            assert_eq!(unit.to_string().parse::<DistanceUnit>(), Ok(unit));
        }
    }

    #[test]
    fn test_inches_factor() {
        assert_eq!(DistanceUnit::Feet.inches_per_unit(), 12.0);
        assert!((DistanceUnit::Kilometers.inches_per_unit() - 39370.0787).abs() < 1e-6);
        assert!(DistanceUnit::Degrees.is_angular());
        assert!(!DistanceUnit::Meters.is_angular());
    }
}
