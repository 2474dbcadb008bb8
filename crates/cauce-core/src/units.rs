//! # SI quantities for CAUCE
//!
//! Physical constants and quantity formatting for hydraulic reports.
//! All engine computations are SI: meters, seconds, cubic meters per
//! second, pascals. Elevations are absolute meters; depths are measured
//! from the thalweg.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gravitational acceleration (m/s^2)
pub const GRAVITY: f64 = 9.81;

/// Specific weight of water (N/m^3)
pub const UNIT_WEIGHT_WATER: f64 = 9810.0;

/// Density of water (kg/m^3)
pub const WATER_DENSITY: f64 = 1000.0;

/// Kinematic viscosity of water at 20 C (m^2/s)
pub const KINEMATIC_VISCOSITY: f64 = 1.003e-6;

/// A physical quantity kind, used to pick units and precision when
/// rendering report tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quantity {
    /// Lengths, depths, elevations, heads (m)
    Length,
    /// Horizontal stationing along a reach (m)
    Station,
    /// Areas (m^2)
    Area,
    /// Volumes (m^3)
    Volume,
    /// Discharge (m^3/s)
    Discharge,
    /// Velocity (m/s)
    Velocity,
    /// Shear stress (Pa)
    Shear,
    /// Slopes and friction slopes (m/m)
    Slope,
    /// Dimensionless numbers (Froude, alpha, beta)
    Dimensionless,
}

impl Quantity {
    /// Unit abbreviation printed after the value
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Quantity::Length => "m",
            Quantity::Station => "m",
            Quantity::Area => "m2",
            Quantity::Volume => "m3",
            Quantity::Discharge => "m3/s",
            Quantity::Velocity => "m/s",
            Quantity::Shear => "Pa",
            Quantity::Slope => "m/m",
            Quantity::Dimensionless => "",
        }
    }

    /// Decimal places used by the fixed report format
    pub fn precision(&self) -> usize {
        match self {
            Quantity::Length => 3,
            Quantity::Station => 2,
            Quantity::Area => 3,
            Quantity::Volume => 1,
            Quantity::Discharge => 3,
            Quantity::Velocity => 3,
            Quantity::Shear => 1,
            Quantity::Slope => 6,
            Quantity::Dimensionless => 3,
        }
    }

    /// Render a value with the fixed precision and unit for this quantity
    pub fn format(&self, value: f64) -> String {
        let abbr = self.abbreviation();
        if abbr.is_empty() {
            format!("{:.*}", self.precision(), value)
        } else {
            format!("{:.*} {}", self.precision(), value, abbr)
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_discharge() {
        assert_eq!(Quantity::Discharge.format(5.0), "5.000 m3/s");
    }

    #[test]
    fn test_format_dimensionless_has_no_unit() {
        assert_eq!(Quantity::Dimensionless.format(0.47), "0.470");
    }

    #[test]
    fn test_format_slope_precision() {
        assert_eq!(Quantity::Slope.format(0.001), "0.001000 m/m");
    }

    #[test]
    fn test_constants() {
        assert!((GRAVITY - 9.81).abs() < 1e-12);
        assert!((UNIT_WEIGHT_WATER - 9810.0).abs() < 1e-9);
    }
}
