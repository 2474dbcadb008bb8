//! Prismatic Sections - Secciones Prismaticas de Canales
//!
//! Define los tipos de seccion prismatica soportados:
//! - Rectangular
//! - Trapezoidal
//! - Triangular
//! - Circular
//! - Parabolica
//!
//! Cada seccion calcula sus propiedades geometricas en forma cerrada para
//! una profundidad de agua dada. Las secciones no tienen profundidad maxima
//! (salvo la circular, limitada por su diametro): los solvers iterativos
//! acotan el rango de busqueda por caudal.

use crate::{HydraulicError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Propiedades hidraulicas de una seccion para una profundidad dada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydraulicProperties {
    /// Area mojada (m^2)
    pub area: f64,

    /// Perimetro mojado (m)
    pub wetted_perimeter: f64,

    /// Radio hidraulico (m) = Area / Perimetro
    pub hydraulic_radius: f64,

    /// Ancho superficial (m)
    pub top_width: f64,

    /// Profundidad hidraulica (m) = Area / Ancho
    pub hydraulic_depth: f64,

    /// Profundidad de agua (m)
    pub water_depth: f64,
}

impl HydraulicProperties {
    /// Propiedades nulas (seccion seca)
    pub fn dry() -> Self {
        Self {
            area: 0.0,
            wetted_perimeter: 0.0,
            hydraulic_radius: 0.0,
            top_width: 0.0,
            hydraulic_depth: 0.0,
            water_depth: 0.0,
        }
    }
}

/// Tipo de seccion prismatica
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PrismaticSection {
    /// Seccion rectangular
    Rectangular {
        /// Ancho del fondo (m)
        bottom_width: f64,
    },

    /// Seccion trapezoidal
    Trapezoidal {
        /// Ancho del fondo (m)
        bottom_width: f64,
        /// Talud izquierdo (H:V, ej: 1.5 = 1.5 m horizontal por 1 m vertical)
        left_slope: f64,
        /// Talud derecho (H:V)
        right_slope: f64,
    },

    /// Seccion triangular
    Triangular {
        /// Talud izquierdo (H:V)
        left_slope: f64,
        /// Talud derecho (H:V)
        right_slope: f64,
    },

    /// Seccion circular (tuberia)
    Circular {
        /// Diametro interno (m)
        diameter: f64,
    },

    /// Seccion parabolica
    Parabolic {
        /// Ancho superficial a profundidad unitaria (m)
        unit_top_width: f64,
    },
}

impl PrismaticSection {
    /// Crear seccion rectangular
    pub fn rectangular(bottom_width: f64) -> Self {
        Self::Rectangular { bottom_width }
    }

    /// Crear seccion trapezoidal simetrica
    pub fn trapezoidal(bottom_width: f64, side_slope: f64) -> Self {
        Self::Trapezoidal {
            bottom_width,
            left_slope: side_slope,
            right_slope: side_slope,
        }
    }

    /// Crear seccion trapezoidal asimetrica
    pub fn trapezoidal_asymmetric(bottom_width: f64, left_slope: f64, right_slope: f64) -> Self {
        Self::Trapezoidal {
            bottom_width,
            left_slope,
            right_slope,
        }
    }

    /// Crear seccion triangular simetrica
    pub fn triangular(side_slope: f64) -> Self {
        Self::Triangular {
            left_slope: side_slope,
            right_slope: side_slope,
        }
    }

    /// Crear seccion circular
    pub fn circular(diameter: f64) -> Self {
        Self::Circular { diameter }
    }

    /// Crear seccion parabolica
    pub fn parabolic(unit_top_width: f64) -> Self {
        Self::Parabolic { unit_top_width }
    }

    /// Verificar si dos secciones son del mismo tipo
    pub fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Area mojada (m^2) para una profundidad dada
    pub fn area(&self, water_depth: f64) -> f64 {
        if water_depth <= 0.0 {
            return 0.0;
        }

        match self {
            PrismaticSection::Rectangular { bottom_width } => bottom_width * water_depth,

            PrismaticSection::Trapezoidal {
                bottom_width,
                left_slope,
                right_slope,
            } => {
                let mean_slope = (left_slope + right_slope) / 2.0;
                (bottom_width + mean_slope * water_depth) * water_depth
            }

            PrismaticSection::Triangular {
                left_slope,
                right_slope,
            } => {
                let mean_slope = (left_slope + right_slope) / 2.0;
                mean_slope * water_depth.powi(2)
            }

            PrismaticSection::Circular { diameter } => {
                if water_depth >= *diameter {
                    PI * diameter.powi(2) / 4.0
                } else {
                    let theta = 2.0 * (1.0 - 2.0 * water_depth / diameter).acos();
                    diameter.powi(2) / 8.0 * (theta - theta.sin())
                }
            }

            PrismaticSection::Parabolic { unit_top_width } => {
                let top = unit_top_width * water_depth.sqrt();
                (2.0 / 3.0) * top * water_depth
            }
        }
    }

    /// Perimetro mojado (m) para una profundidad dada
    pub fn wetted_perimeter(&self, water_depth: f64) -> f64 {
        if water_depth <= 0.0 {
            return 0.0;
        }

        match self {
            PrismaticSection::Rectangular { bottom_width } => bottom_width + 2.0 * water_depth,

            PrismaticSection::Trapezoidal {
                bottom_width,
                left_slope,
                right_slope,
            } => {
                let left_side = water_depth * (1.0 + left_slope.powi(2)).sqrt();
                let right_side = water_depth * (1.0 + right_slope.powi(2)).sqrt();
                bottom_width + left_side + right_side
            }

            PrismaticSection::Triangular {
                left_slope,
                right_slope,
            } => {
                let left_side = water_depth * (1.0 + left_slope.powi(2)).sqrt();
                let right_side = water_depth * (1.0 + right_slope.powi(2)).sqrt();
                left_side + right_side
            }

            PrismaticSection::Circular { diameter } => {
                if water_depth >= *diameter {
                    PI * diameter
                } else {
                    let theta = 2.0 * (1.0 - 2.0 * water_depth / diameter).acos();
                    diameter * theta / 2.0
                }
            }

            PrismaticSection::Parabolic { unit_top_width } => {
                let top = unit_top_width * water_depth.sqrt();
                if top > 0.0 {
                    top + (8.0 / 3.0) * water_depth.powi(2) / top
                } else {
                    0.0
                }
            }
        }
    }

    /// Ancho superficial (m) para una profundidad dada
    ///
    /// Para tuberia llena el ancho es cero (no hay superficie libre).
    pub fn top_width(&self, water_depth: f64) -> f64 {
        if water_depth <= 0.0 {
            return 0.0;
        }

        match self {
            PrismaticSection::Rectangular { bottom_width } => *bottom_width,

            PrismaticSection::Trapezoidal {
                bottom_width,
                left_slope,
                right_slope,
            } => bottom_width + (left_slope + right_slope) * water_depth,

            PrismaticSection::Triangular {
                left_slope,
                right_slope,
            } => (left_slope + right_slope) * water_depth,

            PrismaticSection::Circular { diameter } => {
                if water_depth >= *diameter {
                    0.0
                } else {
                    let half_angle = (1.0 - 2.0 * water_depth / diameter).acos();
                    diameter * half_angle.sin()
                }
            }

            PrismaticSection::Parabolic { unit_top_width } => {
                unit_top_width * water_depth.sqrt()
            }
        }
    }

    /// Radio hidraulico (m) = A / P
    pub fn hydraulic_radius(&self, water_depth: f64) -> f64 {
        let perimeter = self.wetted_perimeter(water_depth);
        if perimeter > 0.0 {
            self.area(water_depth) / perimeter
        } else {
            0.0
        }
    }

    /// Profundidad hidraulica (m) = A / T
    pub fn hydraulic_depth(&self, water_depth: f64) -> f64 {
        let top = self.top_width(water_depth);
        if top > 0.0 {
            self.area(water_depth) / top
        } else {
            0.0
        }
    }

    /// Calcular todas las propiedades hidraulicas para una profundidad dada
    pub fn hydraulic_properties(&self, water_depth: f64) -> HydraulicProperties {
        if water_depth <= 0.0 {
            return HydraulicProperties::dry();
        }

        let area = self.area(water_depth);
        let wetted_perimeter = self.wetted_perimeter(water_depth);
        let top_width = self.top_width(water_depth);

        HydraulicProperties {
            area,
            wetted_perimeter,
            hydraulic_radius: if wetted_perimeter > 0.0 {
                area / wetted_perimeter
            } else {
                0.0
            },
            top_width,
            hydraulic_depth: if top_width > 0.0 { area / top_width } else { 0.0 },
            water_depth,
        }
    }

    /// Profundidad a partir de la cual la seccion deja de crecer
    ///
    /// Solo la seccion circular esta acotada (por su diametro).
    pub fn depth_ceiling(&self) -> Option<f64> {
        match self {
            PrismaticSection::Circular { diameter } => Some(*diameter),
            _ => None,
        }
    }

    /// Validar parametros de la seccion
    pub fn validate(&self) -> Result<()> {
        match self {
            PrismaticSection::Rectangular { bottom_width } => {
                if *bottom_width <= 0.0 {
                    return Err(HydraulicError::Section(
                        "Bottom width must be positive".into(),
                    ));
                }
            }
            PrismaticSection::Trapezoidal {
                bottom_width,
                left_slope,
                right_slope,
            } => {
                if *bottom_width <= 0.0 {
                    return Err(HydraulicError::Section(
                        "Bottom width must be positive".into(),
                    ));
                }
                if *left_slope < 0.0 || *right_slope < 0.0 {
                    return Err(HydraulicError::Section(
                        "Side slopes must be non-negative".into(),
                    ));
                }
            }
            PrismaticSection::Triangular {
                left_slope,
                right_slope,
            } => {
                if *left_slope < 0.0 || *right_slope < 0.0 {
                    return Err(HydraulicError::Section(
                        "Side slopes must be non-negative".into(),
                    ));
                }
                if *left_slope + *right_slope <= 0.0 {
                    return Err(HydraulicError::Section(
                        "Triangular section needs at least one positive slope".into(),
                    ));
                }
            }
            PrismaticSection::Circular { diameter } => {
                if *diameter <= 0.0 {
                    return Err(HydraulicError::Section("Diameter must be positive".into()));
                }
            }
            PrismaticSection::Parabolic { unit_top_width } => {
                if *unit_top_width <= 0.0 {
                    return Err(HydraulicError::Section(
                        "Unit top width must be positive".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Interpolar linealmente entre dos secciones del mismo tipo
    ///
    /// Si las secciones son de tipos distintos no compatibles, se retorna la
    /// seccion `from` sin modificar. Rectangular y trapezoidal si interpolan
    /// entre si (rectangular = trapezoidal con talud cero).
    pub fn interpolate(from: &PrismaticSection, to: &PrismaticSection, t: f64) -> PrismaticSection {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: f64, b: f64| a + (b - a) * t;

        match (from, to) {
            (
                PrismaticSection::Rectangular { bottom_width: w1 },
                PrismaticSection::Rectangular { bottom_width: w2 },
            ) => PrismaticSection::Rectangular {
                bottom_width: lerp(*w1, *w2),
            },

            (
                PrismaticSection::Trapezoidal {
                    bottom_width: bw1,
                    left_slope: ls1,
                    right_slope: rs1,
                },
                PrismaticSection::Trapezoidal {
                    bottom_width: bw2,
                    left_slope: ls2,
                    right_slope: rs2,
                },
            ) => PrismaticSection::Trapezoidal {
                bottom_width: lerp(*bw1, *bw2),
                left_slope: lerp(*ls1, *ls2),
                right_slope: lerp(*rs1, *rs2),
            },

            (
                PrismaticSection::Triangular {
                    left_slope: ls1,
                    right_slope: rs1,
                },
                PrismaticSection::Triangular {
                    left_slope: ls2,
                    right_slope: rs2,
                },
            ) => PrismaticSection::Triangular {
                left_slope: lerp(*ls1, *ls2),
                right_slope: lerp(*rs1, *rs2),
            },

            (
                PrismaticSection::Circular { diameter: d1 },
                PrismaticSection::Circular { diameter: d2 },
            ) => PrismaticSection::Circular {
                diameter: lerp(*d1, *d2),
            },

            (
                PrismaticSection::Parabolic { unit_top_width: t1 },
                PrismaticSection::Parabolic { unit_top_width: t2 },
            ) => PrismaticSection::Parabolic {
                unit_top_width: lerp(*t1, *t2),
            },

            (
                PrismaticSection::Rectangular { bottom_width: w1 },
                PrismaticSection::Trapezoidal {
                    bottom_width: bw2,
                    left_slope: ls2,
                    right_slope: rs2,
                },
            ) => PrismaticSection::Trapezoidal {
                bottom_width: lerp(*w1, *bw2),
                left_slope: lerp(0.0, *ls2),
                right_slope: lerp(0.0, *rs2),
            },

            (
                PrismaticSection::Trapezoidal {
                    bottom_width: bw1,
                    left_slope: ls1,
                    right_slope: rs1,
                },
                PrismaticSection::Rectangular { bottom_width: w2 },
            ) => PrismaticSection::Trapezoidal {
                bottom_width: lerp(*bw1, *w2),
                left_slope: lerp(*ls1, 0.0),
                right_slope: lerp(*rs1, 0.0),
            },

            _ => from.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Rectangular Section Tests ==========

    #[test]
    fn test_rectangular_hydraulic_properties() {
        let section = PrismaticSection::rectangular(2.0);
        let props = section.hydraulic_properties(1.0);

        // Area = width * depth = 2.0 * 1.0 = 2.0 m²
        assert!((props.area - 2.0).abs() < 1e-9);

        // Wetted perimeter = width + 2*depth = 2.0 + 2*1.0 = 4.0 m
        assert!((props.wetted_perimeter - 4.0).abs() < 1e-9);

        // Hydraulic radius = A/P = 2.0/4.0 = 0.5 m
        assert!((props.hydraulic_radius - 0.5).abs() < 1e-9);

        // Top width = width = 2.0 m
        assert!((props.top_width - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_depth_is_dry() {
        let section = PrismaticSection::trapezoidal(2.0, 1.5);
        let props = section.hydraulic_properties(0.0);

        assert_eq!(props.area, 0.0);
        assert_eq!(props.wetted_perimeter, 0.0);
        assert_eq!(props.top_width, 0.0);
    }

    // ========== Trapezoidal Section Tests ==========

    #[test]
    fn test_trapezoidal_hydraulic_properties() {
        // Symmetric trapezoidal: bottom=2m, slopes=1.5:1, depth=1m
        let section = PrismaticSection::trapezoidal(2.0, 1.5);
        let props = section.hydraulic_properties(1.0);

        // Top width = bottom + depth*(left + right) = 2.0 + 1.0*3.0 = 5.0 m
        assert!((props.top_width - 5.0).abs() < 1e-9);

        // Area = (bottom + z̄*y)*y = (2.0 + 1.5)*1.0 = 3.5 m²
        assert!((props.area - 3.5).abs() < 1e-9);

        // Wetted perimeter = bottom + 2*y*sqrt(1 + z²)
        let expected_perimeter = 2.0 + 2.0 * (1.0_f64 + 1.5_f64.powi(2)).sqrt();
        assert!((props.wetted_perimeter - expected_perimeter).abs() < 1e-9);
    }

    #[test]
    fn test_trapezoidal_asymmetric() {
        let section = PrismaticSection::trapezoidal_asymmetric(3.0, 1.0, 2.0);
        let props = section.hydraulic_properties(1.5);

        // Top width = 3.0 + 1.5*(1.0 + 2.0) = 7.5 m
        assert!((props.top_width - 7.5).abs() < 1e-9);
    }

    // ========== Triangular Section Tests ==========

    #[test]
    fn test_triangular_hydraulic_properties() {
        let section = PrismaticSection::triangular(1.0);
        let props = section.hydraulic_properties(1.0);

        // Top width = depth * (left + right) = 2.0 m
        assert!((props.top_width - 2.0).abs() < 1e-9);

        // Area = z̄ * y² = 1.0 m²
        assert!((props.area - 1.0).abs() < 1e-9);
    }

    // ========== Circular Section Tests ==========

    #[test]
    fn test_circular_full_flow() {
        let section = PrismaticSection::circular(2.0);
        let props = section.hydraulic_properties(2.0);

        // Full flow area = π*r² = π m²
        assert!((props.area - PI).abs() < 1e-9);

        // Full flow perimeter = π*d = 2π m
        assert!((props.wetted_perimeter - 2.0 * PI).abs() < 1e-9);

        // Full pipe has no free surface
        assert_eq!(props.top_width, 0.0);

        // Hydraulic radius for full pipe = d/4 = 0.5 m
        assert!((props.hydraulic_radius - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_circular_half_flow() {
        let section = PrismaticSection::circular(2.0);
        let props = section.hydraulic_properties(1.0);

        // Half flow area = π*r²/2 = π/2 m²
        assert!((props.area - PI / 2.0).abs() < 1e-6);

        // Half flow perimeter = π*r = π m
        assert!((props.wetted_perimeter - PI).abs() < 1e-6);

        // Top width at half depth equals the diameter
        assert!((props.top_width - 2.0).abs() < 1e-6);
    }

    // ========== Parabolic Section Tests ==========

    #[test]
    fn test_parabolic_hydraulic_properties() {
        let section = PrismaticSection::parabolic(4.0);
        let props = section.hydraulic_properties(1.0);

        // At unit depth, top width equals the unit top width
        assert!((props.top_width - 4.0).abs() < 1e-9);

        // Area = (2/3)*T*y = 8/3 m²
        assert!((props.area - 8.0 / 3.0).abs() < 1e-9);
    }

    // ========== Consistency Tests ==========

    #[test]
    fn test_radius_times_perimeter_equals_area() {
        let sections = [
            PrismaticSection::rectangular(3.0),
            PrismaticSection::trapezoidal(2.0, 1.5),
            PrismaticSection::triangular(2.0),
            PrismaticSection::circular(1.2),
            PrismaticSection::parabolic(3.0),
        ];

        for section in &sections {
            for depth in [0.1, 0.5, 1.0, 2.5] {
                let area = section.area(depth);
                let product = section.hydraulic_radius(depth) * section.wetted_perimeter(depth);
                assert!(
                    (product - area).abs() <= 1e-9 * area.max(1.0),
                    "R*P != A for {:?} at depth {}",
                    section,
                    depth
                );
            }
        }
    }

    // ========== Validation Tests ==========

    #[test]
    fn test_validation() {
        assert!(PrismaticSection::rectangular(2.0).validate().is_ok());
        assert!(PrismaticSection::rectangular(-1.0).validate().is_err());
        assert!(PrismaticSection::trapezoidal(2.0, 1.0).validate().is_ok());
        assert!(PrismaticSection::trapezoidal_asymmetric(2.0, -1.0, 1.0)
            .validate()
            .is_err());
        assert!(PrismaticSection::triangular(0.0).validate().is_err());
        assert!(PrismaticSection::circular(-0.5).validate().is_err());
        assert!(PrismaticSection::parabolic(0.0).validate().is_err());
    }

    // ========== Interpolation Tests ==========

    #[test]
    fn test_interpolate_rectangular() {
        let from = PrismaticSection::rectangular(2.0);
        let to = PrismaticSection::rectangular(4.0);

        let mid = PrismaticSection::interpolate(&from, &to, 0.5);
        if let PrismaticSection::Rectangular { bottom_width } = mid {
            assert!((bottom_width - 3.0).abs() < 1e-9);
        } else {
            panic!("Expected Rectangular section");
        }
    }

    #[test]
    fn test_interpolate_rect_to_trap() {
        let from = PrismaticSection::rectangular(2.0);
        let to = PrismaticSection::trapezoidal(2.0, 1.0);

        let mid = PrismaticSection::interpolate(&from, &to, 0.5);
        if let PrismaticSection::Trapezoidal {
            left_slope,
            right_slope,
            ..
        } = mid
        {
            assert!((left_slope - 0.5).abs() < 1e-9);
            assert!((right_slope - 0.5).abs() < 1e-9);
        } else {
            panic!("Expected Trapezoidal section");
        }
    }

    #[test]
    fn test_interpolate_endpoints() {
        let from = PrismaticSection::circular(1.0);
        let to = PrismaticSection::circular(2.0);

        assert_eq!(PrismaticSection::interpolate(&from, &to, 0.0), from);
        assert_eq!(PrismaticSection::interpolate(&from, &to, 1.0), to);
    }
}
