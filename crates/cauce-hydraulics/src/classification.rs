//! Profile Classification - Clasificacion de Perfiles GVF
//!
//! Clasifica la pendiente del canal (suave, fuerte, critica, horizontal,
//! adversa) y el tipo de perfil de flujo gradualmente variado (M1..A3) a
//! partir de la profundidad de agua y, la profundidad normal yn y la
//! profundidad critica yc.
//!
//! # Referencia:
//! - Chow, V.T. (1959) Open-Channel Hydraulics, cap. 9

use serde::{Deserialize, Serialize};

/// Clasificacion de la pendiente del canal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlopeClass {
    /// Pendiente suave: yn > yc
    Mild,
    /// Pendiente fuerte: yn < yc
    Steep,
    /// Pendiente critica: yn ≈ yc
    Critical,
    /// Pendiente horizontal: S = 0 (yn no existe)
    Horizontal,
    /// Pendiente adversa: S < 0
    Adverse,
}

impl SlopeClass {
    /// Clasificar la pendiente a partir de yn y yc
    ///
    /// `normal_depth` es `None` (o no finito) cuando la pendiente no
    /// sostiene flujo uniforme (horizontal o adversa con yn infinita).
    pub fn classify(slope: f64, normal_depth: Option<f64>, critical_depth: f64) -> Self {
        if slope < 0.0 {
            return SlopeClass::Adverse;
        }
        let yn = match normal_depth {
            Some(yn) if yn.is_finite() => yn,
            _ => return SlopeClass::Horizontal,
        };
        if slope == 0.0 {
            return SlopeClass::Horizontal;
        }
        if critical_depth > 0.0 && (yn / critical_depth - 1.0).abs() < 0.02 {
            SlopeClass::Critical
        } else if yn > critical_depth {
            SlopeClass::Mild
        } else {
            SlopeClass::Steep
        }
    }

    /// Etiqueta para reportes
    pub fn label(&self) -> &'static str {
        match self {
            SlopeClass::Mild => "Mild",
            SlopeClass::Steep => "Steep",
            SlopeClass::Critical => "Critical",
            SlopeClass::Horizontal => "Horizontal",
            SlopeClass::Adverse => "Adverse",
        }
    }
}

/// Tendencia de la profundidad a lo largo del perfil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepthTrend {
    Increasing,
    Decreasing,
}

/// Profundidad a la que tiende asintoticamente el perfil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepthAsymptote {
    /// Tiende a la profundidad normal
    Normal,
    /// Tiende a la profundidad critica
    Critical,
}

/// Tipo de perfil de flujo gradualmente variado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileType {
    // Pendiente suave (yn > yc)
    M1, // y > yn > yc - Remanso, flujo subcritico
    M2, // yn > y > yc - Drawdown, flujo subcritico
    M3, // yn > yc > y - Flujo supercritico

    // Pendiente fuerte (yc > yn)
    S1, // y > yc > yn - Remanso aguas arriba de salto
    S2, // yc > y > yn - Drawdown, flujo supercritico
    S3, // yc > yn > y - Flujo supercritico bajo yn

    // Pendiente critica (yc = yn)
    C1, // y > yc = yn
    C3, // yc = yn > y

    // Pendiente horizontal (S = 0)
    H2, // y > yc
    H3, // y < yc

    // Pendiente adversa (S < 0)
    A2, // y > yc
    A3, // y < yc
}

impl ProfileType {
    /// Determinar tipo de perfil segun clase de pendiente y profundidades
    pub fn classify(
        slope_class: SlopeClass,
        water_depth: f64,
        normal_depth: f64,
        critical_depth: f64,
    ) -> Option<Self> {
        let y = water_depth;
        let yn = normal_depth;
        let yc = critical_depth;

        if y <= 0.0 {
            return None;
        }

        match slope_class {
            SlopeClass::Adverse => {
                if y > yc {
                    Some(Self::A2)
                } else {
                    Some(Self::A3)
                }
            }
            SlopeClass::Horizontal => {
                if y > yc {
                    Some(Self::H2)
                } else {
                    Some(Self::H3)
                }
            }
            SlopeClass::Mild => {
                if y > yn {
                    Some(Self::M1)
                } else if y > yc {
                    Some(Self::M2)
                } else {
                    Some(Self::M3)
                }
            }
            SlopeClass::Steep => {
                if y > yc {
                    Some(Self::S1)
                } else if y > yn {
                    Some(Self::S2)
                } else {
                    Some(Self::S3)
                }
            }
            SlopeClass::Critical => {
                if y > yc {
                    Some(Self::C1)
                } else {
                    Some(Self::C3)
                }
            }
        }
    }

    /// Tendencia de la profundidad en la direccion del flujo
    pub fn depth_trend(&self) -> DepthTrend {
        match self {
            ProfileType::M1
            | ProfileType::M3
            | ProfileType::S1
            | ProfileType::S3
            | ProfileType::C1
            | ProfileType::C3
            | ProfileType::H3
            | ProfileType::A3 => DepthTrend::Increasing,
            ProfileType::M2 | ProfileType::S2 | ProfileType::H2 | ProfileType::A2 => {
                DepthTrend::Decreasing
            }
        }
    }

    /// Profundidad a la que tiende el perfil; usada por el solver
    /// prismatico para elegir la profundidad terminal cuando el usuario
    /// no la entrega
    pub fn approaches(&self) -> DepthAsymptote {
        match self {
            ProfileType::M1 | ProfileType::S2 | ProfileType::S3 => DepthAsymptote::Normal,
            ProfileType::M2
            | ProfileType::M3
            | ProfileType::S1
            | ProfileType::C1
            | ProfileType::C3
            | ProfileType::H2
            | ProfileType::H3
            | ProfileType::A2
            | ProfileType::A3 => DepthAsymptote::Critical,
        }
    }

    /// Etiqueta corta (M1, S2, ...)
    pub fn label(&self) -> &'static str {
        match self {
            ProfileType::M1 => "M1",
            ProfileType::M2 => "M2",
            ProfileType::M3 => "M3",
            ProfileType::S1 => "S1",
            ProfileType::S2 => "S2",
            ProfileType::S3 => "S3",
            ProfileType::C1 => "C1",
            ProfileType::C3 => "C3",
            ProfileType::H2 => "H2",
            ProfileType::H3 => "H3",
            ProfileType::A2 => "A2",
            ProfileType::A3 => "A3",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slope_classification() {
        assert_eq!(
            SlopeClass::classify(0.001, Some(1.0), 0.7),
            SlopeClass::Mild
        );
        assert_eq!(
            SlopeClass::classify(0.01, Some(0.5), 0.7),
            SlopeClass::Steep
        );
        assert_eq!(
            SlopeClass::classify(0.005, Some(0.70), 0.695),
            SlopeClass::Critical
        );
        assert_eq!(SlopeClass::classify(0.0, Some(1.0), 0.7), SlopeClass::Horizontal);
        assert_eq!(SlopeClass::classify(0.001, None, 0.7), SlopeClass::Horizontal);
        assert_eq!(SlopeClass::classify(-0.001, None, 0.7), SlopeClass::Adverse);
    }

    #[test]
    fn test_mild_profiles() {
        // M1: y > yn > yc
        assert_eq!(
            ProfileType::classify(SlopeClass::Mild, 1.5, 1.0, 0.7),
            Some(ProfileType::M1)
        );
        // M2: yn > y > yc
        assert_eq!(
            ProfileType::classify(SlopeClass::Mild, 0.85, 1.0, 0.7),
            Some(ProfileType::M2)
        );
        // M3: yn > yc > y
        assert_eq!(
            ProfileType::classify(SlopeClass::Mild, 0.4, 1.0, 0.7),
            Some(ProfileType::M3)
        );
    }

    #[test]
    fn test_steep_profiles() {
        assert_eq!(
            ProfileType::classify(SlopeClass::Steep, 1.0, 0.5, 0.7),
            Some(ProfileType::S1)
        );
        assert_eq!(
            ProfileType::classify(SlopeClass::Steep, 0.6, 0.5, 0.7),
            Some(ProfileType::S2)
        );
        assert_eq!(
            ProfileType::classify(SlopeClass::Steep, 0.3, 0.5, 0.7),
            Some(ProfileType::S3)
        );
    }

    #[test]
    fn test_horizontal_and_adverse_profiles() {
        assert_eq!(
            ProfileType::classify(SlopeClass::Horizontal, 1.0, f64::INFINITY, 0.7),
            Some(ProfileType::H2)
        );
        assert_eq!(
            ProfileType::classify(SlopeClass::Adverse, 0.4, f64::INFINITY, 0.7),
            Some(ProfileType::A3)
        );
    }

    #[test]
    fn test_m2_decreases_toward_critical() {
        assert_eq!(ProfileType::M2.depth_trend(), DepthTrend::Decreasing);
        assert_eq!(ProfileType::M2.approaches(), DepthAsymptote::Critical);
    }

    #[test]
    fn test_m1_approaches_normal_upstream() {
        assert_eq!(ProfileType::M1.depth_trend(), DepthTrend::Increasing);
        assert_eq!(ProfileType::M1.approaches(), DepthAsymptote::Normal);
    }
}
