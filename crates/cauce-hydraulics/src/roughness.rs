//! Roughness Tables - Catalogos de Rugosidad y Materiales
//!
//! Tablas estaticas de referencia para diseno de canales:
//! - Rugosidad de Manning por material y condicion
//! - Velocidad y esfuerzo cortante permisibles por material de revestimiento
//! - Taludes recomendados
//! - Bordo libre recomendado en funcion del caudal
//!
//! Valores tomados de Chow (1959) y USBR Design Standards. Son guias de
//! reporte, no limites que el motor imponga.

use serde::{Deserialize, Serialize};

/// Material o condicion del contorno de un canal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelMaterial {
    /// Concreto con acabado liso
    ConcreteFinished,
    /// Concreto sin acabado
    ConcreteUnfinished,
    /// Mamposteria de piedra
    StoneMasonry,
    /// Tierra excavada, recta y limpia
    EarthClean,
    /// Tierra con pasto corto y algo de maleza
    EarthGrassy,
    /// Tierra sinuosa con maleza densa
    EarthWeedy,
    /// Lecho de grava
    GravelBed,
    /// Lecho de cantos rodados
    CobbleBed,
    /// Cauce natural limpio y recto
    NaturalClean,
    /// Cauce natural con pozas y vegetacion
    NaturalIrregular,
    /// Llanura de inundacion con vegetacion densa
    FloodplainVegetated,
}

impl ChannelMaterial {
    /// Rango de rugosidad de Manning (minimo, normal, maximo)
    pub fn manning_range(&self) -> (f64, f64, f64) {
        match self {
            ChannelMaterial::ConcreteFinished => (0.011, 0.013, 0.015),
            ChannelMaterial::ConcreteUnfinished => (0.014, 0.017, 0.020),
            ChannelMaterial::StoneMasonry => (0.017, 0.025, 0.030),
            ChannelMaterial::EarthClean => (0.016, 0.022, 0.025),
            ChannelMaterial::EarthGrassy => (0.022, 0.027, 0.033),
            ChannelMaterial::EarthWeedy => (0.025, 0.030, 0.040),
            ChannelMaterial::GravelBed => (0.022, 0.025, 0.030),
            ChannelMaterial::CobbleBed => (0.030, 0.040, 0.050),
            ChannelMaterial::NaturalClean => (0.025, 0.030, 0.033),
            ChannelMaterial::NaturalIrregular => (0.033, 0.045, 0.060),
            ChannelMaterial::FloodplainVegetated => (0.050, 0.070, 0.100),
        }
    }

    /// Rugosidad de Manning tipica
    pub fn manning_n(&self) -> f64 {
        self.manning_range().1
    }

    /// Velocidad maxima permisible (m/s) antes de erosion
    pub fn permissible_velocity(&self) -> f64 {
        match self {
            ChannelMaterial::ConcreteFinished => 6.0,
            ChannelMaterial::ConcreteUnfinished => 5.0,
            ChannelMaterial::StoneMasonry => 4.0,
            ChannelMaterial::EarthClean => 0.9,
            ChannelMaterial::EarthGrassy => 1.2,
            ChannelMaterial::EarthWeedy => 1.0,
            ChannelMaterial::GravelBed => 1.5,
            ChannelMaterial::CobbleBed => 2.5,
            ChannelMaterial::NaturalClean => 1.2,
            ChannelMaterial::NaturalIrregular => 1.0,
            ChannelMaterial::FloodplainVegetated => 0.8,
        }
    }

    /// Esfuerzo cortante maximo permisible (Pa)
    pub fn permissible_shear(&self) -> f64 {
        match self {
            ChannelMaterial::ConcreteFinished => 380.0,
            ChannelMaterial::ConcreteUnfinished => 300.0,
            ChannelMaterial::StoneMasonry => 190.0,
            ChannelMaterial::EarthClean => 3.6,
            ChannelMaterial::EarthGrassy => 10.0,
            ChannelMaterial::EarthWeedy => 7.2,
            ChannelMaterial::GravelBed => 15.0,
            ChannelMaterial::CobbleBed => 45.0,
            ChannelMaterial::NaturalClean => 7.5,
            ChannelMaterial::NaturalIrregular => 6.0,
            ChannelMaterial::FloodplainVegetated => 12.0,
        }
    }

    /// Talud recomendado (H:V) para canales excavados en este material
    pub fn recommended_side_slope(&self) -> f64 {
        match self {
            ChannelMaterial::ConcreteFinished | ChannelMaterial::ConcreteUnfinished => 0.0,
            ChannelMaterial::StoneMasonry => 0.5,
            ChannelMaterial::EarthClean | ChannelMaterial::EarthGrassy => 1.5,
            ChannelMaterial::EarthWeedy => 2.0,
            ChannelMaterial::GravelBed => 1.5,
            ChannelMaterial::CobbleBed => 1.5,
            ChannelMaterial::NaturalClean
            | ChannelMaterial::NaturalIrregular
            | ChannelMaterial::FloodplainVegetated => 2.5,
        }
    }
}

/// Bordo libre recomendado (m) en funcion del caudal de diseno
///
/// Guia USBR para canales revestidos: crece con el caudal hasta
/// estabilizarse cerca de 0.9 m para canales grandes.
pub fn freeboard_estimate(discharge: f64) -> f64 {
    if discharge < 1.5 {
        0.30
    } else if discharge < 15.0 {
        0.50
    } else if discharge < 85.0 {
        0.75
    } else {
        0.90
    }
}

/// Resultado de comparar un flujo contra los limites del material
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiningCheck {
    /// Material evaluado
    pub material: ChannelMaterial,
    /// Velocidad calculada (m/s)
    pub velocity: f64,
    /// Velocidad permisible (m/s)
    pub permissible_velocity: f64,
    /// Esfuerzo cortante calculado (Pa)
    pub shear: f64,
    /// Esfuerzo cortante permisible (Pa)
    pub permissible_shear: f64,
    /// La velocidad esta dentro del limite?
    pub velocity_ok: bool,
    /// El esfuerzo cortante esta dentro del limite?
    pub shear_ok: bool,
    /// Advertencias
    pub warnings: Vec<String>,
}

impl LiningCheck {
    /// Evaluar velocidad y cortante contra los limites de un material
    pub fn evaluate(material: ChannelMaterial, velocity: f64, shear: f64) -> Self {
        let permissible_velocity = material.permissible_velocity();
        let permissible_shear = material.permissible_shear();
        let velocity_ok = velocity <= permissible_velocity;
        let shear_ok = shear <= permissible_shear;

        let mut warnings = Vec::new();
        if !velocity_ok {
            warnings.push("Velocity exceeds permissible for lining".to_string());
        }
        if !shear_ok {
            warnings.push("Shear stress exceeds permissible for lining".to_string());
        }

        Self {
            material,
            velocity,
            permissible_velocity,
            shear,
            permissible_shear,
            velocity_ok,
            shear_ok,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manning_ranges_are_ordered() {
        let materials = [
            ChannelMaterial::ConcreteFinished,
            ChannelMaterial::EarthClean,
            ChannelMaterial::NaturalIrregular,
            ChannelMaterial::FloodplainVegetated,
        ];
        for material in materials {
            let (min, normal, max) = material.manning_range();
            assert!(min > 0.0);
            assert!(min <= normal && normal <= max);
        }
    }

    #[test]
    fn test_concrete_tolerates_more_than_earth() {
        assert!(
            ChannelMaterial::ConcreteFinished.permissible_velocity()
                > ChannelMaterial::EarthClean.permissible_velocity()
        );
        assert!(
            ChannelMaterial::ConcreteFinished.permissible_shear()
                > ChannelMaterial::EarthClean.permissible_shear()
        );
    }

    #[test]
    fn test_freeboard_grows_with_discharge() {
        assert!(freeboard_estimate(1.0) < freeboard_estimate(10.0));
        assert!(freeboard_estimate(10.0) < freeboard_estimate(50.0));
        assert!(freeboard_estimate(50.0) < freeboard_estimate(200.0));
    }

    #[test]
    fn test_lining_check_flags_excess_velocity() {
        let check = LiningCheck::evaluate(ChannelMaterial::EarthClean, 2.0, 1.0);
        assert!(!check.velocity_ok);
        assert!(check.shear_ok);
        assert_eq!(check.warnings.len(), 1);
    }
}
