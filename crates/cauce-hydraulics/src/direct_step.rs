//! Direct Step Method - Paso Directo para Canales Prismaticos
//!
//! Calcula perfiles de flujo gradualmente variado en canales prismaticos
//! integrando la ecuacion de energia entre profundidades conocidas:
//!
//! Δx = (E_i - E_{i-1}) / (S0 - S̄f)
//!
//! La profundidad se discretiza linealmente entre la profundidad inicial y
//! la final; el eje de estaciones se construye acumulando |Δx|. Pasos con
//! Δx no finito o mayor a 10 km se descartan (ocurren cuando la pendiente
//! de friccion iguala a la del fondo).

use crate::classification::{DepthAsymptote, ProfileType, SlopeClass};
use crate::prismatic::PrismaticSection;
use crate::uniform::{HydraulicsEngine, SolverConfig};
use crate::{HydraulicError, Result, G};
use serde::{Deserialize, Serialize};

/// Paso maximo aceptado en la integracion (m)
const MAX_STEP_LENGTH: f64 = 10_000.0;

/// Metodo de promedio de la pendiente de friccion entre dos secciones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FrictionAveraging {
    /// Promedio aritmetico (S1 + S2) / 2
    #[default]
    Arithmetic,
    /// Promedio geometrico sqrt(S1 * S2)
    Geometric,
    /// Promedio armonico 2 S1 S2 / (S1 + S2)
    Harmonic,
}

impl FrictionAveraging {
    /// Promediar dos pendientes de friccion
    pub fn average(&self, sf1: f64, sf2: f64) -> f64 {
        match self {
            FrictionAveraging::Arithmetic => 0.5 * (sf1 + sf2),
            FrictionAveraging::Geometric => {
                if sf1 > 0.0 && sf2 > 0.0 {
                    (sf1 * sf2).sqrt()
                } else {
                    0.5 * (sf1 + sf2)
                }
            }
            FrictionAveraging::Harmonic => {
                let sum = sf1 + sf2;
                if sf1 > 0.0 && sf2 > 0.0 && sum > 0.0 {
                    2.0 * sf1 * sf2 / sum
                } else {
                    0.5 * sum
                }
            }
        }
    }
}

/// Configuracion del metodo de paso directo
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectStepConfig {
    /// Numero de pasos de integracion
    pub steps: usize,
    /// Metodo de promedio de la pendiente de friccion
    pub averaging: FrictionAveraging,
}

impl Default for DirectStepConfig {
    fn default() -> Self {
        Self {
            steps: 50,
            averaging: FrictionAveraging::Arithmetic,
        }
    }
}

/// Muestra del perfil de paso directo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectStepPoint {
    /// Estacion acumulada (m)
    pub station: f64,
    /// Profundidad de agua (m)
    pub water_depth: f64,
    /// Velocidad (m/s)
    pub velocity: f64,
    /// Energia especifica (m)
    pub specific_energy: f64,
    /// Pendiente de friccion (m/m)
    pub friction_slope: f64,
    /// Numero de Froude
    pub froude: f64,
    /// Tipo de perfil en esta muestra
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<ProfileType>,
}

/// Resultado del metodo de paso directo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectStepResult {
    /// Muestras del perfil, en orden de integracion
    pub points: Vec<DirectStepPoint>,
    /// Clasificacion de la pendiente
    pub slope_class: SlopeClass,
    /// Tipo de perfil de la primera muestra
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<ProfileType>,
    /// Longitud total integrada (m)
    pub total_length: f64,
    /// Profundidad normal (m), si la pendiente es positiva
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_depth: Option<f64>,
    /// Profundidad critica (m)
    pub critical_depth: f64,
    /// Caudal (m^3/s)
    pub discharge: f64,
    /// Pendiente de fondo (m/m)
    pub slope: f64,
    /// Rugosidad de Manning
    pub manning_n: f64,
    /// Advertencias
    pub warnings: Vec<String>,
}

/// Calcular un perfil por paso directo
///
/// Si `end_depth` es `None`, la profundidad terminal se elige segun el
/// tipo de perfil: se avanza hasta el 1% de la asintota (yn o yc).
pub fn direct_step(
    section: &PrismaticSection,
    start_depth: f64,
    end_depth: Option<f64>,
    discharge: f64,
    slope: f64,
    manning_n: f64,
    config: &DirectStepConfig,
) -> Result<DirectStepResult> {
    section.validate()?;

    if start_depth <= 0.0 {
        return Err(HydraulicError::InvalidParameter(
            "Start depth must be positive".into(),
        ));
    }
    if config.steps == 0 {
        return Err(HydraulicError::InvalidParameter(
            "Step count must be positive".into(),
        ));
    }

    let solver_config = SolverConfig::default();
    let mut warnings = Vec::new();

    let critical_depth = HydraulicsEngine::critical_depth(section, discharge, &solver_config).value;
    let normal_depth = if slope > 0.0 {
        Some(HydraulicsEngine::normal_depth(section, discharge, slope, manning_n, &solver_config)?.value)
    } else {
        None
    };
    let slope_class = SlopeClass::classify(slope, normal_depth, critical_depth);

    if discharge <= 0.0 {
        warnings.push("Zero discharge - profile is the dry bed".to_string());
        return Ok(DirectStepResult {
            points: Vec::new(),
            slope_class,
            profile_type: None,
            total_length: 0.0,
            normal_depth,
            critical_depth,
            discharge,
            slope,
            manning_n,
            warnings,
        });
    }

    let profile_type = ProfileType::classify(
        slope_class,
        start_depth,
        normal_depth.unwrap_or(f64::INFINITY),
        critical_depth,
    );

    let end_depth = match end_depth {
        Some(depth) if depth > 0.0 => depth,
        Some(_) => {
            return Err(HydraulicError::InvalidParameter(
                "End depth must be positive".into(),
            ))
        }
        None => {
            // Aproximarse al 1% de la asintota del perfil
            let target = match profile_type.map(|p| p.approaches()) {
                Some(DepthAsymptote::Normal) => normal_depth.unwrap_or(critical_depth),
                _ => critical_depth,
            };
            if target <= 0.0 {
                return Err(HydraulicError::Calculation(
                    "Cannot pick a terminal depth for this profile".into(),
                ));
            }
            target + 0.01 * (start_depth - target)
        }
    };

    let samples = config.steps + 1;
    let mut points: Vec<DirectStepPoint> = Vec::with_capacity(samples);
    let mut station = 0.0;
    let mut skipped_steps = 0usize;

    let mut previous: Option<(f64, f64)> = None; // (E, Sf)

    for i in 0..samples {
        let t = i as f64 / config.steps as f64;
        let depth = start_depth + (end_depth - start_depth) * t;
        let props = section.hydraulic_properties(depth);

        let velocity = if props.area > 0.0 {
            discharge / props.area
        } else {
            0.0
        };
        let specific_energy = depth + velocity.powi(2) / (2.0 * G);
        let conveyance = if props.area > 0.0 && props.hydraulic_radius > 0.0 {
            (1.0 / manning_n) * props.area * props.hydraulic_radius.powf(2.0 / 3.0)
        } else {
            0.0
        };
        let friction_slope = if conveyance > 0.0 {
            (discharge / conveyance).powi(2)
        } else {
            0.0
        };
        let froude = HydraulicsEngine::froude_number(velocity, props.hydraulic_depth);

        if let Some((prev_energy, prev_friction)) = previous {
            let averaged = config.averaging.average(prev_friction, friction_slope);
            let dx = (specific_energy - prev_energy) / (slope - averaged);
            if dx.is_finite() && dx.abs() <= MAX_STEP_LENGTH {
                station += dx.abs();
            } else {
                skipped_steps += 1;
            }
        }

        points.push(DirectStepPoint {
            station,
            water_depth: depth,
            velocity,
            specific_energy,
            friction_slope,
            froude,
            profile_type: ProfileType::classify(
                slope_class,
                depth,
                normal_depth.unwrap_or(f64::INFINITY),
                critical_depth,
            ),
        });

        previous = Some((specific_energy, friction_slope));
    }

    if skipped_steps > 0 {
        warnings.push("Some integration steps were skipped near uniform depth".to_string());
    }

    Ok(DirectStepResult {
        total_length: station,
        points,
        slope_class,
        profile_type,
        normal_depth,
        critical_depth,
        discharge,
        slope,
        manning_n,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friction_averaging_methods() {
        let arithmetic = FrictionAveraging::Arithmetic.average(0.001, 0.003);
        let geometric = FrictionAveraging::Geometric.average(0.001, 0.003);
        let harmonic = FrictionAveraging::Harmonic.average(0.001, 0.003);

        assert!((arithmetic - 0.002).abs() < 1e-12);
        assert!((geometric - (0.001_f64 * 0.003).sqrt()).abs() < 1e-12);
        assert!((harmonic - 2.0 * 0.001 * 0.003 / 0.004).abs() < 1e-12);
        // harmonic <= geometric <= arithmetic
        assert!(harmonic <= geometric && geometric <= arithmetic);
    }

    #[test]
    fn test_m1_profile_trapezoidal() {
        // b=2 m, z=1.5, S=0.002, n=0.025, Q=10 m³/s
        let section = PrismaticSection::trapezoidal(2.0, 1.5);
        let config = DirectStepConfig::default();
        let solver = SolverConfig::default();

        let yn = HydraulicsEngine::normal_depth(&section, 10.0, 0.002, 0.025, &solver)
            .unwrap()
            .value;
        let yc = HydraulicsEngine::critical_depth(&section, 10.0, &solver).value;
        assert!(yn > yc, "mild channel expected");

        let result = direct_step(&section, 1.5 * yn, None, 10.0, 0.002, 0.025, &config).unwrap();

        assert_eq!(result.slope_class, SlopeClass::Mild);
        assert_eq!(result.profile_type, Some(ProfileType::M1));
        assert_eq!(result.points.len(), 51);

        // Depth decreases monotonically toward normal depth
        assert!(result
            .points
            .windows(2)
            .all(|w| w[1].water_depth < w[0].water_depth));
        assert!(result.points.last().map(|p| p.water_depth > yn).unwrap_or(false));

        // Stations accumulate forward
        assert!(result
            .points
            .windows(2)
            .all(|w| w[1].station >= w[0].station));
        assert!(result.total_length > 0.0);
    }

    #[test]
    fn test_explicit_end_depth() {
        let section = PrismaticSection::rectangular(3.0);
        let config = DirectStepConfig {
            steps: 20,
            averaging: FrictionAveraging::Geometric,
        };

        let result =
            direct_step(&section, 1.4, Some(1.0), 5.0, 0.001, 0.013, &config).unwrap();
        assert_eq!(result.points.len(), 21);
        assert!((result.points[0].water_depth - 1.4).abs() < 1e-12);
        assert!((result.points[20].water_depth - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_discharge_gives_empty_profile() {
        let section = PrismaticSection::rectangular(3.0);
        let result = direct_step(
            &section,
            1.0,
            Some(0.5),
            0.0,
            0.001,
            0.013,
            &DirectStepConfig::default(),
        )
        .unwrap();
        assert!(result.points.is_empty());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_bad_start_depth_is_rejected() {
        let section = PrismaticSection::rectangular(3.0);
        let result = direct_step(
            &section,
            0.0,
            None,
            5.0,
            0.001,
            0.013,
            &DirectStepConfig::default(),
        );
        assert!(result.is_err());
    }
}
