//! Characteristic Curves - Curvas Caracteristicas de Secciones
//!
//! Genera las curvas fundamentales de una seccion prismatica para un
//! caudal dado:
//! - Curva de energia especifica E(y) con su minimo en la profundidad
//!   critica y ramas sub y supercritica
//! - Curva de momentum especifico M(y), base del calculo de profundidades
//!   conjugadas
//!
//! # Referencia:
//! - Chow, V.T. (1959) Open-Channel Hydraulics
//! - Henderson, F.M. (1966) Open Channel Flow

use crate::prismatic::PrismaticSection;
use crate::uniform::{FlowRegime, HydraulicsEngine, SolverConfig};
use crate::G;
use serde::{Deserialize, Serialize};

/// Punto de la curva de energia especifica
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificEnergyPoint {
    /// Profundidad y (m)
    pub depth: f64,
    /// Energia especifica E = y + V²/2g (m)
    pub specific_energy: f64,
    /// Velocidad (m/s)
    pub velocity: f64,
    /// Carga de velocidad V²/2g (m)
    pub velocity_head: f64,
    /// Numero de Froude
    pub froude: f64,
    /// Regimen de flujo
    pub flow_regime: FlowRegime,
}

/// Curva de energia especifica para un caudal dado
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificEnergyCurve {
    /// Caudal (m^3/s)
    pub discharge: f64,
    /// Puntos de la curva en profundidad creciente
    pub points: Vec<SpecificEnergyPoint>,
    /// Profundidad critica (m)
    pub critical_depth: f64,
    /// Energia minima, en la profundidad critica (m)
    pub minimum_energy: f64,
    /// Velocidad critica (m/s)
    pub critical_velocity: f64,
}

impl SpecificEnergyCurve {
    /// Rama subcritica (y > yc)
    pub fn subcritical_branch(&self) -> impl Iterator<Item = &SpecificEnergyPoint> {
        let yc = self.critical_depth;
        self.points.iter().filter(move |p| p.depth > yc)
    }

    /// Rama supercritica (y < yc)
    pub fn supercritical_branch(&self) -> impl Iterator<Item = &SpecificEnergyPoint> {
        let yc = self.critical_depth;
        self.points.iter().filter(move |p| p.depth < yc)
    }

    /// Profundidad alterna: el otro cruce de la curva con la energia dada
    pub fn alternate_depth(&self, depth: f64) -> Option<f64> {
        let target = self
            .points
            .iter()
            .min_by(|a, b| {
                (a.depth - depth).abs().total_cmp(&(b.depth - depth).abs())
            })?
            .specific_energy;

        let candidates: Vec<&SpecificEnergyPoint> = if depth > self.critical_depth {
            self.supercritical_branch().collect()
        } else {
            self.subcritical_branch().collect()
        };

        candidates
            .into_iter()
            .min_by(|a, b| {
                (a.specific_energy - target)
                    .abs()
                    .total_cmp(&(b.specific_energy - target).abs())
            })
            .map(|p| p.depth)
    }
}

/// Punto de la curva de momentum especifico
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificMomentumPoint {
    /// Profundidad y (m)
    pub depth: f64,
    /// Momentum especifico M = Q²/(gA) + A ȳ (m³)
    pub specific_momentum: f64,
    /// Componente dinamica Q²/(gA) (m³)
    pub momentum_component: f64,
    /// Componente de presion hidrostatica A ȳ (m³)
    pub pressure_component: f64,
    /// Numero de Froude
    pub froude: f64,
}

/// Curva de momentum especifico para un caudal dado
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificMomentumCurve {
    /// Caudal (m^3/s)
    pub discharge: f64,
    /// Puntos de la curva en profundidad creciente
    pub points: Vec<SpecificMomentumPoint>,
    /// Profundidad critica (m)
    pub critical_depth: f64,
    /// Momentum minimo (m³)
    pub minimum_momentum: f64,
}

/// Generador de curvas caracteristicas para una seccion prismatica
pub struct CurveGenerator {
    section: PrismaticSection,
}

impl CurveGenerator {
    /// Crear generador para una seccion
    pub fn new(section: PrismaticSection) -> Self {
        Self { section }
    }

    /// Profundidad del centroide aproximada: ȳ ≈ A / (2T)
    fn centroid_depth(&self, depth: f64) -> f64 {
        let top = self.section.top_width(depth);
        if top > 0.0 {
            self.section.area(depth) / (2.0 * top)
        } else {
            depth / 2.0
        }
    }

    /// Rango de profundidades de muestreo: hasta 3 veces la critica
    fn depth_range(&self, discharge: f64) -> (f64, f64) {
        let yc = HydraulicsEngine::critical_depth(&self.section, discharge, &SolverConfig::default())
            .value
            .max(0.05);
        let mut max_depth = 3.0 * yc;
        if let Some(ceiling) = self.section.depth_ceiling() {
            max_depth = max_depth.min(ceiling);
        }
        (0.02 * yc, max_depth)
    }

    /// Generar la curva de energia especifica E(y)
    pub fn specific_energy_curve(&self, discharge: f64, num_points: usize) -> SpecificEnergyCurve {
        let solver_config = SolverConfig::default();
        let critical_depth =
            HydraulicsEngine::critical_depth(&self.section, discharge, &solver_config).value;
        let critical_area = self.section.area(critical_depth);
        let critical_velocity = if critical_area > 0.0 {
            discharge / critical_area
        } else {
            0.0
        };
        let minimum_energy = critical_depth + critical_velocity.powi(2) / (2.0 * G);

        let (min_depth, max_depth) = self.depth_range(discharge);
        let samples = num_points.max(2);
        let mut points = Vec::with_capacity(samples);

        for i in 0..samples {
            let t = i as f64 / (samples - 1) as f64;
            let depth = min_depth + (max_depth - min_depth) * t;
            let props = self.section.hydraulic_properties(depth);
            let velocity = if props.area > 0.0 {
                discharge / props.area
            } else {
                0.0
            };
            let velocity_head = velocity.powi(2) / (2.0 * G);
            let froude = HydraulicsEngine::froude_number(velocity, props.hydraulic_depth);

            points.push(SpecificEnergyPoint {
                depth,
                specific_energy: depth + velocity_head,
                velocity,
                velocity_head,
                froude,
                flow_regime: FlowRegime::from_froude(froude),
            });
        }

        SpecificEnergyCurve {
            discharge,
            points,
            critical_depth,
            minimum_energy,
            critical_velocity,
        }
    }

    /// Generar la curva de momentum especifico M(y)
    pub fn specific_momentum_curve(
        &self,
        discharge: f64,
        num_points: usize,
    ) -> SpecificMomentumCurve {
        let solver_config = SolverConfig::default();
        let critical_depth =
            HydraulicsEngine::critical_depth(&self.section, discharge, &solver_config).value;

        let (min_depth, max_depth) = self.depth_range(discharge);
        let samples = num_points.max(2);
        let mut points = Vec::with_capacity(samples);
        let mut minimum_momentum = f64::INFINITY;

        for i in 0..samples {
            let t = i as f64 / (samples - 1) as f64;
            let depth = min_depth + (max_depth - min_depth) * t;
            let props = self.section.hydraulic_properties(depth);
            if props.area <= 0.0 {
                continue;
            }

            let momentum_component = discharge.powi(2) / (G * props.area);
            let pressure_component = props.area * self.centroid_depth(depth);
            let specific_momentum = momentum_component + pressure_component;
            minimum_momentum = minimum_momentum.min(specific_momentum);

            let velocity = discharge / props.area;
            let froude = HydraulicsEngine::froude_number(velocity, props.hydraulic_depth);

            points.push(SpecificMomentumPoint {
                depth,
                specific_momentum,
                momentum_component,
                pressure_component,
                froude,
            });
        }

        SpecificMomentumCurve {
            discharge,
            points,
            critical_depth,
            minimum_momentum: if minimum_momentum.is_finite() {
                minimum_momentum
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_minimum_at_critical_depth() {
        let generator = CurveGenerator::new(PrismaticSection::rectangular(3.0));
        let curve = generator.specific_energy_curve(5.0, 200);

        // Every sampled energy is at or above the minimum at yc
        assert!(curve
            .points
            .iter()
            .all(|p| p.specific_energy >= curve.minimum_energy - 1e-6));

        // For rectangular sections Emin = 1.5 yc
        assert!((curve.minimum_energy - 1.5 * curve.critical_depth).abs() < 1e-6);
    }

    #[test]
    fn test_branches_split_at_critical() {
        let generator = CurveGenerator::new(PrismaticSection::trapezoidal(2.0, 1.5));
        let curve = generator.specific_energy_curve(10.0, 100);

        assert!(curve.subcritical_branch().all(|p| p.froude < 1.05));
        assert!(curve.supercritical_branch().all(|p| p.froude > 0.95));
    }

    #[test]
    fn test_momentum_minimum_near_critical() {
        let generator = CurveGenerator::new(PrismaticSection::rectangular(3.0));
        let curve = generator.specific_momentum_curve(5.0, 400);

        let best = curve
            .points
            .iter()
            .min_by(|a, b| a.specific_momentum.total_cmp(&b.specific_momentum))
            .expect("curve has points");
        assert!((best.depth - curve.critical_depth).abs() / curve.critical_depth < 0.05);
    }
}
