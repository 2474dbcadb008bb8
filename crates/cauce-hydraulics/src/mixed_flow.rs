//! Mixed Flow - Perfiles de Regimen Mixto y Salto Hidraulico
//!
//! Un perfil de regimen mixto se construye con dos corridas del paso
//! estandar: una subcritica hacia aguas arriba desde el borde aguas abajo
//! y una supercritica hacia aguas abajo desde el borde aguas arriba. El
//! salto hidraulico se ubica recorriendo ambas en orden de estacion: el
//! salto queda en la primera estacion donde el tirante supercritico es
//! menor que el subcritico, con Fr supercritico mayor que 1 y tirante
//! conjugado (Belanger) alcanzado por el perfil subcritico.
//!
//! # Referencia:
//! - Chow, V.T. (1959) Open-Channel Hydraulics, cap. 15
//! - USBR EM-25 (Peterka, 1984) para longitudes de salto

use crate::cross_section::IrregularCrossSection;
use crate::standard_step::{
    BoundaryCondition, ComputationDirection, ConvergenceInfo, ProfilePoint, ProfileSummary,
    StandardStepConfig, StandardStepSolver, TransitionLosses, WaterSurfaceProfile,
};
use crate::uniform::FlowRegime;
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Clasificacion del salto hidraulico segun el Froude de entrada (USBR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JumpType {
    /// Fr1 = 1.0-1.7: ondulaciones superficiales, sin turbulencia fuerte
    Undular,
    /// Fr1 = 1.7-2.5: salto debil con rodillos en superficie
    Weak,
    /// Fr1 = 2.5-4.5: oscilante e inestable, evitar en diseno
    Oscillating,
    /// Fr1 = 4.5-9.0: estable y bien definido
    Steady,
    /// Fr1 > 9.0: muy fuerte, alta disipacion pero erosivo
    Strong,
}

impl JumpType {
    /// Clasificar tipo de salto segun Froude de entrada
    pub fn from_froude(froude: f64) -> Self {
        if froude < 1.7 {
            Self::Undular
        } else if froude < 2.5 {
            Self::Weak
        } else if froude < 4.5 {
            Self::Oscillating
        } else if froude < 9.0 {
            Self::Steady
        } else {
            Self::Strong
        }
    }

    /// Etiqueta para reportes
    pub fn label(&self) -> &'static str {
        match self {
            Self::Undular => "Undular",
            Self::Weak => "Weak",
            Self::Oscillating => "Oscillating",
            Self::Steady => "Steady",
            Self::Strong => "Strong",
        }
    }

    /// Es un salto apropiado para diseno?
    pub fn is_suitable_for_design(&self) -> bool {
        matches!(self, Self::Steady)
    }
}

/// Caracterizacion de un salto hidraulico detectado en un perfil
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydraulicJump {
    /// Estacion donde se ubica el salto (m)
    pub station: f64,
    /// Tirante supercritico aguas arriba (m)
    pub upstream_depth: f64,
    /// Tirante subcritico aguas abajo (m)
    pub downstream_depth: f64,
    /// Tirante conjugado de Belanger para el tirante de entrada (m)
    pub conjugate_depth: f64,
    /// Froude aguas arriba
    pub upstream_froude: f64,
    /// Froude aguas abajo
    pub downstream_froude: f64,
    /// Perdida de energia en el salto (m)
    pub energy_loss: f64,
    /// Longitud del salto, USBR: L ≈ 6.1 y2 (m)
    pub jump_length: f64,
    /// Eficiencia energetica E2/E1
    pub efficiency: f64,
    /// Tipo de salto
    pub jump_type: JumpType,
    /// WSEL aguas arriba (m)
    pub upstream_wsel: f64,
    /// WSEL aguas abajo (m)
    pub downstream_wsel: f64,
}

impl HydraulicJump {
    /// Construir el registro del salto entre dos puntos de perfil
    /// consecutivos (supercritico aguas arriba, subcritico aguas abajo)
    pub fn between(upstream: &ProfilePoint, downstream: &ProfilePoint) -> Self {
        let y1 = upstream.water_depth.max(1e-6);
        let y2 = downstream.water_depth.max(1e-6);
        let fr1 = upstream.froude;

        let energy_loss = if y1 > 0.0 && y2 > 0.0 {
            ((y2 - y1).powi(3) / (4.0 * y1 * y2)).max(0.0)
        } else {
            0.0
        };
        let efficiency = if upstream.specific_energy > 0.0 {
            (downstream.specific_energy / upstream.specific_energy).min(1.0)
        } else {
            1.0
        };

        Self {
            station: 0.5 * (upstream.station + downstream.station),
            upstream_depth: y1,
            downstream_depth: y2,
            conjugate_depth: conjugate_depth(y1, fr1),
            upstream_froude: fr1,
            downstream_froude: downstream.froude,
            energy_loss,
            jump_length: 6.1 * y2,
            efficiency,
            jump_type: JumpType::from_froude(fr1),
            upstream_wsel: upstream.wsel,
            downstream_wsel: downstream.wsel,
        }
    }
}

/// Tirante conjugado por la ecuacion de Belanger:
/// y2/y1 = 0.5 (sqrt(1 + 8 Fr1²) - 1)
pub fn conjugate_depth(depth: f64, froude: f64) -> f64 {
    if froude <= 1.0 {
        return depth;
    }
    depth * 0.5 * ((1.0 + 8.0 * froude.powi(2)).sqrt() - 1.0)
}

/// Solver de perfiles de regimen mixto
pub struct MixedFlowSolver {
    config: StandardStepConfig,
}

impl MixedFlowSolver {
    /// Crear solver con configuracion por defecto
    pub fn new() -> Self {
        Self {
            config: StandardStepConfig::default(),
        }
    }

    /// Crear solver con configuracion personalizada
    pub fn with_config(config: StandardStepConfig) -> Self {
        Self { config }
    }

    /// Calcular un perfil de regimen mixto
    ///
    /// Corre el paso estandar subcritico (hacia aguas arriba desde
    /// `downstream_boundary`) y supercritico (hacia aguas abajo desde
    /// `upstream_boundary`), ubica el salto y mezcla: puntos
    /// supercriticos hasta el salto, subcriticos despues. Si no hay
    /// salto, se conserva la corrida cuyo regimen domina por Froude
    /// promedio.
    pub fn compute(
        &self,
        sections: &[IrregularCrossSection],
        discharge: f64,
        upstream_boundary: BoundaryCondition,
        downstream_boundary: BoundaryCondition,
    ) -> Result<WaterSurfaceProfile> {
        let solver = StandardStepSolver::with_config(self.config);

        let subcritical = solver.compute(
            sections,
            discharge,
            downstream_boundary,
            Some(ComputationDirection::Upstream),
        )?;
        let supercritical = solver.compute(
            sections,
            discharge,
            upstream_boundary,
            Some(ComputationDirection::Downstream),
        )?;

        if subcritical.points.is_empty() || supercritical.points.is_empty() {
            return Ok(subcritical);
        }

        // Buscar el salto recorriendo ambas corridas en orden de estacion:
        // el perfil supercritico debe seguir bajo el subcritico, con Fr > 1,
        // y el tirante subcritico debe alcanzar el conjugado de Belanger
        let count = subcritical.points.len().min(supercritical.points.len());
        let mut jump_index: Option<usize> = None;
        for i in 0..count {
            let super_point = &supercritical.points[i];
            let sub_point = &subcritical.points[i];
            if super_point.froude > 1.0
                && super_point.water_depth < sub_point.water_depth
                && conjugate_depth(super_point.water_depth, super_point.froude)
                    <= sub_point.water_depth
            {
                jump_index = Some(i);
                break;
            }
        }

        let mut merged = match jump_index {
            Some(index) => {
                debug!(index, "hydraulic jump located in mixed profile");
                self.merge_at_jump(sections, &supercritical, &subcritical, index, discharge)
            }
            None => {
                // Sin salto: conservar el regimen dominante por Froude promedio
                let super_avg = supercritical.summary.avg_froude;
                if super_avg > 1.0 {
                    supercritical
                } else {
                    subcritical
                }
            }
        };

        if merged.jump_detected && !merged.warnings.iter().any(|w| w == "Hydraulic jump detected")
        {
            merged.warnings.push("Hydraulic jump detected".to_string());
        }

        Ok(merged)
    }

    /// Mezclar las dos corridas en el salto
    fn merge_at_jump(
        &self,
        sections: &[IrregularCrossSection],
        supercritical: &WaterSurfaceProfile,
        subcritical: &WaterSurfaceProfile,
        jump_index: usize,
        discharge: f64,
    ) -> WaterSurfaceProfile {
        let jump_station = supercritical.points[jump_index].station;

        let mut points: Vec<ProfilePoint> = Vec::new();
        for point in &supercritical.points {
            if point.station <= jump_station {
                points.push(point.clone());
            }
        }
        for point in &subcritical.points {
            if point.station > jump_station {
                points.push(point.clone());
            }
        }
        points.sort_by(|a, b| a.station.total_cmp(&b.station));

        // Recalcular las perdidas por tramo sobre la mezcla, con las
        // longitudes de la seccion aguas arriba de cada par
        let mut ordered: Vec<&IrregularCrossSection> = sections.iter().collect();
        ordered.sort_by(|a, b| a.river_station.total_cmp(&b.river_station));
        for i in 0..points.len().saturating_sub(1) {
            if let Some(section) = ordered.iter().find(|s| {
                s.river_station == points[i].station
            }) {
                let pair_length = section.downstream_reach_lengths.average();
                let averaging = self.config.averaging;
                let friction = averaging
                    .average(points[i].friction_slope, points[i + 1].friction_slope)
                    * pair_length;
                let delta_vh = points[i + 1].velocity_head - points[i].velocity_head;
                let (contraction, expansion) = if delta_vh < 0.0 {
                    (0.0, section.loss_coefficients.expansion * delta_vh.abs())
                } else {
                    (section.loss_coefficients.contraction * delta_vh, 0.0)
                };
                points[i].losses = Some(TransitionLosses {
                    friction,
                    contraction,
                    expansion,
                    total: friction + contraction + expansion,
                });
            }
        }

        // Registro del salto entre el ultimo punto supercritico y el primero
        // subcritico de la mezcla
        let jump = points
            .windows(2)
            .find(|w| w[0].froude > 1.0 && w[1].froude < 1.0)
            .map(|w| HydraulicJump::between(&w[0], &w[1]));
        let jump_station_mid = jump.as_ref().map(|j| j.station);

        let mut warnings: Vec<String> = Vec::new();
        for warning in supercritical
            .warnings
            .iter()
            .chain(subcritical.warnings.iter())
        {
            if !warnings.iter().any(|w| w == warning) {
                warnings.push(warning.clone());
            }
        }

        let convergence = ConvergenceInfo {
            converged: supercritical.convergence.converged && subcritical.convergence.converged,
            total_iterations: supercritical.convergence.total_iterations
                + subcritical.convergence.total_iterations,
            max_residual: supercritical
                .convergence
                .max_residual
                .max(subcritical.convergence.max_residual),
            failed_stations: supercritical
                .convergence
                .failed_stations
                .iter()
                .chain(subcritical.convergence.failed_stations.iter())
                .copied()
                .collect(),
        };

        let subcritical_count = points
            .iter()
            .filter(|p| p.flow_regime == FlowRegime::Subcritical)
            .count();
        let supercritical_count = points
            .iter()
            .filter(|p| p.flow_regime == FlowRegime::Supercritical)
            .count();
        let flow_regime = if supercritical_count > subcritical_count {
            FlowRegime::Supercritical
        } else {
            FlowRegime::Subcritical
        };

        let summary = ProfileSummary::from_points(&points);

        WaterSurfaceProfile {
            points,
            discharge,
            slope_class: subcritical.slope_class,
            profile_type: subcritical.profile_type,
            flow_regime,
            direction: ComputationDirection::Downstream,
            boundary: subcritical.boundary.clone(),
            reach_length: subcritical.reach_length,
            average_slope: subcritical.average_slope,
            jump_detected: jump.is_some(),
            jump_station: jump_station_mid,
            hydraulic_jump: jump,
            convergence,
            summary,
            warnings,
        }
    }
}

impl Default for MixedFlowSolver {
    fn default() -> Self {
        Self::new()
    }
}
