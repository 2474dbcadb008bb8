//! Reach Analysis - Analisis de Tramos y Sistemas de Rio
//!
//! Compone el paso estandar con las estructuras en linea y laterales para
//! analizar tramos completos, y agrega los analisis de nivel de tramo:
//! - Sistemas multi-tramo con orden de calculo desde los tramos terminales
//! - Delineacion de llanura de inundacion
//! - Volumenes de inundacion por integracion trapezoidal
//! - Curvas de gasto por seccion
//! - Distribuciones de velocidad y cortante por estacion
//!
//! La distribucion de velocidad usa un escalado (y/ȳ)^0.2 tipo ley
//! logaritmica que es solo una heuristica de reporte, no una ley
//! hidraulica.

use crate::cross_section::IrregularCrossSection;
use crate::geometry;
use crate::roughness::freeboard_estimate;
use crate::standard_step::{
    BoundaryCondition, StandardStepConfig, StandardStepSolver, WaterSurfaceProfile,
};
use crate::structures::{
    BridgeHydraulics, BridgeResult, CulvertHydraulics, CulvertResult, LateralDiversion,
    WeirHydraulics, WeirResult,
};
use crate::uniform::{FlowRegime, HydraulicsEngine, SolverConfig};
use crate::{ElementId, HydraulicError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Metodo de calculo en una confluencia
///
/// Las junciones se modelan como datos: el motor no calcula el balance de
/// masa en confluencias, solo encadena condiciones de borde por los
/// punteros aguas abajo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JunctionMethod {
    EnergyBalance,
    Momentum,
}

/// Confluencia entre tramos
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Junction {
    /// Identificador unico
    pub id: ElementId,
    /// Nombre descriptivo
    pub name: String,
    /// Tramos que llegan a la confluencia
    pub upstream_reaches: Vec<ElementId>,
    /// Tramo que sale de la confluencia
    pub downstream_reach: ElementId,
    /// Metodo declarado (no computado)
    pub method: JunctionMethod,
}

/// Tramo de rio: secciones ordenadas mas estructuras opcionales
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiverReach {
    /// Identificador unico
    pub id: ElementId,

    /// Nombre descriptivo
    pub name: String,

    /// Secciones transversales, ordenadas por estacion de rio creciente
    pub sections: Vec<IrregularCrossSection>,

    /// Puentes (colaboradores externos, no serializados)
    #[serde(skip)]
    pub bridges: Vec<Box<dyn BridgeHydraulics>>,

    /// Alcantarillas (colaboradores externos, no serializados)
    #[serde(skip)]
    pub culverts: Vec<Box<dyn CulvertHydraulics>>,

    /// Vertederos en linea (colaboradores externos, no serializados)
    #[serde(skip)]
    pub inline_weirs: Vec<Box<dyn WeirHydraulics>>,

    /// Vertederos laterales (colaboradores externos, no serializados)
    #[serde(skip)]
    pub lateral_weirs: Vec<Box<dyn WeirHydraulics>>,

    /// Derivaciones laterales
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lateral_diversions: Vec<LateralDiversion>,

    /// Tramo aguas abajo, si existe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_reach: Option<ElementId>,
}

impl RiverReach {
    /// Crear tramo; las secciones se ordenan por estacion de rio
    pub fn new(name: impl Into<String>, mut sections: Vec<IrregularCrossSection>) -> Self {
        sections.sort_by(|a, b| a.river_station.total_cmp(&b.river_station));
        Self {
            id: ElementId::new(),
            name: name.into(),
            sections,
            bridges: Vec::new(),
            culverts: Vec::new(),
            inline_weirs: Vec::new(),
            lateral_weirs: Vec::new(),
            lateral_diversions: Vec::new(),
            downstream_reach: None,
        }
    }

    /// Builder pattern: agregar puente
    pub fn with_bridge(mut self, bridge: Box<dyn BridgeHydraulics>) -> Self {
        self.bridges.push(bridge);
        self
    }

    /// Builder pattern: agregar alcantarilla
    pub fn with_culvert(mut self, culvert: Box<dyn CulvertHydraulics>) -> Self {
        self.culverts.push(culvert);
        self
    }

    /// Builder pattern: agregar vertedero en linea
    pub fn with_inline_weir(mut self, weir: Box<dyn WeirHydraulics>) -> Self {
        self.inline_weirs.push(weir);
        self
    }

    /// Builder pattern: agregar vertedero lateral
    pub fn with_lateral_weir(mut self, weir: Box<dyn WeirHydraulics>) -> Self {
        self.lateral_weirs.push(weir);
        self
    }

    /// Builder pattern: agregar derivacion lateral
    pub fn with_lateral_diversion(mut self, diversion: LateralDiversion) -> Self {
        self.lateral_diversions.push(diversion);
        self
    }

    /// Builder pattern: conectar con el tramo aguas abajo
    pub fn with_downstream(mut self, downstream: ElementId) -> Self {
        self.downstream_reach = Some(downstream);
        self
    }

    /// Buscar la seccion mas cercana a una estacion de rio
    pub fn section_at(&self, river_station: f64) -> Option<&IrregularCrossSection> {
        self.sections.iter().min_by(|a, b| {
            (a.river_station - river_station)
                .abs()
                .total_cmp(&(b.river_station - river_station).abs())
        })
    }
}

/// Sistema de tramos con junciones opcionales
///
/// El grafo dirigido por los punteros aguas abajo debe ser aciclico.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiverSystem {
    /// Tramos del sistema
    pub reaches: Vec<RiverReach>,

    /// Junciones declaradas (datos, no computadas)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub junctions: Vec<Junction>,
}

impl RiverSystem {
    pub fn new(reaches: Vec<RiverReach>) -> Self {
        Self {
            reaches,
            junctions: Vec::new(),
        }
    }
}

/// Caudales y condiciones de borde por tramo para un analisis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowProfile {
    /// Caudal de diseno por tramo (m^3/s)
    pub flows: IndexMap<ElementId, f64>,

    /// Condicion de borde por tramo; los tramos sin condicion heredan el
    /// nivel del tramo aguas abajo ya calculado
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub boundaries: IndexMap<ElementId, BoundaryCondition>,
}

impl FlowProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: asignar caudal a un tramo
    pub fn with_flow(mut self, reach: ElementId, discharge: f64) -> Self {
        self.flows.insert(reach, discharge);
        self
    }

    /// Builder pattern: asignar condicion de borde a un tramo
    pub fn with_boundary(mut self, reach: ElementId, boundary: BoundaryCondition) -> Self {
        self.boundaries.insert(reach, boundary);
        self
    }
}

/// Resultado de un puente dentro del analisis de tramo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeAnalysis {
    /// Estacion del puente (m)
    pub station: f64,
    /// WSEL interpolada en la estacion (m)
    pub wsel: f64,
    /// Resultado del hook
    pub result: BridgeResult,
}

/// Resultado de una alcantarilla dentro del analisis de tramo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulvertAnalysis {
    /// Estacion de la alcantarilla (m)
    pub station: f64,
    /// WSEL interpolada en la estacion (m)
    pub wsel: f64,
    /// Resultado del hook
    pub result: CulvertResult,
}

/// Resultado de un vertedero dentro del analisis de tramo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeirAnalysis {
    /// Estacion del vertedero (m)
    pub station: f64,
    /// WSEL interpolada en la estacion (m)
    pub wsel: f64,
    /// Carga sobre la cresta (m)
    pub head: f64,
    /// Resultado del hook
    pub result: WeirResult,
}

/// Resultado completo del analisis de un tramo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachAnalysisResult {
    /// Tramo analizado
    pub reach_id: ElementId,

    /// Nombre del tramo
    pub reach_name: String,

    /// Perfil de superficie de agua
    pub profile: WaterSurfaceProfile,

    /// Resultados de puentes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bridges: Vec<BridgeAnalysis>,

    /// Resultados de alcantarillas
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub culverts: Vec<CulvertAnalysis>,

    /// Resultados de vertederos en linea
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inline_weirs: Vec<WeirAnalysis>,

    /// Resultados de vertederos laterales
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lateral_weirs: Vec<WeirAnalysis>,

    /// Caudal total vertido lateralmente (m^3/s)
    pub lateral_overflow: f64,

    /// Caudal total derivado (m^3/s)
    pub lateral_diversion: f64,

    /// WSEL minima del perfil (m)
    pub min_wsel: f64,

    /// WSEL maxima del perfil (m)
    pub max_wsel: f64,

    /// Velocidad media (m/s)
    pub mean_velocity: f64,

    /// Velocidad maxima (m/s)
    pub max_velocity: f64,

    /// Froude medio
    pub mean_froude: f64,

    /// Advertencias agregadas
    pub warnings: Vec<String>,
}

/// Extension de la inundacion en una estacion del perfil
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodplainMapping {
    /// Estacion de rio (m)
    pub station: f64,
    /// WSEL del perfil (m)
    pub wsel: f64,
    /// Ancho inundado mas alla de la margen izquierda (m)
    pub left_floodplain_width: f64,
    /// Ancho inundado mas alla de la margen derecha (m)
    pub right_floodplain_width: f64,
    /// Ancho superficial total (m)
    pub top_width: f64,
    /// Profundidad maxima (m)
    pub max_depth: f64,
    /// Profundidad promedio sobre los vertices mojados (m)
    pub average_depth: f64,
    /// Area de flujo (m^2)
    pub flow_area: f64,
}

/// Volumenes de inundacion de un tramo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodVolume {
    /// Estacion inicial (m)
    pub start_station: f64,
    /// Estacion final (m)
    pub end_station: f64,
    /// Volumen total (m^3)
    pub total_volume: f64,
    /// Volumen en el canal principal (m^3)
    pub main_channel_volume: f64,
    /// Volumen en la llanura izquierda (m^3)
    pub left_overbank_volume: f64,
    /// Volumen en la llanura derecha (m^3)
    pub right_overbank_volume: f64,
    /// Area superficial inundada (m^2)
    pub surface_area: f64,
    /// Profundidad promedio (m)
    pub average_depth: f64,
}

/// Punto de la curva de gasto de una seccion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingCurvePoint {
    /// Caudal (m^3/s)
    pub discharge: f64,
    /// Elevacion normal (m)
    pub wsel: f64,
    /// Profundidad (m)
    pub depth: f64,
    /// Velocidad media (m/s)
    pub velocity: f64,
    /// Numero de Froude
    pub froude: f64,
    /// Area de flujo (m^2)
    pub flow_area: f64,
    /// Ancho superficial (m)
    pub top_width: f64,
    /// Bordo libre recomendado para este caudal (m)
    pub freeboard: f64,
    /// El solver de elevacion normal convergio?
    pub converged: bool,
}

/// Velocidades medias por zona
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneVelocities {
    pub left_overbank: f64,
    pub main_channel: f64,
    pub right_overbank: f64,
}

/// Velocidad local en un vertice de la seccion
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationVelocity {
    /// Estacion transversal (m)
    pub station: f64,
    /// Profundidad local (m)
    pub depth: f64,
    /// Velocidad local (m/s)
    pub velocity: f64,
}

/// Distribucion de velocidades en una seccion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityDistribution {
    /// WSEL analizada (m)
    pub wsel: f64,
    /// Caudal (m^3/s)
    pub discharge: f64,
    /// Profundidad media ȳ = A/T (m)
    pub mean_depth: f64,
    /// Velocidades medias por zona
    pub zone_velocities: ZoneVelocities,
    /// Velocidades locales por vertice
    pub points: Vec<StationVelocity>,
}

/// Cortante local en un vertice de la seccion
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationShear {
    /// Estacion transversal (m)
    pub station: f64,
    /// Profundidad local (m)
    pub depth: f64,
    /// Esfuerzo cortante local (Pa)
    pub shear: f64,
}

/// Distribucion de esfuerzo cortante en una seccion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShearDistribution {
    /// WSEL analizada (m)
    pub wsel: f64,
    /// Pendiente usada (m/m)
    pub slope: f64,
    /// Cortantes locales por vertice
    pub points: Vec<StationShear>,
    /// Cortante maximo (Pa)
    pub max_shear: f64,
    /// Cortante medio sobre los vertices mojados (Pa)
    pub mean_shear: f64,
}

/// Motor de analisis de tramos y sistemas
pub struct ReachAnalyzer {
    config: StandardStepConfig,
}

impl ReachAnalyzer {
    /// Crear analizador con configuracion por defecto
    pub fn new() -> Self {
        Self {
            config: StandardStepConfig::default(),
        }
    }

    /// Crear analizador con configuracion personalizada
    pub fn with_config(config: StandardStepConfig) -> Self {
        Self { config }
    }

    /// Analizar un tramo: perfil mas estructuras
    pub fn analyze(
        &self,
        reach: &RiverReach,
        discharge: f64,
        boundary: BoundaryCondition,
    ) -> Result<ReachAnalysisResult> {
        let solver = StandardStepSolver::with_config(self.config);
        let profile = solver.compute(&reach.sections, discharge, boundary, None)?;

        let mut warnings = profile.warnings.clone();
        let push_unique = |warnings: &mut Vec<String>, warning: &str| {
            if !warnings.iter().any(|w| w == warning) {
                warnings.push(warning.to_string());
            }
        };

        // Estructuras en linea: interpolar el nivel en su estacion e
        // invocar el hook correspondiente
        let mut bridges = Vec::new();
        for bridge in &reach.bridges {
            let wsel = wsel_at_station(&profile, bridge.station());
            let result = bridge.analyze(wsel, discharge);
            for warning in &result.warnings {
                push_unique(&mut warnings, warning);
            }
            bridges.push(BridgeAnalysis {
                station: bridge.station(),
                wsel,
                result,
            });
        }

        let mut culverts = Vec::new();
        for culvert in &reach.culverts {
            let wsel = wsel_at_station(&profile, culvert.station());
            let result = culvert.analyze(wsel, discharge);
            for warning in &result.warnings {
                push_unique(&mut warnings, warning);
            }
            culverts.push(CulvertAnalysis {
                station: culvert.station(),
                wsel,
                result,
            });
        }

        let mut inline_weirs = Vec::new();
        for weir in &reach.inline_weirs {
            let wsel = wsel_at_station(&profile, weir.station());
            let head = (wsel - weir.crest_elevation()).max(0.0);
            let result = weir.analyze(head);
            for warning in &result.warnings {
                push_unique(&mut warnings, warning);
            }
            inline_weirs.push(WeirAnalysis {
                station: weir.station(),
                wsel,
                head,
                result,
            });
        }

        let mut lateral_weirs = Vec::new();
        let mut lateral_overflow = 0.0;
        for weir in &reach.lateral_weirs {
            let wsel = wsel_at_station(&profile, weir.station());
            let head = (wsel - weir.crest_elevation()).max(0.0);
            let result = weir.analyze(head);
            lateral_overflow += result.discharge;
            for warning in &result.warnings {
                push_unique(&mut warnings, warning);
            }
            lateral_weirs.push(WeirAnalysis {
                station: weir.station(),
                wsel,
                head,
                result,
            });
        }

        let mut lateral_diversion = 0.0;
        for diversion in &reach.lateral_diversions {
            let wsel = wsel_at_station(&profile, diversion.station);
            lateral_diversion += diversion.diverted_flow(wsel);
        }

        if lateral_overflow + lateral_diversion > discharge {
            push_unique(&mut warnings, "Lateral outflow exceeds reach discharge");
        }

        let points = &profile.points;
        let n = points.len().max(1) as f64;
        let min_wsel = points.iter().map(|p| p.wsel).fold(f64::INFINITY, f64::min);
        let max_wsel = points
            .iter()
            .map(|p| p.wsel)
            .fold(f64::NEG_INFINITY, f64::max);
        let mean_velocity = points.iter().map(|p| p.velocity).sum::<f64>() / n;
        let max_velocity = points
            .iter()
            .map(|p| p.velocity)
            .fold(f64::NEG_INFINITY, f64::max);
        let mean_froude = points.iter().map(|p| p.froude).sum::<f64>() / n;

        Ok(ReachAnalysisResult {
            reach_id: reach.id,
            reach_name: reach.name.clone(),
            profile,
            bridges,
            culverts,
            inline_weirs,
            lateral_weirs,
            lateral_overflow,
            lateral_diversion,
            min_wsel: if min_wsel.is_finite() { min_wsel } else { 0.0 },
            max_wsel: if max_wsel.is_finite() { max_wsel } else { 0.0 },
            mean_velocity,
            max_velocity: if max_velocity.is_finite() {
                max_velocity
            } else {
                0.0
            },
            mean_froude,
            warnings,
        })
    }

    /// Analizar un sistema de tramos
    ///
    /// Los tramos se ordenan desde los terminales (sin tramo aguas abajo)
    /// hacia aguas arriba por BFS sobre los punteros. Un tramo sin
    /// condicion de borde explicita hereda como nivel conocido la WSEL mas
    /// aguas arriba del tramo aguas abajo ya calculado; si tampoco existe,
    /// usa profundidad normal. Los tramos desconectados se agregan al
    /// final.
    pub fn analyze_system(
        &self,
        system: &RiverSystem,
        flow_profile: &FlowProfile,
    ) -> Result<IndexMap<ElementId, ReachAnalysisResult>> {
        let ids: Vec<ElementId> = system.reaches.iter().map(|r| r.id).collect();

        // Tramos terminales: sin aguas abajo, o apuntando fuera del sistema
        let mut order: Vec<usize> = Vec::with_capacity(system.reaches.len());
        let mut queue: std::collections::VecDeque<usize> = system
            .reaches
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.downstream_reach
                    .map(|id| !ids.contains(&id))
                    .unwrap_or(true)
            })
            .map(|(i, _)| i)
            .collect();

        let mut visited = vec![false; system.reaches.len()];
        while let Some(index) = queue.pop_front() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            order.push(index);

            let current_id = system.reaches[index].id;
            for (i, reach) in system.reaches.iter().enumerate() {
                if !visited[i] && reach.downstream_reach == Some(current_id) {
                    queue.push_back(i);
                }
            }
        }

        // Tramos no alcanzados (desconectados o en ciclo) al final
        for i in 0..system.reaches.len() {
            if !visited[i] {
                debug!(reach = %system.reaches[i].name, "reach not reachable from a terminal");
                order.push(i);
            }
        }

        let mut results: IndexMap<ElementId, ReachAnalysisResult> = IndexMap::new();
        for index in order {
            let reach = &system.reaches[index];
            let discharge = *flow_profile.flows.get(&reach.id).ok_or_else(|| {
                HydraulicError::InvalidParameter(format!(
                    "Missing design flow for reach {} ({})",
                    reach.name, reach.id
                ))
            })?;

            let boundary = match flow_profile.boundaries.get(&reach.id) {
                Some(boundary) => boundary.clone(),
                None => {
                    let inherited = reach
                        .downstream_reach
                        .and_then(|id| results.get(&id))
                        .and_then(|r| r.profile.points.first())
                        .map(|p| p.wsel);
                    match inherited {
                        Some(wsel) => BoundaryCondition::KnownWsel(wsel),
                        None => BoundaryCondition::NormalDepth,
                    }
                }
            };

            let result = self.analyze(reach, discharge, boundary)?;
            results.insert(reach.id, result);
        }

        Ok(results)
    }

    /// Delinear la llanura de inundacion de un perfil calculado
    pub fn delineate_floodplain(
        &self,
        reach: &RiverReach,
        profile: &WaterSurfaceProfile,
    ) -> Vec<FloodplainMapping> {
        let mut mappings = Vec::with_capacity(profile.points.len());

        for point in &profile.points {
            let Some(section) = reach.section_at(point.station) else {
                continue;
            };
            let geometry = geometry::at(section, point.wsel);

            let (left_width, right_width) = match geometry.wet_extent {
                Some((wet_min, wet_max)) => (
                    (section.bank_stations.left - wet_min).max(0.0),
                    (wet_max - section.bank_stations.right).max(0.0),
                ),
                None => (0.0, 0.0),
            };

            let wet_depths: Vec<f64> = section
                .points
                .iter()
                .map(|p| point.wsel - p.elevation)
                .filter(|d| *d > 0.0)
                .collect();
            let average_depth = if wet_depths.is_empty() {
                0.0
            } else {
                wet_depths.iter().sum::<f64>() / wet_depths.len() as f64
            };

            mappings.push(FloodplainMapping {
                station: point.station,
                wsel: point.wsel,
                left_floodplain_width: left_width,
                right_floodplain_width: right_width,
                top_width: geometry.top_width,
                max_depth: geometry.max_depth,
                average_depth,
                flow_area: geometry.area,
            });
        }

        mappings
    }

    /// Integrar volumenes de inundacion entre estaciones del perfil
    ///
    /// Integracion trapezoidal: promedio de areas entre puntos
    /// consecutivos por la distancia entre estaciones.
    pub fn flood_volume(
        &self,
        reach: &RiverReach,
        profile: &WaterSurfaceProfile,
        start_station: Option<f64>,
        end_station: Option<f64>,
    ) -> FloodVolume {
        let start = start_station.unwrap_or(f64::NEG_INFINITY);
        let end = end_station.unwrap_or(f64::INFINITY);

        let points: Vec<_> = profile
            .points
            .iter()
            .filter(|p| p.station >= start && p.station <= end)
            .collect();

        let mut total = 0.0;
        let mut main = 0.0;
        let mut left = 0.0;
        let mut right = 0.0;
        let mut surface = 0.0;

        for window in points.windows(2) {
            let (a, b) = (window[0], window[1]);
            let distance = (b.station - a.station).abs();
            if distance <= 0.0 {
                continue;
            }

            let geometry_a = reach
                .section_at(a.station)
                .map(|s| geometry::at(s, a.wsel));
            let geometry_b = reach
                .section_at(b.station)
                .map(|s| geometry::at(s, b.wsel));
            let (Some(ga), Some(gb)) = (geometry_a, geometry_b) else {
                continue;
            };

            total += 0.5 * (ga.area + gb.area) * distance;
            main += 0.5 * (ga.main_channel.area + gb.main_channel.area) * distance;
            left += 0.5 * (ga.left_overbank.area + gb.left_overbank.area) * distance;
            right += 0.5 * (ga.right_overbank.area + gb.right_overbank.area) * distance;
            surface += 0.5 * (ga.top_width + gb.top_width) * distance;
        }

        FloodVolume {
            start_station: points.first().map(|p| p.station).unwrap_or(0.0),
            end_station: points.last().map(|p| p.station).unwrap_or(0.0),
            total_volume: total,
            main_channel_volume: main,
            left_overbank_volume: left,
            right_overbank_volume: right,
            surface_area: surface,
            average_depth: if surface > 0.0 { total / surface } else { 0.0 },
        }
    }

    /// Curva de gasto de una seccion: N caudales equiespaciados en
    /// [q_min, q_max] con su elevacion normal
    pub fn rating_curve(
        &self,
        section: &IrregularCrossSection,
        slope: f64,
        q_min: f64,
        q_max: f64,
        count: usize,
    ) -> Result<Vec<RatingCurvePoint>> {
        section.ensure_valid()?;
        if slope <= 0.0 {
            return Err(HydraulicError::InvalidParameter(
                "Rating curve needs a positive slope".into(),
            ));
        }
        if q_max < q_min || q_min < 0.0 {
            return Err(HydraulicError::InvalidParameter(
                "Rating curve needs 0 <= q_min <= q_max".into(),
            ));
        }

        let solver_config = SolverConfig::default();
        let samples = count.max(2);
        let mut points = Vec::with_capacity(samples);

        for i in 0..samples {
            let t = i as f64 / (samples - 1) as f64;
            let discharge = q_min + (q_max - q_min) * t;
            let normal = HydraulicsEngine::normal_wsel(section, discharge, slope, &solver_config)?;
            let geometry = geometry::at(section, normal.value);
            let velocity = if geometry.area > 0.0 {
                discharge / geometry.area
            } else {
                0.0
            };

            points.push(RatingCurvePoint {
                discharge,
                wsel: normal.value,
                depth: geometry.max_depth,
                velocity,
                froude: HydraulicsEngine::composite_froude(
                    geometry.alpha,
                    velocity,
                    geometry.hydraulic_depth,
                ),
                flow_area: geometry.area,
                top_width: geometry.top_width,
                freeboard: freeboard_estimate(discharge),
                converged: normal.converged,
            });
        }

        Ok(points)
    }

    /// Distribucion de velocidades por estacion transversal
    ///
    /// La velocidad local escala la velocidad media de la zona con
    /// (y_local / ȳ)^0.2; es una heuristica de reporte, no una ley
    /// hidraulica.
    pub fn velocity_distribution(
        &self,
        section: &IrregularCrossSection,
        wsel: f64,
        discharge: f64,
    ) -> VelocityDistribution {
        let geometry = geometry::at(section, wsel);

        let zone_velocity = |zone: &crate::geometry::ZoneGeometry| -> f64 {
            if zone.area > 0.0 && geometry.conveyance > 0.0 {
                (zone.conveyance / geometry.conveyance) * discharge / zone.area
            } else {
                0.0
            }
        };
        let zone_velocities = ZoneVelocities {
            left_overbank: zone_velocity(&geometry.left_overbank),
            main_channel: zone_velocity(&geometry.main_channel),
            right_overbank: zone_velocity(&geometry.right_overbank),
        };

        let mean_depth = geometry.hydraulic_depth;
        let mut points = Vec::with_capacity(section.points.len());
        for vertex in &section.points {
            let depth = (wsel - vertex.elevation).max(0.0);
            let velocity = if depth > 0.0 && mean_depth > 0.0 {
                let zone = crate::geometry::FlowZone::of_station(
                    vertex.station,
                    section.bank_stations.left,
                    section.bank_stations.right,
                );
                let base = match zone {
                    crate::geometry::FlowZone::LeftOverbank => zone_velocities.left_overbank,
                    crate::geometry::FlowZone::MainChannel => zone_velocities.main_channel,
                    crate::geometry::FlowZone::RightOverbank => zone_velocities.right_overbank,
                };
                base * (depth / mean_depth).powf(0.2)
            } else {
                0.0
            };
            points.push(StationVelocity {
                station: vertex.station,
                depth,
                velocity,
            });
        }

        VelocityDistribution {
            wsel,
            discharge,
            mean_depth,
            zone_velocities,
            points,
        }
    }

    /// Distribucion de cortante por estacion transversal
    ///
    /// Aproximacion de canal ancho: τ = γ_w (0.8 y_local) S en cada
    /// vertice mojado.
    pub fn shear_distribution(
        &self,
        section: &IrregularCrossSection,
        wsel: f64,
        slope: f64,
    ) -> ShearDistribution {
        let mut points = Vec::with_capacity(section.points.len());
        let mut max_shear: f64 = 0.0;
        let mut wet_sum = 0.0;
        let mut wet_count = 0usize;

        for vertex in &section.points {
            let depth = (wsel - vertex.elevation).max(0.0);
            let shear = if depth > 0.0 && slope > 0.0 {
                crate::GAMMA_W * 0.8 * depth * slope
            } else {
                0.0
            };
            if depth > 0.0 {
                wet_sum += shear;
                wet_count += 1;
            }
            max_shear = max_shear.max(shear);
            points.push(StationShear {
                station: vertex.station,
                depth,
                shear,
            });
        }

        ShearDistribution {
            wsel,
            slope,
            points,
            max_shear,
            mean_shear: if wet_count > 0 {
                wet_sum / wet_count as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for ReachAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpolar la WSEL del perfil en una estacion (lineal, fijada a los
/// extremos)
fn wsel_at_station(profile: &WaterSurfaceProfile, station: f64) -> f64 {
    let points = &profile.points;
    if points.is_empty() {
        return 0.0;
    }
    if station <= points[0].station {
        return points[0].wsel;
    }
    if let Some(last) = points.last() {
        if station >= last.station {
            return last.wsel;
        }
    }
    for window in points.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        if station >= a.station && station <= b.station {
            let span = b.station - a.station;
            if span <= 0.0 {
                return a.wsel;
            }
            let t = (station - a.station) / span;
            return a.wsel + t * (b.wsel - a.wsel);
        }
    }
    points.last().map(|p| p.wsel).unwrap_or(0.0)
}

/// Regimen predominante de un conjunto de resultados de tramo
pub fn predominant_regime(results: &IndexMap<ElementId, ReachAnalysisResult>) -> FlowRegime {
    let mut subcritical = 0usize;
    let mut supercritical = 0usize;
    for result in results.values() {
        match result.profile.flow_regime {
            FlowRegime::Subcritical => subcritical += 1,
            FlowRegime::Supercritical => supercritical += 1,
            FlowRegime::Critical => {}
        }
    }
    if supercritical > subcritical {
        FlowRegime::Supercritical
    } else {
        FlowRegime::Subcritical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross_section::{BankStations, ManningZones, ReachLengths, StationElevation};

    fn section_at(river_station: f64, bed: f64, reach_length: f64) -> IrregularCrossSection {
        IrregularCrossSection::new(
            format!("RS {river_station}"),
            river_station,
            vec![
                StationElevation::new(0.0, bed + 5.0),
                StationElevation::new(5.0, bed + 2.0),
                StationElevation::new(8.0, bed),
                StationElevation::new(16.0, bed),
                StationElevation::new(19.0, bed + 2.0),
                StationElevation::new(24.0, bed + 5.0),
            ],
            BankStations::new(5.0, 19.0),
            ManningZones::new(0.05, 0.03, 0.05),
            if reach_length > 0.0 {
                ReachLengths::uniform(reach_length)
            } else {
                ReachLengths::zero()
            },
        )
    }

    fn simple_reach() -> RiverReach {
        RiverReach::new(
            "Tramo principal",
            vec![
                section_at(0.0, 10.2, 100.0),
                section_at(100.0, 10.1, 100.0),
                section_at(200.0, 10.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_reach_analysis_basic() {
        let reach = simple_reach();
        let analyzer = ReachAnalyzer::new();
        let result = analyzer
            .analyze(&reach, 30.0, BoundaryCondition::NormalDepth)
            .unwrap();

        assert_eq!(result.profile.points.len(), 3);
        assert!(result.min_wsel <= result.max_wsel);
        assert!(result.mean_velocity > 0.0);
        assert_eq!(result.lateral_overflow, 0.0);
    }

    #[test]
    fn test_lateral_weir_overflow() {
        use crate::structures::SharpCrestedWeir;

        // Crest just above the downstream bed so it always spills
        let weir = SharpCrestedWeir::new(100.0, 2.0, 10.5);
        let reach = simple_reach().with_lateral_weir(Box::new(weir));

        let analyzer = ReachAnalyzer::new();
        let result = analyzer
            .analyze(&reach, 30.0, BoundaryCondition::NormalDepth)
            .unwrap();

        assert!(result.lateral_overflow > 0.0);
        assert_eq!(result.lateral_weirs.len(), 1);
        assert!(result.lateral_weirs[0].head > 0.0);
    }

    #[test]
    fn test_system_orders_from_terminal() {
        let downstream = RiverReach::new("Aguas abajo", vec![
            section_at(200.0, 9.9, 100.0),
            section_at(300.0, 9.8, 0.0),
        ]);
        let downstream_id = downstream.id;

        let upstream = RiverReach::new("Aguas arriba", vec![
            section_at(0.0, 10.1, 100.0),
            section_at(100.0, 10.0, 100.0),
        ])
        .with_downstream(downstream_id);
        let upstream_id = upstream.id;

        let system = RiverSystem::new(vec![upstream, downstream]);
        let flows = FlowProfile::new()
            .with_flow(upstream_id, 30.0)
            .with_flow(downstream_id, 30.0)
            .with_boundary(downstream_id, BoundaryCondition::NormalDepth);

        let analyzer = ReachAnalyzer::new();
        let results = analyzer.analyze_system(&system, &flows).unwrap();

        // Terminal reach computed first
        let order: Vec<ElementId> = results.keys().copied().collect();
        assert_eq!(order[0], downstream_id);
        assert_eq!(order[1], upstream_id);

        // Upstream reach inherited a known WSEL boundary from downstream
        let upstream_result = &results[&upstream_id];
        assert!(matches!(
            upstream_result.profile.boundary,
            BoundaryCondition::KnownWsel(_)
        ));
    }

    #[test]
    fn test_missing_flow_is_an_error() {
        let reach = simple_reach();
        let system = RiverSystem::new(vec![reach]);
        let analyzer = ReachAnalyzer::new();
        let result = analyzer.analyze_system(&system, &FlowProfile::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_flood_volume_mass_balance() {
        let reach = simple_reach();
        let analyzer = ReachAnalyzer::new();
        let result = analyzer
            .analyze(&reach, 30.0, BoundaryCondition::NormalDepth)
            .unwrap();

        let volume = analyzer.flood_volume(&reach, &result.profile, None, None);
        let parts = volume.main_channel_volume
            + volume.left_overbank_volume
            + volume.right_overbank_volume;
        assert!((volume.total_volume - parts).abs() < 1e-6);
        assert!(volume.total_volume > 0.0);
        assert!(volume.surface_area > 0.0);
    }

    #[test]
    fn test_rating_curve_monotonic() {
        let section = section_at(0.0, 10.0, 0.0);
        let analyzer = ReachAnalyzer::new();
        // In-bank range: above bankfull the overbanks add area faster than
        // conveyance and the mean velocity is no longer monotonic
        let curve = analyzer
            .rating_curve(&section, 0.001, 5.0, 25.0, 11)
            .unwrap();

        assert_eq!(curve.len(), 11);
        assert!(curve.windows(2).all(|w| w[1].wsel >= w[0].wsel));
        assert!(curve.windows(2).all(|w| w[1].velocity >= w[0].velocity));
    }

    #[test]
    fn test_velocity_distribution_heuristic() {
        let section = section_at(0.0, 10.0, 0.0);
        let analyzer = ReachAnalyzer::new();
        let distribution = analyzer.velocity_distribution(&section, 12.5, 30.0);

        // Dry vertices carry zero velocity
        assert!(distribution
            .points
            .iter()
            .filter(|p| p.depth <= 0.0)
            .all(|p| p.velocity == 0.0));
        // The deepest vertex carries the highest main-channel velocity
        let max_point = distribution
            .points
            .iter()
            .max_by(|a, b| a.velocity.total_cmp(&b.velocity))
            .expect("has points");
        assert!(max_point.depth > 0.0);
        assert!(distribution.zone_velocities.main_channel > 0.0);
    }

    #[test]
    fn test_shear_distribution_wide_channel() {
        let section = section_at(0.0, 10.0, 0.0);
        let analyzer = ReachAnalyzer::new();
        let distribution = analyzer.shear_distribution(&section, 12.0, 0.001);

        for point in &distribution.points {
            if point.depth > 0.0 {
                let expected = crate::GAMMA_W * 0.8 * point.depth * 0.001;
                assert!((point.shear - expected).abs() < 1e-9);
            } else {
                assert_eq!(point.shear, 0.0);
            }
        }
        assert!(distribution.max_shear > 0.0);
    }

    #[test]
    fn test_floodplain_widths_grow_with_stage() {
        let reach = simple_reach();
        let analyzer = ReachAnalyzer::new();

        let low = analyzer
            .analyze(&reach, 10.0, BoundaryCondition::NormalDepth)
            .unwrap();
        let high = analyzer
            .analyze(&reach, 80.0, BoundaryCondition::NormalDepth)
            .unwrap();

        let low_map = analyzer.delineate_floodplain(&reach, &low.profile);
        let high_map = analyzer.delineate_floodplain(&reach, &high.profile);

        assert_eq!(low_map.len(), 3);
        assert!(high_map[0].top_width > low_map[0].top_width);
        assert!(high_map[0].flow_area > low_map[0].flow_area);
    }
}
