//! CAUCE Hydraulics - Motor de Hidraulica de Canales Abiertos
//!
//! Este modulo implementa un motor completo de hidraulica fluvial basado en:
//! - Secciones prismaticas (rectangular, trapezoidal, triangular, circular, parabolica)
//! - Secciones irregulares tipo rio (estacion-elevacion, zonas de rugosidad, diques)
//! - Flujo uniforme (Manning, profundidad normal y critica, Froude)
//! - Flujo gradualmente variado (Paso Directo y Paso Estandar)
//! - Perfiles de regimen mixto con salto hidraulico
//! - Analisis de tramos y sistemas (llanura de inundacion, volumenes, curvas de gasto)
//!
//! Las estructuras en linea (puentes, alcantarillas, vertederos) se tratan
//! como colaboradores externos a traves de traits.

pub mod classification;
pub mod cross_section;
pub mod curves;
pub mod direct_step;
pub mod geometry;
pub mod mixed_flow;
pub mod prismatic;
pub mod reach;
pub mod report;
pub mod roughness;
pub mod standard_step;
pub mod structures;
pub mod uniform;

// Re-exports
pub use classification::{DepthAsymptote, DepthTrend, ProfileType, SlopeClass};
pub use cross_section::{
    BankStations, ExpansionContraction, IneffectiveArea, IrregularCrossSection, Levee, LeveeSide,
    ManningZones, Obstruction, ReachLengths, StationElevation, ValidationIssue,
};
pub use curves::{
    CurveGenerator, SpecificEnergyCurve, SpecificEnergyPoint, SpecificMomentumCurve,
    SpecificMomentumPoint,
};
pub use direct_step::{DirectStepConfig, DirectStepPoint, DirectStepResult, FrictionAveraging};
pub use geometry::{CrossSectionGeometry, FlowZone, ZoneGeometry};
pub use mixed_flow::{HydraulicJump, JumpType, MixedFlowSolver};
pub use prismatic::{HydraulicProperties, PrismaticSection};
pub use reach::{
    BridgeAnalysis, CulvertAnalysis, FloodVolume, FloodplainMapping, FlowProfile, Junction,
    JunctionMethod, RatingCurvePoint, ReachAnalysisResult, ReachAnalyzer, RiverReach, RiverSystem,
    ShearDistribution, StationShear, StationVelocity, VelocityDistribution, WeirAnalysis,
    ZoneVelocities,
};
pub use roughness::{ChannelMaterial, LiningCheck};
pub use standard_step::{
    BoundaryCondition, ComputationDirection, ConvergenceInfo, ProfilePoint, ProfileSummary,
    StageDischargePoint, StandardStepConfig, StandardStepSolver, TransitionLosses,
    WaterSurfaceProfile,
};
pub use structures::{
    BridgeHydraulics, BridgeResult, CulvertControl, CulvertHydraulics, CulvertResult,
    LateralDiversion, SharpCrestedWeir, WeirHydraulics, WeirResult,
};
pub use uniform::{
    FlowRegime, HydraulicsEngine, IrregularFlowResult, PrismaticFlowResult, SolverConfig,
    SolverResult,
};

/// ID unico para elementos del sistema
pub type ElementId = cauce_core::EntityId;

/// Punto 2D de nalgebra (plano estacion-elevacion de una seccion)
pub type Point2 = nalgebra::Point2<f64>;

/// Vector 2D de nalgebra (usado para longitudes de segmentos mojados)
pub type NaVec2 = nalgebra::Vector2<f64>;

/// Constante gravitacional (m/s^2)
pub const G: f64 = cauce_core::GRAVITY;

/// Peso especifico del agua (N/m^3)
pub const GAMMA_W: f64 = cauce_core::UNIT_WEIGHT_WATER;

/// Error types para el modulo
#[derive(Debug, thiserror::Error)]
pub enum HydraulicError {
    #[error("Section error: {0}")]
    Section(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Hydraulic calculation error: {0}")]
    Calculation(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, HydraulicError>;
