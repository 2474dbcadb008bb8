//! Reports - Formateadores de Texto Plano
//!
//! Cada tipo de resultado del motor tiene un formateador de texto plano
//! con un orden de campos fijo, igual al de la estructura. El formato es
//! estable dentro de una version mayor: los generadores de documentos
//! aguas abajo pueden tomar snapshots de estas salidas.

use crate::direct_step::DirectStepResult;
use crate::mixed_flow::HydraulicJump;
use crate::reach::{
    FloodVolume, FloodplainMapping, RatingCurvePoint, ReachAnalysisResult, ShearDistribution,
    VelocityDistribution,
};
use crate::standard_step::WaterSurfaceProfile;
use crate::uniform::{IrregularFlowResult, PrismaticFlowResult};
use cauce_core::Quantity;
use std::fmt::Write as _;

fn line(out: &mut String, label: &str, value: String) {
    let _ = writeln!(out, "{:<26}{}", format!("{label}:"), value);
}

fn warnings_block(out: &mut String, warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    let _ = writeln!(out, "Warnings:");
    for warning in warnings {
        let _ = writeln!(out, "  - {warning}");
    }
}

/// Reporte de flujo uniforme en seccion prismatica
pub fn format_prismatic_flow(result: &PrismaticFlowResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Uniform Flow Report (prismatic) ===");
    line(&mut out, "Water depth", Quantity::Length.format(result.water_depth));
    line(&mut out, "Discharge", Quantity::Discharge.format(result.discharge));
    line(&mut out, "Velocity", Quantity::Velocity.format(result.velocity));
    line(&mut out, "Froude", Quantity::Dimensionless.format(result.froude));
    line(&mut out, "Flow regime", result.flow_regime.label().to_string());
    line(&mut out, "Flow area", Quantity::Area.format(result.area));
    line(
        &mut out,
        "Wetted perimeter",
        Quantity::Length.format(result.wetted_perimeter),
    );
    line(
        &mut out,
        "Hydraulic radius",
        Quantity::Length.format(result.hydraulic_radius),
    );
    line(&mut out, "Top width", Quantity::Length.format(result.top_width));
    line(
        &mut out,
        "Hydraulic depth",
        Quantity::Length.format(result.hydraulic_depth),
    );
    line(
        &mut out,
        "Specific energy",
        Quantity::Length.format(result.specific_energy),
    );
    line(&mut out, "Shear stress", Quantity::Shear.format(result.shear_stress));
    line(
        &mut out,
        "Critical depth",
        Quantity::Length.format(result.critical_depth),
    );
    line(
        &mut out,
        "Critical slope",
        Quantity::Slope.format(result.critical_slope),
    );
    line(&mut out, "Bed slope", Quantity::Slope.format(result.slope));
    line(
        &mut out,
        "Manning n",
        Quantity::Dimensionless.format(result.manning_n),
    );
    warnings_block(&mut out, &result.warnings);
    out
}

/// Reporte de flujo en seccion irregular
pub fn format_irregular_flow(result: &IrregularFlowResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Flow Report (natural section) ===");
    line(&mut out, "WSEL", Quantity::Length.format(result.wsel));
    line(&mut out, "Water depth", Quantity::Length.format(result.water_depth));
    line(&mut out, "Discharge", Quantity::Discharge.format(result.discharge));
    line(&mut out, "Velocity", Quantity::Velocity.format(result.velocity));
    line(
        &mut out,
        "Velocity head",
        Quantity::Length.format(result.velocity_head),
    );
    line(&mut out, "Froude", Quantity::Dimensionless.format(result.froude));
    line(&mut out, "Flow regime", result.flow_regime.label().to_string());
    line(
        &mut out,
        "Specific energy",
        Quantity::Length.format(result.specific_energy),
    );
    line(
        &mut out,
        "Friction slope",
        Quantity::Slope.format(result.friction_slope),
    );
    if let Some(shear) = result.shear_stress {
        line(&mut out, "Shear stress", Quantity::Shear.format(shear));
    }
    line(
        &mut out,
        "Critical WSEL",
        Quantity::Length.format(result.critical_wsel),
    );
    if let Some(normal) = result.normal_wsel {
        line(&mut out, "Normal WSEL", Quantity::Length.format(normal));
    }

    let geometry = &result.geometry;
    line(&mut out, "Flow area", Quantity::Area.format(geometry.area));
    line(&mut out, "Top width", Quantity::Length.format(geometry.top_width));
    line(
        &mut out,
        "Conveyance",
        Quantity::Dimensionless.format(geometry.conveyance),
    );
    line(&mut out, "Alpha", Quantity::Dimensionless.format(geometry.alpha));
    line(&mut out, "Beta", Quantity::Dimensionless.format(geometry.beta));

    let _ = writeln!(out, "Zone breakdown (area / conveyance):");
    for (name, zone) in [
        ("LOB", &geometry.left_overbank),
        ("Main", &geometry.main_channel),
        ("ROB", &geometry.right_overbank),
    ] {
        let _ = writeln!(
            out,
            "  {:<6}{:>14}{:>16}",
            name,
            Quantity::Area.format(zone.area),
            Quantity::Dimensionless.format(zone.conveyance),
        );
    }
    warnings_block(&mut out, &result.warnings);
    out
}

/// Reporte de un perfil de paso directo
pub fn format_direct_step(result: &DirectStepResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Direct Step Profile ===");
    line(&mut out, "Slope class", result.slope_class.label().to_string());
    line(
        &mut out,
        "Profile type",
        result
            .profile_type
            .map(|p| p.label().to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    line(
        &mut out,
        "Total length",
        Quantity::Station.format(result.total_length),
    );
    if let Some(normal) = result.normal_depth {
        line(&mut out, "Normal depth", Quantity::Length.format(normal));
    }
    line(
        &mut out,
        "Critical depth",
        Quantity::Length.format(result.critical_depth),
    );
    line(&mut out, "Discharge", Quantity::Discharge.format(result.discharge));
    line(&mut out, "Bed slope", Quantity::Slope.format(result.slope));
    line(
        &mut out,
        "Manning n",
        Quantity::Dimensionless.format(result.manning_n),
    );

    let _ = writeln!(out, "{:>10} {:>9} {:>9} {:>9} {:>6}", "Station", "Depth", "Vel", "E", "Fr");
    for point in &result.points {
        let _ = writeln!(
            out,
            "{:>10.2} {:>9.3} {:>9.3} {:>9.3} {:>6.3}",
            point.station, point.water_depth, point.velocity, point.specific_energy, point.froude,
        );
    }
    warnings_block(&mut out, &result.warnings);
    out
}

/// Reporte de un perfil de superficie de agua
pub fn format_profile(profile: &WaterSurfaceProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Water Surface Profile ===");
    line(&mut out, "Discharge", Quantity::Discharge.format(profile.discharge));
    line(&mut out, "Slope class", profile.slope_class.label().to_string());
    line(
        &mut out,
        "Profile type",
        profile
            .profile_type
            .map(|p| p.label().to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    line(&mut out, "Flow regime", profile.flow_regime.label().to_string());
    line(
        &mut out,
        "Direction",
        match profile.direction {
            crate::standard_step::ComputationDirection::Upstream => "Upstream".to_string(),
            crate::standard_step::ComputationDirection::Downstream => "Downstream".to_string(),
        },
    );
    line(
        &mut out,
        "Reach length",
        Quantity::Station.format(profile.reach_length),
    );
    line(
        &mut out,
        "Average slope",
        Quantity::Slope.format(profile.average_slope),
    );
    line(
        &mut out,
        "Converged",
        if profile.convergence.converged {
            "yes".to_string()
        } else {
            "no".to_string()
        },
    );
    if let Some(station) = profile.jump_station {
        line(&mut out, "Hydraulic jump at", Quantity::Station.format(station));
    }

    let _ = writeln!(
        out,
        "{:>10} {:>9} {:>9} {:>9} {:>9} {:>6} {:>5}",
        "Station", "WSEL", "EGL", "Depth", "Vel", "Fr", "Type"
    );
    for point in &profile.points {
        let _ = writeln!(
            out,
            "{:>10.2} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>6.3} {:>5}",
            point.station,
            point.wsel,
            point.energy_grade,
            point.water_depth,
            point.velocity,
            point.froude,
            point.profile_type.map(|p| p.label()).unwrap_or("-"),
        );
    }

    let summary = &profile.summary;
    line(
        &mut out,
        "Depth min/max",
        format!(
            "{} / {}",
            Quantity::Length.format(summary.min_depth),
            Quantity::Length.format(summary.max_depth)
        ),
    );
    line(
        &mut out,
        "Velocity min/max",
        format!(
            "{} / {}",
            Quantity::Velocity.format(summary.min_velocity),
            Quantity::Velocity.format(summary.max_velocity)
        ),
    );
    line(
        &mut out,
        "Friction loss",
        Quantity::Length.format(summary.friction_loss),
    );
    line(&mut out, "Eddy loss", Quantity::Length.format(summary.eddy_loss));
    line(
        &mut out,
        "Total head loss",
        Quantity::Length.format(summary.total_head_loss),
    );
    warnings_block(&mut out, &profile.warnings);
    out
}

/// Reporte de un salto hidraulico
pub fn format_jump(jump: &HydraulicJump) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Hydraulic Jump ===");
    line(&mut out, "Station", Quantity::Station.format(jump.station));
    line(
        &mut out,
        "Upstream depth",
        Quantity::Length.format(jump.upstream_depth),
    );
    line(
        &mut out,
        "Downstream depth",
        Quantity::Length.format(jump.downstream_depth),
    );
    line(
        &mut out,
        "Conjugate depth",
        Quantity::Length.format(jump.conjugate_depth),
    );
    line(
        &mut out,
        "Upstream Froude",
        Quantity::Dimensionless.format(jump.upstream_froude),
    );
    line(
        &mut out,
        "Downstream Froude",
        Quantity::Dimensionless.format(jump.downstream_froude),
    );
    line(&mut out, "Energy loss", Quantity::Length.format(jump.energy_loss));
    line(&mut out, "Jump length", Quantity::Length.format(jump.jump_length));
    line(
        &mut out,
        "Efficiency",
        Quantity::Dimensionless.format(jump.efficiency),
    );
    line(&mut out, "Jump type", jump.jump_type.label().to_string());
    out
}

/// Reporte del analisis de un tramo
pub fn format_reach_analysis(result: &ReachAnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Reach Analysis: {} ===", result.reach_name);
    line(
        &mut out,
        "WSEL min/max",
        format!(
            "{} / {}",
            Quantity::Length.format(result.min_wsel),
            Quantity::Length.format(result.max_wsel)
        ),
    );
    line(
        &mut out,
        "Mean velocity",
        Quantity::Velocity.format(result.mean_velocity),
    );
    line(
        &mut out,
        "Max velocity",
        Quantity::Velocity.format(result.max_velocity),
    );
    line(
        &mut out,
        "Mean Froude",
        Quantity::Dimensionless.format(result.mean_froude),
    );
    line(
        &mut out,
        "Lateral overflow",
        Quantity::Discharge.format(result.lateral_overflow),
    );
    line(
        &mut out,
        "Lateral diversion",
        Quantity::Discharge.format(result.lateral_diversion),
    );

    for bridge in &result.bridges {
        let _ = writeln!(
            out,
            "Bridge @ {}: backwater {}, upstream WSEL {}",
            Quantity::Station.format(bridge.station),
            Quantity::Length.format(bridge.result.backwater_rise),
            Quantity::Length.format(bridge.result.upstream_wsel),
        );
    }
    for culvert in &result.culverts {
        let _ = writeln!(
            out,
            "Culvert @ {}: HW/D {}, headwater {}",
            Quantity::Station.format(culvert.station),
            Quantity::Dimensionless.format(culvert.result.headwater_ratio),
            Quantity::Length.format(culvert.result.headwater_elevation),
        );
    }
    for weir in &result.inline_weirs {
        let _ = writeln!(
            out,
            "Inline weir @ {}: head {}, Q {}",
            Quantity::Station.format(weir.station),
            Quantity::Length.format(weir.head),
            Quantity::Discharge.format(weir.result.discharge),
        );
    }
    for weir in &result.lateral_weirs {
        let _ = writeln!(
            out,
            "Lateral weir @ {}: head {}, Q {}",
            Quantity::Station.format(weir.station),
            Quantity::Length.format(weir.head),
            Quantity::Discharge.format(weir.result.discharge),
        );
    }

    out.push_str(&format_profile(&result.profile));
    warnings_block(&mut out, &result.warnings);
    out
}

/// Reporte del analisis de un sistema de tramos
pub fn format_system_analysis(
    results: &indexmap::IndexMap<crate::ElementId, ReachAnalysisResult>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== River System Analysis ===");
    line(&mut out, "Reaches analyzed", results.len().to_string());
    line(
        &mut out,
        "Predominant regime",
        crate::reach::predominant_regime(results).label().to_string(),
    );
    for result in results.values() {
        let _ = writeln!(
            out,
            "  {:<24}{} - {}  Vmax {}",
            result.reach_name,
            Quantity::Length.format(result.min_wsel),
            Quantity::Length.format(result.max_wsel),
            Quantity::Velocity.format(result.max_velocity),
        );
    }
    out
}

/// Reporte de la delineacion de llanura de inundacion
pub fn format_floodplain(mappings: &[FloodplainMapping]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Floodplain Delineation ===");
    let _ = writeln!(
        out,
        "{:>10} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "Station", "WSEL", "Left", "Right", "TopWidth", "MaxDepth"
    );
    for mapping in mappings {
        let _ = writeln!(
            out,
            "{:>10.2} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>9.3}",
            mapping.station,
            mapping.wsel,
            mapping.left_floodplain_width,
            mapping.right_floodplain_width,
            mapping.top_width,
            mapping.max_depth,
        );
    }
    out
}

/// Reporte de volumenes de inundacion
pub fn format_flood_volume(volume: &FloodVolume) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Flood Volume ===");
    line(
        &mut out,
        "Station range",
        format!(
            "{} - {}",
            Quantity::Station.format(volume.start_station),
            Quantity::Station.format(volume.end_station)
        ),
    );
    line(
        &mut out,
        "Total volume",
        Quantity::Volume.format(volume.total_volume),
    );
    line(
        &mut out,
        "Main channel",
        Quantity::Volume.format(volume.main_channel_volume),
    );
    line(
        &mut out,
        "Left overbank",
        Quantity::Volume.format(volume.left_overbank_volume),
    );
    line(
        &mut out,
        "Right overbank",
        Quantity::Volume.format(volume.right_overbank_volume),
    );
    line(
        &mut out,
        "Surface area",
        Quantity::Area.format(volume.surface_area),
    );
    line(
        &mut out,
        "Average depth",
        Quantity::Length.format(volume.average_depth),
    );
    out
}

/// Reporte de una curva de gasto
pub fn format_rating_curve(points: &[RatingCurvePoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Rating Curve ===");
    let _ = writeln!(
        out,
        "{:>10} {:>9} {:>9} {:>9} {:>6} {:>10}",
        "Q", "WSEL", "Depth", "Vel", "Fr", "Freeboard"
    );
    for point in points {
        let _ = writeln!(
            out,
            "{:>10.3} {:>9.3} {:>9.3} {:>9.3} {:>6.3} {:>10.2}",
            point.discharge,
            point.wsel,
            point.depth,
            point.velocity,
            point.froude,
            point.freeboard,
        );
    }
    out
}

/// Reporte de la distribucion de velocidades
pub fn format_velocity_distribution(distribution: &VelocityDistribution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Velocity Distribution ===");
    line(&mut out, "WSEL", Quantity::Length.format(distribution.wsel));
    line(
        &mut out,
        "Discharge",
        Quantity::Discharge.format(distribution.discharge),
    );
    line(
        &mut out,
        "Mean depth",
        Quantity::Length.format(distribution.mean_depth),
    );
    line(
        &mut out,
        "Zone velocities",
        format!(
            "LOB {} / Main {} / ROB {}",
            Quantity::Velocity.format(distribution.zone_velocities.left_overbank),
            Quantity::Velocity.format(distribution.zone_velocities.main_channel),
            Quantity::Velocity.format(distribution.zone_velocities.right_overbank),
        ),
    );
    let _ = writeln!(out, "{:>10} {:>9} {:>9}", "Station", "Depth", "Vel");
    for point in &distribution.points {
        let _ = writeln!(
            out,
            "{:>10.2} {:>9.3} {:>9.3}",
            point.station, point.depth, point.velocity
        );
    }
    out
}

/// Reporte de la distribucion de cortante
pub fn format_shear_distribution(distribution: &ShearDistribution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Shear Distribution ===");
    line(&mut out, "WSEL", Quantity::Length.format(distribution.wsel));
    line(&mut out, "Slope", Quantity::Slope.format(distribution.slope));
    line(&mut out, "Max shear", Quantity::Shear.format(distribution.max_shear));
    line(
        &mut out,
        "Mean shear",
        Quantity::Shear.format(distribution.mean_shear),
    );
    let _ = writeln!(out, "{:>10} {:>9} {:>10}", "Station", "Depth", "Shear");
    for point in &distribution.points {
        let _ = writeln!(
            out,
            "{:>10.2} {:>9.3} {:>10.1}",
            point.station, point.depth, point.shear
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismatic::PrismaticSection;
    use crate::uniform::HydraulicsEngine;

    #[test]
    fn test_prismatic_report_field_order() {
        let section = PrismaticSection::rectangular(3.0);
        let result = HydraulicsEngine::analyze_prismatic(&section, 1.0, 0.001, 0.013).unwrap();
        let report = format_prismatic_flow(&result);

        let depth_at = report.find("Water depth").expect("has depth");
        let discharge_at = report.find("Discharge").expect("has discharge");
        let froude_at = report.find("Froude").expect("has froude");
        assert!(depth_at < discharge_at && discharge_at < froude_at);
        assert!(report.contains("m3/s"));
    }

    #[test]
    fn test_report_is_stable_across_runs() {
        let section = PrismaticSection::trapezoidal(2.0, 1.5);
        let result = HydraulicsEngine::analyze_prismatic(&section, 1.2, 0.002, 0.025).unwrap();

        let first = format_prismatic_flow(&result);
        let second = format_prismatic_flow(&result);
        assert_eq!(first, second);
    }
}
