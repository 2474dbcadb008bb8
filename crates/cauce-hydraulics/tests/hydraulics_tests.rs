//! Integration tests for uniform-flow hydraulics: Manning solvers,
//! critical/normal depths and elevations, and flow reports.

use approx::assert_relative_eq;
use cauce_hydraulics::{
    BankStations, FlowRegime, HydraulicsEngine, IrregularCrossSection, ManningZones,
    PrismaticSection, ReachLengths, SolverConfig, StationElevation,
};

fn river_section() -> IrregularCrossSection {
    IrregularCrossSection::new(
        "Scenario section",
        0.0,
        vec![
            StationElevation::new(0.0, 10.0),
            StationElevation::new(5.0, 8.0),
            StationElevation::new(7.0, 5.0),
            StationElevation::new(13.0, 5.0),
            StationElevation::new(15.0, 8.0),
            StationElevation::new(20.0, 10.0),
        ],
        BankStations::new(7.0, 13.0),
        ManningZones::new(0.06, 0.035, 0.06),
        ReachLengths::uniform(100.0),
    )
}

// ========== Critical Depth Tests ==========

#[test]
fn closed_form_and_bisection_critical_depth_agree() {
    let config = SolverConfig {
        tolerance: 1e-8,
        max_iterations: 200,
    };

    for (width, discharge) in [(2.0, 3.0), (3.0, 5.0), (6.0, 25.0)] {
        let section = PrismaticSection::rectangular(width);
        let closed = HydraulicsEngine::critical_depth(&section, discharge, &config);
        let bisected = HydraulicsEngine::critical_depth_bisection(&section, discharge, &config);
        assert!(
            (closed.value - bisected.value).abs() < 1e-6,
            "b={width} Q={discharge}: {} vs {}",
            closed.value,
            bisected.value
        );
    }
}

#[test]
fn critical_depth_satisfies_froude_condition() {
    let section = PrismaticSection::trapezoidal(2.0, 1.5);
    let config = SolverConfig::default();
    let yc = HydraulicsEngine::critical_depth(&section, 10.0, &config).value;

    let props = section.hydraulic_properties(yc);
    let velocity = 10.0 / props.area;
    let froude = HydraulicsEngine::froude_number(velocity, props.hydraulic_depth);
    assert_relative_eq!(froude, 1.0, max_relative = 1e-3);
}

// ========== Manning Inversion Tests ==========

#[test]
fn normal_depth_inverts_manning_flow() {
    let config = SolverConfig::default();
    let cases = [
        (PrismaticSection::rectangular(3.0), 0.001, 0.013, 1.2),
        (PrismaticSection::trapezoidal(2.0, 1.5), 0.002, 0.025, 0.9),
        (PrismaticSection::triangular(2.0), 0.005, 0.020, 1.5),
        (PrismaticSection::parabolic(4.0), 0.001, 0.030, 1.1),
    ];

    for (section, slope, manning_n, depth) in cases {
        let discharge = HydraulicsEngine::manning_flow_prismatic(&section, depth, slope, manning_n);
        let recovered =
            HydraulicsEngine::normal_depth(&section, discharge, slope, manning_n, &config)
                .unwrap();
        assert!(
            (recovered.value - depth).abs() < 1e-3,
            "{:?}: expected {depth}, got {}",
            section,
            recovered.value
        );
    }
}

#[test]
fn normal_wsel_inverts_irregular_manning_flow() {
    let section = river_section();
    let config = SolverConfig::default();
    let slope = 0.002;

    let wsel = 7.4;
    let discharge = HydraulicsEngine::manning_flow_irregular(&section, wsel, slope);
    let recovered = HydraulicsEngine::normal_wsel(&section, discharge, slope, &config).unwrap();

    assert!(recovered.converged);
    assert!((recovered.value - wsel).abs() < 1e-3);
}

// ========== Scenario: natural section ==========

#[test]
fn natural_section_normal_stage_lands_in_channel_range() {
    // Q = 40 m³/s on S = 0.002: stage must land between the channel
    // invert and the bank tops plus a little overbank
    let section = river_section();
    let config = SolverConfig::default();

    let normal = HydraulicsEngine::normal_wsel(&section, 40.0, 0.002, &config).unwrap();
    assert!(normal.converged);
    assert!(normal.value > 7.0 && normal.value < 9.0, "WSEL = {}", normal.value);

    // Overbank geometry engages only above the bank tops
    let report_low = HydraulicsEngine::analyze_irregular(&section, 7.9, 40.0, Some(0.002)).unwrap();
    let report_high = HydraulicsEngine::analyze_irregular(&section, 8.6, 40.0, Some(0.002)).unwrap();
    let low_overbank =
        report_low.geometry.left_overbank.area + report_low.geometry.right_overbank.area;
    let high_overbank =
        report_high.geometry.left_overbank.area + report_high.geometry.right_overbank.area;
    assert!(high_overbank > low_overbank);
}

#[test]
fn wide_overbanks_raise_the_overbank_flow_warning() {
    // Broad, shallow floodplains with a narrow channel push more than 20%
    // of the conveyance out of the main channel
    let section = IrregularCrossSection::new(
        "Floodplain section",
        0.0,
        vec![
            StationElevation::new(0.0, 9.0),
            StationElevation::new(30.0, 7.0),
            StationElevation::new(34.0, 5.0),
            StationElevation::new(38.0, 5.0),
            StationElevation::new(42.0, 7.0),
            StationElevation::new(72.0, 9.0),
        ],
        BankStations::new(34.0, 38.0),
        ManningZones::new(0.04, 0.035, 0.04),
        ReachLengths::uniform(50.0),
    );

    let report = HydraulicsEngine::analyze_irregular(&section, 8.6, 60.0, Some(0.002)).unwrap();
    assert!(report.geometry.overbank_conveyance_fraction() > 0.2);
    assert!(report
        .warnings
        .iter()
        .any(|w| w == "Significant overbank flow"));
}

// ========== Flow Report Tests ==========

#[test]
fn prismatic_report_is_internally_consistent() {
    let section = PrismaticSection::trapezoidal(2.0, 1.5);
    let report = HydraulicsEngine::analyze_prismatic(&section, 1.0, 0.002, 0.025).unwrap();

    assert_relative_eq!(
        report.discharge,
        report.velocity * report.area,
        max_relative = 1e-9
    );
    assert_relative_eq!(
        report.specific_energy,
        report.water_depth + report.velocity.powi(2) / (2.0 * 9.81),
        max_relative = 1e-9
    );
    assert_eq!(report.flow_regime, FlowRegime::from_froude(report.froude));
}

#[test]
fn zero_discharge_yields_zero_report() {
    let section = PrismaticSection::rectangular(3.0);
    let report = HydraulicsEngine::analyze_prismatic(&section, 1.0, 0.0, 0.013).unwrap();

    assert_eq!(report.discharge, 0.0);
    assert_eq!(report.velocity, 0.0);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("Zero discharge")));
}

#[test]
fn low_velocity_and_erosion_warnings() {
    let section = PrismaticSection::rectangular(10.0);

    // Nearly flat slope: crawling flow
    let slow = HydraulicsEngine::analyze_prismatic(&section, 0.5, 0.00001, 0.030).unwrap();
    assert!(slow.warnings.iter().any(|w| w == "Low velocity"));

    // Very steep chute: erosive flow
    let fast = HydraulicsEngine::analyze_prismatic(&section, 2.0, 0.05, 0.012).unwrap();
    assert!(fast.warnings.iter().any(|w| w == "Erosion risk"));
}

#[test]
fn lining_check_against_material_limits() {
    use cauce_hydraulics::ChannelMaterial;

    let section = PrismaticSection::trapezoidal(2.0, 1.5);
    let report = HydraulicsEngine::analyze_prismatic(&section, 1.0, 0.002, 0.025).unwrap();

    let concrete =
        HydraulicsEngine::check_lining(ChannelMaterial::ConcreteFinished, report.velocity, report.shear_stress);
    assert!(concrete.velocity_ok);

    // Bare earth cannot take the same shear
    let earth =
        HydraulicsEngine::check_lining(ChannelMaterial::EarthClean, report.velocity, report.shear_stress);
    assert!(!earth.shear_ok);
    assert!(!earth.warnings.is_empty());
}

// ========== Critical vs Normal Stage Tests ==========

#[test]
fn critical_wsel_below_normal_wsel_on_mild_slope() {
    let section = river_section();
    let config = SolverConfig::default();

    let critical = HydraulicsEngine::critical_wsel(&section, 40.0, &config);
    let normal = HydraulicsEngine::normal_wsel(&section, 40.0, 0.002, &config).unwrap();

    assert!(critical.value < normal.value);
}
