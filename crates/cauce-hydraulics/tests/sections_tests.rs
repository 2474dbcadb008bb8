//! Integration tests for section geometry: prismatic closed forms and
//! irregular zone-aware geometry at a water surface elevation.

use approx::assert_relative_eq;
use cauce_hydraulics::{
    geometry, BankStations, IneffectiveArea, IrregularCrossSection, Levee, LeveeSide,
    ManningZones, PrismaticSection, ReachLengths, StationElevation,
};

fn natural_section() -> IrregularCrossSection {
    IrregularCrossSection::new(
        "Rio Claro km 12",
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

// ========== Prismatic Invariant Tests ==========

#[test]
fn hydraulic_radius_times_perimeter_recovers_area() {
    let sections = [
        PrismaticSection::rectangular(3.0),
        PrismaticSection::trapezoidal(2.0, 1.5),
        PrismaticSection::trapezoidal_asymmetric(1.5, 1.0, 2.5),
        PrismaticSection::triangular(2.0),
        PrismaticSection::circular(1.2),
        PrismaticSection::parabolic(4.0),
    ];

    for section in &sections {
        for depth in [0.05, 0.3, 0.8, 1.1, 3.0] {
            let area = section.area(depth);
            let product = section.hydraulic_radius(depth) * section.wetted_perimeter(depth);
            assert_relative_eq!(product, area, max_relative = 1e-9);
        }
    }
}

#[test]
fn full_circular_pipe_has_no_free_surface() {
    let pipe = PrismaticSection::circular(1.0);
    let props = pipe.hydraulic_properties(1.0);

    assert_eq!(props.top_width, 0.0);
    assert_relative_eq!(props.wetted_perimeter, std::f64::consts::PI, epsilon = 1e-12);
    assert_relative_eq!(
        props.area,
        std::f64::consts::PI / 4.0,
        epsilon = 1e-12
    );
}

#[test]
fn empty_sections_report_zeros() {
    for section in [
        PrismaticSection::rectangular(3.0),
        PrismaticSection::circular(1.0),
        PrismaticSection::parabolic(2.0),
    ] {
        let props = section.hydraulic_properties(0.0);
        assert_eq!(props.area, 0.0);
        assert_eq!(props.wetted_perimeter, 0.0);
        assert_eq!(props.top_width, 0.0);
        assert_eq!(props.hydraulic_radius, 0.0);
    }
}

// ========== Irregular Geometry Tests ==========

#[test]
fn totals_match_zone_sums_at_all_stages() {
    let section = natural_section();

    for wsel in [5.5, 6.5, 7.9, 8.1, 9.0, 9.9] {
        let g = geometry::at(&section, wsel);

        let area_sum = g.left_overbank.area + g.main_channel.area + g.right_overbank.area;
        let perimeter_sum = g.left_overbank.wetted_perimeter
            + g.main_channel.wetted_perimeter
            + g.right_overbank.wetted_perimeter;
        let width_sum =
            g.left_overbank.top_width + g.main_channel.top_width + g.right_overbank.top_width;
        let conveyance_sum = g.left_overbank.conveyance
            + g.main_channel.conveyance
            + g.right_overbank.conveyance;

        assert_relative_eq!(g.area, area_sum, epsilon = 1e-9);
        assert_relative_eq!(g.wetted_perimeter, perimeter_sum, epsilon = 1e-9);
        assert_relative_eq!(g.top_width, width_sum, epsilon = 1e-9);
        assert_relative_eq!(g.conveyance, conveyance_sum, epsilon = 1e-9);
    }
}

#[test]
fn overbanks_stay_dry_below_bank_elevation() {
    let section = natural_section();
    let g = geometry::at(&section, 7.5);

    // Bank tops sit at elevation 8: below that only the channel flows
    assert!(g.main_channel.area > 0.0);
    // The bank-slope segments belong to the overbank zones by midpoint
    assert!(g.left_overbank.top_width <= 2.0 + 1e-9);
    assert!(g.right_overbank.top_width <= 2.0 + 1e-9);
}

#[test]
fn levee_blocks_and_releases_overbank() {
    let leveed = natural_section().with_levee(Levee {
        station: 15.0,
        elevation: 9.5,
        side: LeveeSide::Right,
    });

    let blocked = geometry::at(&leveed, 9.0);
    assert_eq!(blocked.right_overbank.area, 0.0);
    assert_eq!(blocked.right_overbank.wetted_perimeter, 0.0);
    assert_eq!(blocked.right_overbank.top_width, 0.0);
    assert_eq!(blocked.right_overbank.conveyance, 0.0);

    // Overtopping the levee releases the overbank
    let released = geometry::at(&leveed, 9.6);
    assert!(released.right_overbank.area > 0.0);
    assert!(released.right_overbank.conveyance > 0.0);
}

#[test]
fn non_permanent_ineffective_area_activates_below_threshold() {
    let plain = natural_section();
    let section = natural_section().with_ineffective_area(IneffectiveArea {
        left_station: 0.0,
        right_station: 5.0,
        elevation: 9.5,
        permanent: false,
    });

    // Below the threshold the slice conveys nothing extra
    let below = geometry::at(&section, 9.0);
    let below_plain = geometry::at(&plain, 9.0);
    assert!(below.left_overbank.area < below_plain.left_overbank.area);
    // Wetted perimeter is never touched by ineffective areas
    assert_relative_eq!(
        below.left_overbank.wetted_perimeter,
        below_plain.left_overbank.wetted_perimeter,
        epsilon = 1e-9
    );

    // At or above the threshold the area becomes effective again
    let above = geometry::at(&section, 9.7);
    let above_plain = geometry::at(&plain, 9.7);
    assert_relative_eq!(above.area, above_plain.area, epsilon = 1e-9);
}

#[test]
fn permanent_ineffective_area_never_releases() {
    let section = natural_section().with_ineffective_area(IneffectiveArea {
        left_station: 0.0,
        right_station: 5.0,
        elevation: 9.0,
        permanent: true,
    });
    let plain = natural_section();

    let high = geometry::at(&section, 9.8);
    let high_plain = geometry::at(&plain, 9.8);
    assert!(high.left_overbank.area < high_plain.left_overbank.area);
}

#[test]
fn alpha_grows_when_overbanks_engage() {
    let section = natural_section();

    let channel_only = geometry::at(&section, 7.0);
    let compound = geometry::at(&section, 9.5);

    assert!(compound.alpha > channel_only.alpha);
    assert!(compound.alpha > 1.0);
    assert!(compound.beta >= 1.0);
}

// ========== Validation Tests ==========

#[test]
fn validation_reports_every_issue() {
    let mut section = natural_section();
    section.bank_stations = BankStations::new(13.0, 7.0);
    section.manning.main_channel = -0.01;

    let issues = section.validate();
    assert!(issues.len() >= 2);
    assert!(section.ensure_valid().is_err());
}

// ========== Interpolation Tests ==========

#[test]
fn interpolation_endpoints_reproduce_inputs() {
    let upstream = natural_section();
    let mut downstream = natural_section();
    downstream.river_station = 150.0;
    for point in &mut downstream.points {
        point.elevation -= 0.3;
    }
    downstream.manning = ManningZones::new(0.05, 0.03, 0.05);

    let at_start = IrregularCrossSection::interpolate(&upstream, &downstream, 0.0, 150.0);
    assert_relative_eq!(at_start.min_elevation(), upstream.min_elevation(), epsilon = 1e-9);
    assert_relative_eq!(
        at_start.manning.main_channel,
        upstream.manning.main_channel,
        epsilon = 1e-12
    );

    let at_end = IrregularCrossSection::interpolate(&upstream, &downstream, 150.0, 150.0);
    assert_relative_eq!(at_end.min_elevation(), downstream.min_elevation(), epsilon = 1e-9);
    assert_relative_eq!(
        at_end.manning.main_channel,
        downstream.manning.main_channel,
        epsilon = 1e-12
    );

    // Midway blends linearly
    let midway = IrregularCrossSection::interpolate(&upstream, &downstream, 75.0, 150.0);
    assert_relative_eq!(
        midway.min_elevation(),
        0.5 * (upstream.min_elevation() + downstream.min_elevation()),
        epsilon = 1e-9
    );
    assert_relative_eq!(midway.river_station, 75.0, epsilon = 1e-9);
}
