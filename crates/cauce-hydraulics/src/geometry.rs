//! Section Geometry - Geometria de Secciones a una Elevacion de Agua
//!
//! Calcula las propiedades geometricas e hidraulicas de una seccion
//! irregular para una elevacion de superficie de agua (WSEL) dada, usando
//! el metodo de flujo dividido (Divided Channel Method): la seccion se
//! divide en llanura izquierda, canal principal y llanura derecha por las
//! estaciones de margen, y cada zona aporta area, perimetro, ancho y
//! conveyance propios.
//!
//! # Referencia:
//! - Chow, V.T. (1959) Open-Channel Hydraulics
//! - HEC-RAS Hydraulic Reference Manual, cap. 2

use crate::cross_section::{IrregularCrossSection, LeveeSide};
use crate::NaVec2;
use serde::{Deserialize, Serialize};

/// Zona de flujo de una seccion compuesta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowZone {
    /// Llanura de inundacion izquierda (LOB)
    LeftOverbank,
    /// Canal principal
    MainChannel,
    /// Llanura de inundacion derecha (ROB)
    RightOverbank,
}

impl FlowZone {
    /// Zona a la que pertenece una estacion segun las margenes
    pub fn of_station(station: f64, left_bank: f64, right_bank: f64) -> Self {
        if station < left_bank {
            FlowZone::LeftOverbank
        } else if station > right_bank {
            FlowZone::RightOverbank
        } else {
            FlowZone::MainChannel
        }
    }
}

/// Geometria de una zona individual
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneGeometry {
    /// Area mojada (m^2)
    pub area: f64,
    /// Perimetro mojado (m)
    pub wetted_perimeter: f64,
    /// Ancho superficial (m)
    pub top_width: f64,
    /// Radio hidraulico (m)
    pub hydraulic_radius: f64,
    /// Rugosidad de Manning efectiva de la zona
    pub manning_n: f64,
    /// Conveyance K = (1/n) * A * R^(2/3)
    pub conveyance: f64,
}

impl ZoneGeometry {
    fn dry(manning_n: f64) -> Self {
        Self {
            area: 0.0,
            wetted_perimeter: 0.0,
            top_width: 0.0,
            hydraulic_radius: 0.0,
            manning_n,
            conveyance: 0.0,
        }
    }
}

/// Geometria completa de una seccion a una elevacion de agua dada
///
/// Los totales son la suma de las tres zonas despues de aplicar
/// obstrucciones, areas inefectivas y diques.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossSectionGeometry {
    /// Elevacion de superficie de agua (m)
    pub wsel: f64,

    /// Area mojada total (m^2)
    pub area: f64,

    /// Perimetro mojado total (m)
    pub wetted_perimeter: f64,

    /// Ancho superficial total (m)
    pub top_width: f64,

    /// Radio hidraulico promedio (m)
    pub hydraulic_radius: f64,

    /// Profundidad hidraulica D = A/T (m)
    pub hydraulic_depth: f64,

    /// Conveyance total (m^3/s por unidad de pendiente^1/2)
    pub conveyance: f64,

    /// Profundidad maxima = WSEL - thalweg (m)
    pub max_depth: f64,

    /// Zona de llanura izquierda
    pub left_overbank: ZoneGeometry,

    /// Zona del canal principal
    pub main_channel: ZoneGeometry,

    /// Zona de llanura derecha
    pub right_overbank: ZoneGeometry,

    /// Factor de correccion de energia (Coriolis)
    pub alpha: f64,

    /// Factor de correccion de momentum (Boussinesq)
    pub beta: f64,

    /// Extension mojada (estacion minima, estacion maxima)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wet_extent: Option<(f64, f64)>,
}

impl CrossSectionGeometry {
    /// Geometria seca (WSEL en o bajo el thalweg)
    fn dry(section: &IrregularCrossSection, wsel: f64) -> Self {
        Self {
            wsel,
            area: 0.0,
            wetted_perimeter: 0.0,
            top_width: 0.0,
            hydraulic_radius: 0.0,
            hydraulic_depth: 0.0,
            conveyance: 0.0,
            max_depth: 0.0,
            left_overbank: ZoneGeometry::dry(section.manning.left_overbank),
            main_channel: ZoneGeometry::dry(section.manning.main_channel),
            right_overbank: ZoneGeometry::dry(section.manning.right_overbank),
            alpha: 1.0,
            beta: 1.0,
            wet_extent: None,
        }
    }

    /// Acceder a una zona por etiqueta
    pub fn zone(&self, zone: FlowZone) -> &ZoneGeometry {
        match zone {
            FlowZone::LeftOverbank => &self.left_overbank,
            FlowZone::MainChannel => &self.main_channel,
            FlowZone::RightOverbank => &self.right_overbank,
        }
    }

    /// Fraccion del conveyance total que lleva la llanura mas cargada
    pub fn overbank_conveyance_fraction(&self) -> f64 {
        if self.conveyance <= 0.0 {
            return 0.0;
        }
        self.left_overbank
            .conveyance
            .max(self.right_overbank.conveyance)
            / self.conveyance
    }
}

/// Acumulador por zona durante el barrido de segmentos
#[derive(Debug, Clone, Copy, Default)]
struct ZoneAccumulator {
    area: f64,
    perimeter: f64,
    top_width: f64,
    /// Suma de perimetro * n para rugosidad compuesta por tramos
    perimeter_times_n: f64,
}

/// Calcular la geometria de una seccion irregular a una elevacion dada
///
/// La seccion debe estar validada. Para WSEL en o bajo el thalweg se
/// retorna la geometria seca.
pub fn at(section: &IrregularCrossSection, wsel: f64) -> CrossSectionGeometry {
    let thalweg = section.min_elevation();
    if section.points.len() < 2 || wsel <= thalweg {
        return CrossSectionGeometry::dry(section, wsel);
    }

    let left_bank = section.bank_stations.left;
    let right_bank = section.bank_stations.right;

    let mut zones = [
        ZoneAccumulator::default(),
        ZoneAccumulator::default(),
        ZoneAccumulator::default(),
    ];
    let mut wet_min = f64::INFINITY;
    let mut wet_max = f64::NEG_INFINITY;

    for window in section.points.windows(2) {
        let (p1, p2) = (&window[0], &window[1]);
        let dx = p2.station - p1.station;
        if dx <= 0.0 {
            continue;
        }
        let dz = p2.elevation - p1.elevation;
        let y1 = (wsel - p1.elevation).max(0.0);
        let y2 = (wsel - p2.elevation).max(0.0);

        if y1 <= 0.0 && y2 <= 0.0 {
            continue;
        }

        let midpoint = 0.5 * (p1.station + p2.station);
        let zone_index = match FlowZone::of_station(midpoint, left_bank, right_bank) {
            FlowZone::LeftOverbank => 0,
            FlowZone::MainChannel => 1,
            FlowZone::RightOverbank => 2,
        };
        let zone_default_n = match zone_index {
            0 => section.manning.left_overbank,
            1 => section.manning.main_channel,
            _ => section.manning.right_overbank,
        };
        let segment_n = p1.manning_n.unwrap_or(zone_default_n);

        // Area del trapecio entre las dos verticales mojadas
        let segment_area = 0.5 * (y1 + y2) * dx;

        // Fraccion mojada del segmento (interseccion lineal con el WSEL)
        let full_length = NaVec2::new(dx, dz).norm();
        let (wet_fraction, seg_wet_min, seg_wet_max) = if y1 > 0.0 && y2 > 0.0 {
            (1.0, p1.station, p2.station)
        } else if y1 > 0.0 {
            // p2 seco: interseccion en t* = (wsel - z1) / dz
            let t = ((wsel - p1.elevation) / dz).clamp(0.0, 1.0);
            (t, p1.station, p1.station + t * dx)
        } else {
            // p1 seco
            let t = ((wsel - p1.elevation) / dz).clamp(0.0, 1.0);
            (1.0 - t, p1.station + t * dx, p2.station)
        };

        let accumulator = &mut zones[zone_index];
        accumulator.area += segment_area;
        let segment_perimeter = full_length * wet_fraction;
        accumulator.perimeter += segment_perimeter;
        accumulator.top_width += dx * wet_fraction;
        accumulator.perimeter_times_n += segment_perimeter * segment_n;

        wet_min = wet_min.min(seg_wet_min);
        wet_max = wet_max.max(seg_wet_max);
    }

    // Obstrucciones: area permanentemente bloqueada en cualquier zona
    let (extent_left, extent_right) = section.station_extent();
    for obstruction in &section.obstructions {
        let left = obstruction.left_station.max(extent_left);
        let right = obstruction.right_station.min(extent_right);
        if right <= left {
            continue;
        }
        let ground = section.min_ground_in_range(left, right);
        let blocked_height = (wsel.min(obstruction.elevation) - ground).max(0.0);
        if blocked_height <= 0.0 {
            continue;
        }
        let midpoint = 0.5 * (left + right);
        let zone_index = match FlowZone::of_station(midpoint, left_bank, right_bank) {
            FlowZone::LeftOverbank => 0,
            FlowZone::MainChannel => 1,
            FlowZone::RightOverbank => 2,
        };
        let accumulator = &mut zones[zone_index];
        accumulator.area = (accumulator.area - (right - left) * blocked_height).max(0.0);
    }

    // Areas inefectivas: activas si son permanentes o si el agua no supera
    // su umbral. Solo restan area de llanura; el perimetro no cambia.
    for area in &section.ineffective_areas {
        let active = area.permanent || wsel < area.elevation;
        if !active {
            continue;
        }
        let left = area.left_station.max(extent_left);
        let right = area.right_station.min(extent_right);
        if right <= left {
            continue;
        }

        let midpoint = 0.5 * (left + right);
        let zone_index = match FlowZone::of_station(midpoint, left_bank, right_bank) {
            FlowZone::LeftOverbank => 0,
            FlowZone::MainChannel => 1,
            FlowZone::RightOverbank => 2,
        };
        if zone_index == 1 {
            // El canal principal nunca se marca inefectivo
            continue;
        }

        let ground = section.min_ground_in_range(left, right);
        let slice_height = ((wsel - ground).min(area.elevation - ground)).max(0.0);
        if slice_height <= 0.0 {
            continue;
        }
        let accumulator = &mut zones[zone_index];
        accumulator.area = (accumulator.area - (right - left) * slice_height).max(0.0);
    }

    // Diques: mientras el agua no supera la corona, la llanura del lado
    // protegido queda completamente bloqueada
    for levee in &section.levees {
        if wsel >= levee.elevation {
            continue;
        }
        match levee.side {
            LeveeSide::Left => {
                zones[0] = ZoneAccumulator::default();
                if wet_min.is_finite() {
                    wet_min = wet_min.max(levee.station);
                }
            }
            LeveeSide::Right => {
                zones[2] = ZoneAccumulator::default();
                if wet_max.is_finite() {
                    wet_max = wet_max.min(levee.station);
                }
            }
        }
    }

    // Cerrar cada zona: rugosidad compuesta, radio hidraulico y conveyance
    let defaults = [
        section.manning.left_overbank,
        section.manning.main_channel,
        section.manning.right_overbank,
    ];
    let mut finished = Vec::with_capacity(3);
    for (accumulator, default_n) in zones.iter().zip(defaults) {
        let manning_n = if accumulator.perimeter > 0.0 {
            accumulator.perimeter_times_n / accumulator.perimeter
        } else {
            default_n
        };
        let hydraulic_radius = if accumulator.perimeter > 0.0 {
            accumulator.area / accumulator.perimeter
        } else {
            0.0
        };
        let conveyance = if accumulator.area > 0.0 && hydraulic_radius > 0.0 {
            (1.0 / manning_n) * accumulator.area * hydraulic_radius.powf(2.0 / 3.0)
        } else {
            0.0
        };
        finished.push(ZoneGeometry {
            area: accumulator.area,
            wetted_perimeter: accumulator.perimeter,
            top_width: accumulator.top_width,
            hydraulic_radius,
            manning_n,
            conveyance,
        });
    }
    let right_overbank = finished.pop().unwrap_or_else(|| ZoneGeometry::dry(0.03));
    let main_channel = finished.pop().unwrap_or_else(|| ZoneGeometry::dry(0.03));
    let left_overbank = finished.pop().unwrap_or_else(|| ZoneGeometry::dry(0.03));

    let total_area = left_overbank.area + main_channel.area + right_overbank.area;
    let total_perimeter = left_overbank.wetted_perimeter
        + main_channel.wetted_perimeter
        + right_overbank.wetted_perimeter;
    let total_top_width =
        left_overbank.top_width + main_channel.top_width + right_overbank.top_width;
    let total_conveyance =
        left_overbank.conveyance + main_channel.conveyance + right_overbank.conveyance;

    // Factores de correccion de velocidad:
    // α = Σ(Ki³/Ai²) / (K³/A²), β = Σ(Ki²/Ai) / (K²/A)
    let (alpha, beta) = if total_area > 0.0 && total_conveyance > 0.0 {
        let zone_list = [&left_overbank, &main_channel, &right_overbank];
        let sum_k3_a2 = zone_list
            .iter()
            .filter(|z| z.area > 0.0)
            .map(|z| z.conveyance.powi(3) / z.area.powi(2))
            .sum::<f64>();
        let sum_k2_a = zone_list
            .iter()
            .filter(|z| z.area > 0.0)
            .map(|z| z.conveyance.powi(2) / z.area)
            .sum::<f64>();

        let alpha = sum_k3_a2 * total_area.powi(2) / total_conveyance.powi(3);
        let beta = sum_k2_a * total_area / total_conveyance.powi(2);
        (alpha.max(1.0), beta.max(1.0))
    } else {
        (1.0, 1.0)
    };

    CrossSectionGeometry {
        wsel,
        area: total_area,
        wetted_perimeter: total_perimeter,
        top_width: total_top_width,
        hydraulic_radius: if total_perimeter > 0.0 {
            total_area / total_perimeter
        } else {
            0.0
        },
        hydraulic_depth: if total_top_width > 0.0 {
            total_area / total_top_width
        } else {
            0.0
        },
        conveyance: total_conveyance,
        max_depth: (wsel - thalweg).max(0.0),
        left_overbank,
        main_channel,
        right_overbank,
        alpha,
        beta,
        wet_extent: if wet_min.is_finite() && wet_max.is_finite() && wet_max > wet_min {
            Some((wet_min, wet_max))
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cross_section::{
        BankStations, IneffectiveArea, Levee, ManningZones, ReachLengths, StationElevation,
    };

    fn natural_section() -> IrregularCrossSection {
        IrregularCrossSection::new(
            "XS-geom",
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

    #[test]
    fn test_dry_below_thalweg() {
        let section = natural_section();
        let geometry = at(&section, 4.0);
        assert_eq!(geometry.area, 0.0);
        assert_eq!(geometry.conveyance, 0.0);
        assert_eq!(geometry.alpha, 1.0);
    }

    #[test]
    fn test_main_channel_only_below_banks() {
        let section = natural_section();
        // WSEL 7.0: two meters of water in the 6 m wide main channel
        let geometry = at(&section, 7.0);

        assert!(geometry.left_overbank.area < 1e-9);
        assert!(geometry.right_overbank.area < 1e-9);
        // Rectangular part 6x2 plus the two bank slope triangles
        assert!(geometry.main_channel.area > 12.0);
        assert!(geometry.area > 0.0);
    }

    #[test]
    fn test_totals_equal_zone_sums() {
        let section = natural_section();
        for wsel in [6.0, 7.5, 8.5, 9.5] {
            let g = at(&section, wsel);
            let zone_area = g.left_overbank.area + g.main_channel.area + g.right_overbank.area;
            let zone_k = g.left_overbank.conveyance
                + g.main_channel.conveyance
                + g.right_overbank.conveyance;
            assert!((g.area - zone_area).abs() < 1e-9);
            assert!((g.conveyance - zone_k).abs() < 1e-9);
        }
    }

    #[test]
    fn test_overbanks_engage_above_bank_elevation() {
        let section = natural_section();
        let geometry = at(&section, 9.0);
        assert!(geometry.left_overbank.area > 0.0);
        assert!(geometry.right_overbank.area > 0.0);
        // Compound section should raise alpha above one
        assert!(geometry.alpha > 1.0);
        assert!(geometry.beta >= 1.0);
    }

    #[test]
    fn test_levee_blocks_overbank_until_overtopped() {
        let section = natural_section().with_levee(Levee {
            station: 15.0,
            elevation: 9.5,
            side: LeveeSide::Right,
        });

        let blocked = at(&section, 9.0);
        assert_eq!(blocked.right_overbank.area, 0.0);
        assert_eq!(blocked.right_overbank.conveyance, 0.0);
        assert!(blocked.left_overbank.area > 0.0);

        let overtopped = at(&section, 9.8);
        assert!(overtopped.right_overbank.area > 0.0);
    }

    #[test]
    fn test_ineffective_area_subtracts_overbank_area_only() {
        let plain = natural_section();
        let with_ineffective = natural_section().with_ineffective_area(IneffectiveArea {
            left_station: 15.0,
            right_station: 19.0,
            elevation: 9.5,
            permanent: false,
        });

        let g_plain = at(&plain, 9.0);
        let g_ineffective = at(&with_ineffective, 9.0);

        assert!(g_ineffective.right_overbank.area < g_plain.right_overbank.area);
        // Perimeter is untouched by ineffective areas
        assert!(
            (g_ineffective.right_overbank.wetted_perimeter
                - g_plain.right_overbank.wetted_perimeter)
                .abs()
                < 1e-9
        );

        // Above the threshold the non-permanent area becomes effective again
        let g_above = at(&with_ineffective, 9.8);
        let g_plain_above = at(&plain, 9.8);
        assert!((g_above.area - g_plain_above.area).abs() < 1e-9);
    }

    #[test]
    fn test_wet_extent_grows_with_stage() {
        let section = natural_section();
        let low = at(&section, 6.0).wet_extent.expect("wet at 6.0");
        let high = at(&section, 9.0).wet_extent.expect("wet at 9.0");
        assert!(high.0 < low.0);
        assert!(high.1 > low.1);
    }
}
