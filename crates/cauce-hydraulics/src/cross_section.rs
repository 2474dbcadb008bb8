//! Cross Sections - Secciones Transversales Irregulares
//!
//! Modelo de datos de secciones tipo rio: polilinea estacion-elevacion,
//! estaciones de margen (banks), rugosidades por zona (margen izquierda,
//! canal principal, margen derecha), areas inefectivas, diques (levees),
//! obstrucciones y longitudes de tramo hacia aguas abajo.
//!
//! Las secciones se tratan como inmutables durante un analisis: se validan
//! una vez y luego solo se consultan.

use crate::{ElementId, HydraulicError, Result};
use serde::{Deserialize, Serialize};

/// Punto estacion-elevacion de la polilinea de una seccion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationElevation {
    /// Estacion horizontal (m), creciente de izquierda a derecha mirando aguas abajo
    pub station: f64,

    /// Elevacion absoluta (m)
    pub elevation: f64,

    /// Rugosidad de Manning local (sobreescribe la de la zona)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manning_n: Option<f64>,
}

impl StationElevation {
    pub fn new(station: f64, elevation: f64) -> Self {
        Self {
            station,
            elevation,
            manning_n: None,
        }
    }

    pub fn with_manning(station: f64, elevation: f64, manning_n: f64) -> Self {
        Self {
            station,
            elevation,
            manning_n: Some(manning_n),
        }
    }
}

/// Estaciones de margen que separan el canal principal de las llanuras
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankStations {
    /// Margen izquierda (m)
    pub left: f64,
    /// Margen derecha (m)
    pub right: f64,
}

impl BankStations {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }
}

/// Rugosidades de Manning por zona de flujo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManningZones {
    /// Llanura de inundacion izquierda (LOB)
    pub left_overbank: f64,
    /// Canal principal
    pub main_channel: f64,
    /// Llanura de inundacion derecha (ROB)
    pub right_overbank: f64,
}

impl ManningZones {
    pub fn new(left_overbank: f64, main_channel: f64, right_overbank: f64) -> Self {
        Self {
            left_overbank,
            main_channel,
            right_overbank,
        }
    }

    /// Rugosidad uniforme en las tres zonas
    pub fn uniform(n: f64) -> Self {
        Self::new(n, n, n)
    }
}

/// Longitudes de tramo hacia la siguiente seccion aguas abajo, por zona
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachLengths {
    /// Por la llanura izquierda (m)
    pub left_overbank: f64,
    /// Por el canal principal (m)
    pub main_channel: f64,
    /// Por la llanura derecha (m)
    pub right_overbank: f64,
}

impl ReachLengths {
    pub fn new(left_overbank: f64, main_channel: f64, right_overbank: f64) -> Self {
        Self {
            left_overbank,
            main_channel,
            right_overbank,
        }
    }

    /// Longitud uniforme en las tres zonas
    pub fn uniform(length: f64) -> Self {
        Self::new(length, length, length)
    }

    /// Seccion terminal: sin tramo aguas abajo
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Promedio de las tres zonas, usado por el balance de energia
    pub fn average(&self) -> f64 {
        (self.left_overbank + self.main_channel + self.right_overbank) / 3.0
    }
}

/// Area inefectiva: almacena agua pero no conduce flujo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IneffectiveArea {
    /// Estacion izquierda del rango (m)
    pub left_station: f64,
    /// Estacion derecha del rango (m)
    pub right_station: f64,
    /// Elevacion umbral (m)
    pub elevation: f64,
    /// Si es permanente, nunca se vuelve efectiva
    #[serde(default)]
    pub permanent: bool,
}

/// Lado de un dique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeveeSide {
    Left,
    Right,
}

/// Dique: mientras el agua no supera su corona, bloquea por completo la
/// llanura de su lado
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levee {
    /// Estacion del dique (m)
    pub station: f64,
    /// Elevacion de la corona (m)
    pub elevation: f64,
    /// Lado protegido
    pub side: LeveeSide,
}

/// Obstruccion bloqueada: area permanentemente excluida del flujo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Obstruction {
    /// Estacion izquierda (m)
    pub left_station: f64,
    /// Estacion derecha (m)
    pub right_station: f64,
    /// Elevacion superior de la obstruccion (m)
    pub elevation: f64,
}

/// Coeficientes de perdida por contraccion y expansion entre secciones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionContraction {
    /// Coeficiente de contraccion Cc
    pub contraction: f64,
    /// Coeficiente de expansion Ce
    pub expansion: f64,
}

impl Default for ExpansionContraction {
    fn default() -> Self {
        Self {
            contraction: 0.1,
            expansion: 0.3,
        }
    }
}

/// Problema detectado al validar una seccion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub message: String,
}

impl ValidationIssue {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Seccion transversal irregular de un rio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrregularCrossSection {
    /// Identificador unico
    pub id: ElementId,

    /// Nombre descriptivo
    pub name: String,

    /// Estacion de rio (m), creciente hacia aguas abajo
    pub river_station: f64,

    /// Polilinea estacion-elevacion, ordenada por estacion
    pub points: Vec<StationElevation>,

    /// Estaciones de margen
    pub bank_stations: BankStations,

    /// Rugosidades por zona
    pub manning: ManningZones,

    /// Longitudes de tramo hacia la siguiente seccion aguas abajo
    pub downstream_reach_lengths: ReachLengths,

    /// Areas inefectivas
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ineffective_areas: Vec<IneffectiveArea>,

    /// Diques
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levees: Vec<Levee>,

    /// Obstrucciones bloqueadas
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obstructions: Vec<Obstruction>,

    /// Coeficientes de perdida para transiciones
    #[serde(default)]
    pub loss_coefficients: ExpansionContraction,
}

impl IrregularCrossSection {
    /// Crear nueva seccion; los puntos se ordenan por estacion
    pub fn new(
        name: impl Into<String>,
        river_station: f64,
        mut points: Vec<StationElevation>,
        bank_stations: BankStations,
        manning: ManningZones,
        downstream_reach_lengths: ReachLengths,
    ) -> Self {
        points.sort_by(|a, b| a.station.total_cmp(&b.station));
        Self {
            id: ElementId::new(),
            name: name.into(),
            river_station,
            points,
            bank_stations,
            manning,
            downstream_reach_lengths,
            ineffective_areas: Vec::new(),
            levees: Vec::new(),
            obstructions: Vec::new(),
            loss_coefficients: ExpansionContraction::default(),
        }
    }

    /// Builder pattern: agregar area inefectiva
    pub fn with_ineffective_area(mut self, area: IneffectiveArea) -> Self {
        self.ineffective_areas.push(area);
        self
    }

    /// Builder pattern: agregar dique
    pub fn with_levee(mut self, levee: Levee) -> Self {
        self.levees.push(levee);
        self
    }

    /// Builder pattern: agregar obstruccion
    pub fn with_obstruction(mut self, obstruction: Obstruction) -> Self {
        self.obstructions.push(obstruction);
        self
    }

    /// Builder pattern: establecer coeficientes de perdida
    pub fn with_loss_coefficients(mut self, coefficients: ExpansionContraction) -> Self {
        self.loss_coefficients = coefficients;
        self
    }

    /// Elevacion minima de la seccion (thalweg)
    pub fn min_elevation(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.elevation)
            .fold(f64::INFINITY, f64::min)
    }

    /// Elevacion maxima de la seccion
    pub fn max_elevation(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.elevation)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Extension horizontal (estacion minima, estacion maxima)
    pub fn station_extent(&self) -> (f64, f64) {
        let min = self
            .points
            .first()
            .map(|p| p.station)
            .unwrap_or(0.0);
        let max = self.points.last().map(|p| p.station).unwrap_or(0.0);
        (min, max)
    }

    /// Elevacion del terreno en una estacion, interpolada linealmente
    /// y fijada a los extremos fuera del rango
    pub fn ground_elevation_at(&self, station: f64) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        if self.points.len() == 1 || station <= self.points[0].station {
            return self.points[0].elevation;
        }

        for window in self.points.windows(2) {
            let (p1, p2) = (&window[0], &window[1]);
            if station >= p1.station && station <= p2.station {
                let span = p2.station - p1.station;
                if span <= 0.0 {
                    return p1.elevation;
                }
                let t = (station - p1.station) / span;
                return p1.elevation + t * (p2.elevation - p1.elevation);
            }
        }

        self.points.last().map(|p| p.elevation).unwrap_or(0.0)
    }

    /// Elevacion minima del terreno dentro de un rango de estaciones
    pub fn min_ground_in_range(&self, left: f64, right: f64) -> f64 {
        let mut min = f64::INFINITY;
        for p in &self.points {
            if p.station >= left && p.station <= right {
                min = min.min(p.elevation);
            }
        }
        // Bordes del rango por interpolacion
        min = min.min(self.ground_elevation_at(left));
        min = min.min(self.ground_elevation_at(right));
        min
    }

    /// Validar la seccion; retorna la lista completa de problemas
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if self.points.len() < 3 {
            issues.push(ValidationIssue::new(
                "Cross-section needs at least 3 station-elevation points",
            ));
        }

        for p in &self.points {
            if !p.station.is_finite() || !p.elevation.is_finite() {
                issues.push(ValidationIssue::new(
                    "Station and elevation values must be finite",
                ));
                break;
            }
        }

        if let Some(n) = self
            .points
            .iter()
            .filter_map(|p| p.manning_n)
            .find(|n| *n <= 0.0)
        {
            issues.push(ValidationIssue::new(format!(
                "Point Manning n must be positive, got {}",
                n
            )));
        }

        if !self.points.is_empty() {
            let (min_station, max_station) = self.station_extent();
            if self.bank_stations.left < min_station || self.bank_stations.right > max_station {
                issues.push(ValidationIssue::new(
                    "Bank stations must lie inside the section extent",
                ));
            }
        }

        if self.bank_stations.left >= self.bank_stations.right {
            issues.push(ValidationIssue::new(
                "Left bank station must be less than right bank station",
            ));
        }

        if self.manning.left_overbank <= 0.0
            || self.manning.main_channel <= 0.0
            || self.manning.right_overbank <= 0.0
        {
            issues.push(ValidationIssue::new("Manning n must be positive"));
        }

        if self.downstream_reach_lengths.left_overbank < 0.0
            || self.downstream_reach_lengths.main_channel < 0.0
            || self.downstream_reach_lengths.right_overbank < 0.0
        {
            issues.push(ValidationIssue::new("Reach lengths must be non-negative"));
        }

        for area in &self.ineffective_areas {
            if area.left_station >= area.right_station {
                issues.push(ValidationIssue::new(
                    "Ineffective area must have left station < right station",
                ));
            }
        }

        for obstruction in &self.obstructions {
            if obstruction.left_station >= obstruction.right_station {
                issues.push(ValidationIssue::new(
                    "Obstruction must have left station < right station",
                ));
            }
        }

        issues
    }

    /// Validar y convertir el primer problema en error
    pub fn ensure_valid(&self) -> Result<()> {
        match self.validate().into_iter().next() {
            Some(issue) => Err(HydraulicError::Validation(issue.message)),
            None => Ok(()),
        }
    }

    /// Interpolar una seccion intermedia entre dos secciones
    ///
    /// `distance` es la distancia desde `upstream`; `total_distance` la
    /// separacion entre ambas. Estaciones, elevaciones, margenes,
    /// rugosidades y coeficientes se mezclan linealmente con
    /// t = distance / total_distance.
    pub fn interpolate(
        upstream: &IrregularCrossSection,
        downstream: &IrregularCrossSection,
        distance: f64,
        total_distance: f64,
    ) -> IrregularCrossSection {
        let t = if total_distance > 0.0 {
            (distance / total_distance).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let lerp = |a: f64, b: f64| a + (b - a) * t;

        let count = upstream.points.len().max(downstream.points.len()).max(2);
        let mut points = Vec::with_capacity(count);
        for i in 0..count {
            let u = i as f64 / (count - 1) as f64;
            let (s1, z1, n1) = sample_polyline(&upstream.points, u);
            let (s2, z2, n2) = sample_polyline(&downstream.points, u);
            let manning_n = match (n1, n2) {
                (Some(a), Some(b)) => Some(lerp(a, b)),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            };
            points.push(StationElevation {
                station: lerp(s1, s2),
                elevation: lerp(z1, z2),
                manning_n,
            });
        }

        IrregularCrossSection {
            id: ElementId::new(),
            name: format!("{} ~ {}", upstream.name, downstream.name),
            river_station: lerp(upstream.river_station, downstream.river_station),
            points,
            bank_stations: BankStations::new(
                lerp(upstream.bank_stations.left, downstream.bank_stations.left),
                lerp(upstream.bank_stations.right, downstream.bank_stations.right),
            ),
            manning: ManningZones::new(
                lerp(upstream.manning.left_overbank, downstream.manning.left_overbank),
                lerp(upstream.manning.main_channel, downstream.manning.main_channel),
                lerp(
                    upstream.manning.right_overbank,
                    downstream.manning.right_overbank,
                ),
            ),
            downstream_reach_lengths: ReachLengths::new(
                lerp(
                    upstream.downstream_reach_lengths.left_overbank,
                    downstream.downstream_reach_lengths.left_overbank,
                ),
                lerp(
                    upstream.downstream_reach_lengths.main_channel,
                    downstream.downstream_reach_lengths.main_channel,
                ),
                lerp(
                    upstream.downstream_reach_lengths.right_overbank,
                    downstream.downstream_reach_lengths.right_overbank,
                ),
            ),
            ineffective_areas: Vec::new(),
            levees: Vec::new(),
            obstructions: Vec::new(),
            loss_coefficients: ExpansionContraction {
                contraction: lerp(
                    upstream.loss_coefficients.contraction,
                    downstream.loss_coefficients.contraction,
                ),
                expansion: lerp(
                    upstream.loss_coefficients.expansion,
                    downstream.loss_coefficients.expansion,
                ),
            },
        }
    }
}

/// Muestrear una polilinea en la fraccion `u` de su espacio de indices
fn sample_polyline(points: &[StationElevation], u: f64) -> (f64, f64, Option<f64>) {
    if points.is_empty() {
        return (0.0, 0.0, None);
    }
    if points.len() == 1 {
        let p = &points[0];
        return (p.station, p.elevation, p.manning_n);
    }

    let position = u.clamp(0.0, 1.0) * (points.len() - 1) as f64;
    let index = (position.floor() as usize).min(points.len() - 2);
    let frac = position - index as f64;
    let (p1, p2) = (&points[index], &points[index + 1]);

    (
        p1.station + frac * (p2.station - p1.station),
        p1.elevation + frac * (p2.elevation - p1.elevation),
        p1.manning_n,
    )
}
