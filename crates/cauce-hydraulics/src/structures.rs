//! Structures - Estructuras Hidraulicas como Colaboradores Externos
//!
//! El motor no calcula la hidraulica interna de puentes, alcantarillas ni
//! vertederos: los trata como capacidades invocables a traves de traits.
//! Cada estructura recibe los niveles que necesita y retorna cargas,
//! sobreelevaciones, tipo de control y advertencias.
//!
//! Se incluye un vertedero rectangular de cresta aguda como implementacion
//! de referencia (Q = Cd L H^1.5) util para vertederos laterales y de
//! pruebas.

use crate::standard_step::StageDischargePoint;
use crate::{ElementId, G};
use serde::{Deserialize, Serialize};

/// Resultado del analisis de un puente
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResult {
    /// Sobreelevacion por remanso (m)
    pub backwater_rise: f64,
    /// Elevacion de agua aguas arriba del puente (m)
    pub upstream_wsel: f64,
    /// Advertencias
    pub warnings: Vec<String>,
}

/// Hidraulica de un puente
pub trait BridgeHydraulics: std::fmt::Debug {
    /// Estacion de rio donde se ubica el puente (m)
    fn station(&self) -> f64;

    /// Analizar el puente dado el nivel aguas abajo y el caudal
    fn analyze(&self, downstream_wsel: f64, discharge: f64) -> BridgeResult;
}

/// Tipo de control de una alcantarilla
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CulvertControl {
    /// Control de entrada
    Inlet,
    /// Control de salida
    Outlet,
}

/// Resultado del analisis de una alcantarilla
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulvertResult {
    /// Tipo de control
    pub control: CulvertControl,
    /// Relacion carga de entrada / diametro HW/D
    pub headwater_ratio: f64,
    /// Elevacion de la carga de entrada (m)
    pub headwater_elevation: f64,
    /// Advertencias
    pub warnings: Vec<String>,
}

/// Hidraulica de una alcantarilla
pub trait CulvertHydraulics: std::fmt::Debug {
    /// Estacion de rio donde se ubica la alcantarilla (m)
    fn station(&self) -> f64;

    /// Analizar la alcantarilla dado el nivel de descarga y el caudal
    fn analyze(&self, tailwater_elevation: f64, discharge: f64) -> CulvertResult;
}

/// Resultado del analisis de un vertedero
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeirResult {
    /// Caudal sobre el vertedero (m^3/s)
    pub discharge: f64,
    /// Advertencias
    pub warnings: Vec<String>,
}

/// Hidraulica de un vertedero (en linea o lateral)
pub trait WeirHydraulics: std::fmt::Debug {
    /// Estacion de rio donde se ubica el vertedero (m)
    fn station(&self) -> f64;

    /// Elevacion de la cresta (m)
    fn crest_elevation(&self) -> f64;

    /// Caudal para una carga sobre la cresta dada (m)
    fn analyze(&self, head: f64) -> WeirResult;
}

/// Vertedero rectangular de cresta aguda: Q = Cd L H^1.5
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharpCrestedWeir {
    /// Identificador unico
    pub id: ElementId,
    /// Estacion de rio (m)
    pub station: f64,
    /// Longitud de la cresta (m)
    pub crest_length: f64,
    /// Elevacion de la cresta (m)
    pub crest_elevation: f64,
    /// Coeficiente de descarga Cd (SI)
    pub discharge_coefficient: f64,
}

impl SharpCrestedWeir {
    /// Crear vertedero con el coeficiente tipico de cresta aguda en SI
    pub fn new(station: f64, crest_length: f64, crest_elevation: f64) -> Self {
        Self {
            id: ElementId::new(),
            station,
            crest_length,
            crest_elevation,
            discharge_coefficient: 1.84,
        }
    }

    /// Builder pattern: establecer coeficiente de descarga
    pub fn with_coefficient(mut self, coefficient: f64) -> Self {
        self.discharge_coefficient = coefficient;
        self
    }
}

impl WeirHydraulics for SharpCrestedWeir {
    fn station(&self) -> f64 {
        self.station
    }

    fn crest_elevation(&self) -> f64 {
        self.crest_elevation
    }

    fn analyze(&self, head: f64) -> WeirResult {
        if head <= 0.0 {
            return WeirResult {
                discharge: 0.0,
                warnings: Vec::new(),
            };
        }

        let discharge = self.discharge_coefficient * self.crest_length * head.powf(1.5);
        let mut warnings = Vec::new();
        // La formula de cresta aguda pierde precision con cargas grandes
        // respecto a la altura de la cresta
        if head > 0.5 * self.crest_length.max(0.1) {
            warnings.push("Weir head is large for the crest length".to_string());
        }

        WeirResult {
            discharge,
            warnings,
        }
    }
}

/// Derivacion lateral definida por una curva nivel-caudal con tope maximo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LateralDiversion {
    /// Identificador unico
    pub id: ElementId,
    /// Nombre descriptivo
    pub name: String,
    /// Estacion de rio (m)
    pub station: f64,
    /// Curva nivel -> caudal derivado, ordenada por caudal creciente
    pub curve: Vec<StageDischargePoint>,
    /// Caudal maximo derivable (m^3/s)
    pub max_diversion: f64,
}

impl LateralDiversion {
    pub fn new(
        name: impl Into<String>,
        station: f64,
        curve: Vec<StageDischargePoint>,
        max_diversion: f64,
    ) -> Self {
        Self {
            id: ElementId::new(),
            name: name.into(),
            station,
            curve,
            max_diversion,
        }
    }

    /// Caudal derivado para una elevacion de agua dada
    ///
    /// Interpola linealmente la curva nivel-caudal (fijada a los
    /// extremos) y aplica el tope maximo.
    pub fn diverted_flow(&self, wsel: f64) -> f64 {
        if self.curve.is_empty() {
            return 0.0;
        }

        let mut curve = self.curve.clone();
        curve.sort_by(|a, b| a.wsel.total_cmp(&b.wsel));

        let flow = if wsel <= curve[0].wsel {
            curve[0].discharge
        } else if wsel >= curve[curve.len() - 1].wsel {
            curve[curve.len() - 1].discharge
        } else {
            let mut interpolated = curve[curve.len() - 1].discharge;
            for window in curve.windows(2) {
                let (a, b) = (&window[0], &window[1]);
                if wsel >= a.wsel && wsel <= b.wsel {
                    let span = b.wsel - a.wsel;
                    interpolated = if span > 0.0 {
                        a.discharge + (wsel - a.wsel) / span * (b.discharge - a.discharge)
                    } else {
                        a.discharge
                    };
                    break;
                }
            }
            interpolated
        };

        flow.min(self.max_diversion).max(0.0)
    }
}

/// Carga sobre una compuerta con descarga libre: h = (Q / (C a))² / 2g
pub fn gate_free_flow_head(discharge: f64, opening_area: f64, coefficient: f64) -> f64 {
    if opening_area <= 0.0 || coefficient <= 0.0 {
        return 0.0;
    }
    (discharge / (coefficient * opening_area)).powi(2) / (2.0 * G)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharp_crested_weir_discharge() {
        let weir = SharpCrestedWeir::new(50.0, 3.0, 10.0);

        // Q = 1.84 * 3.0 * 0.5^1.5
        let result = weir.analyze(0.5);
        let expected = 1.84 * 3.0 * 0.5_f64.powf(1.5);
        assert!((result.discharge - expected).abs() < 1e-12);

        // No head, no flow
        assert_eq!(weir.analyze(-0.1).discharge, 0.0);
    }

    #[test]
    fn test_lateral_diversion_interpolates_and_caps() {
        let diversion = LateralDiversion::new(
            "Canal de riego",
            25.0,
            vec![
                StageDischargePoint {
                    discharge: 0.0,
                    wsel: 10.0,
                },
                StageDischargePoint {
                    discharge: 4.0,
                    wsel: 12.0,
                },
            ],
            3.0,
        );

        assert_eq!(diversion.diverted_flow(9.0), 0.0);
        assert!((diversion.diverted_flow(11.0) - 2.0).abs() < 1e-12);
        // Above the curve the cap applies
        assert!((diversion.diverted_flow(13.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_gate_free_flow_head() {
        let head = gate_free_flow_head(6.0, 2.0, 0.6);
        let expected = (6.0f64 / (0.6 * 2.0)).powi(2) / (2.0 * G);
        assert!((head - expected).abs() < 1e-12);
    }
}
