//! Uniform Flow - Calculos Hidraulicos Fundamentales
//!
//! Implementa los calculos de flujo uniforme:
//! - Ecuacion de Manning para secciones prismaticas e irregulares
//! - Numero de Froude y regimen de flujo
//! - Profundidad normal y critica (forma cerrada, Newton, biseccion)
//! - Elevaciones normal y critica para secciones irregulares
//! - Energia especifica y esfuerzo cortante
//! - Reportes completos de flujo por seccion
//!
//! Los solvers iterativos nunca fallan por no converger: retornan la mejor
//! estimacion con `converged = false` y el residuo alcanzado.

use crate::cross_section::IrregularCrossSection;
use crate::geometry::{self, CrossSectionGeometry};
use crate::prismatic::PrismaticSection;
use crate::{HydraulicError, Result, G, GAMMA_W};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Profundidad minima usada como borde inferior de busqueda (m)
const MIN_DEPTH: f64 = 1e-6;

/// Profundidad maxima absoluta de busqueda (m)
const MAX_SEARCH_DEPTH: f64 = 100.0;

/// Regimen de flujo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowRegime {
    /// Flujo subcritico (Fr < 1) - Controlado aguas abajo
    Subcritical,
    /// Flujo critico (Fr = 1)
    Critical,
    /// Flujo supercritico (Fr > 1) - Controlado aguas arriba
    Supercritical,
}

impl FlowRegime {
    /// Determinar regimen basado en numero de Froude
    pub fn from_froude(froude: f64) -> Self {
        if froude < 0.95 {
            FlowRegime::Subcritical
        } else if froude > 1.05 {
            FlowRegime::Supercritical
        } else {
            FlowRegime::Critical
        }
    }

    /// Etiqueta para reportes
    pub fn label(&self) -> &'static str {
        match self {
            FlowRegime::Subcritical => "Subcritical",
            FlowRegime::Critical => "Critical",
            FlowRegime::Supercritical => "Supercritical",
        }
    }
}

/// Configuracion de los solvers iterativos
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    /// Tolerancia de convergencia
    pub tolerance: f64,
    /// Maximo de iteraciones
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 100,
        }
    }
}

/// Resultado de un solver iterativo
///
/// Siempre lleva la mejor estimacion alcanzada; `converged` indica si el
/// residuo quedo dentro de la tolerancia.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverResult {
    /// Valor resuelto (profundidad o elevacion, m)
    pub value: f64,
    /// El residuo quedo dentro de la tolerancia?
    pub converged: bool,
    /// Iteraciones consumidas
    pub iterations: usize,
    /// Magnitud del residuo final
    pub residual: f64,
}

impl SolverResult {
    fn exact(value: f64) -> Self {
        Self {
            value,
            converged: true,
            iterations: 0,
            residual: 0.0,
        }
    }
}

/// Reporte completo de flujo uniforme en una seccion prismatica
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrismaticFlowResult {
    /// Profundidad de agua (m)
    pub water_depth: f64,
    /// Caudal (m^3/s)
    pub discharge: f64,
    /// Velocidad media (m/s)
    pub velocity: f64,
    /// Numero de Froude
    pub froude: f64,
    /// Regimen de flujo
    pub flow_regime: FlowRegime,
    /// Area mojada (m^2)
    pub area: f64,
    /// Perimetro mojado (m)
    pub wetted_perimeter: f64,
    /// Radio hidraulico (m)
    pub hydraulic_radius: f64,
    /// Ancho superficial (m)
    pub top_width: f64,
    /// Profundidad hidraulica (m)
    pub hydraulic_depth: f64,
    /// Energia especifica E = y + V^2/2g (m)
    pub specific_energy: f64,
    /// Esfuerzo cortante en el fondo (Pa)
    pub shear_stress: f64,
    /// Profundidad critica para este caudal (m)
    pub critical_depth: f64,
    /// Pendiente critica (m/m)
    pub critical_slope: f64,
    /// Pendiente del canal (m/m)
    pub slope: f64,
    /// Rugosidad de Manning
    pub manning_n: f64,
    /// Advertencias
    pub warnings: Vec<String>,
}

/// Reporte completo de flujo en una seccion irregular
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrregularFlowResult {
    /// Elevacion de superficie de agua (m)
    pub wsel: f64,
    /// Profundidad maxima = WSEL - thalweg (m)
    pub water_depth: f64,
    /// Caudal (m^3/s)
    pub discharge: f64,
    /// Velocidad media (m/s)
    pub velocity: f64,
    /// Carga de velocidad α V^2/2g (m)
    pub velocity_head: f64,
    /// Numero de Froude compuesto
    pub froude: f64,
    /// Regimen de flujo
    pub flow_regime: FlowRegime,
    /// Energia especifica (m)
    pub specific_energy: f64,
    /// Pendiente de friccion Sf = (Q/K)^2 (m/m)
    pub friction_slope: f64,
    /// Esfuerzo cortante (Pa), si se dio pendiente
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shear_stress: Option<f64>,
    /// Elevacion critica (m)
    pub critical_wsel: f64,
    /// Elevacion normal (m), si se dio pendiente positiva
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_wsel: Option<f64>,
    /// Geometria completa de la seccion
    pub geometry: CrossSectionGeometry,
    /// Advertencias
    pub warnings: Vec<String>,
}

/// Motor de calculos de flujo uniforme
pub struct HydraulicsEngine;

impl HydraulicsEngine {
    /// Caudal de Manning para seccion prismatica
    ///
    /// Q = (1/n) * A * R^(2/3) * S^(1/2); cero si A, R o S no son positivos.
    pub fn manning_flow_prismatic(
        section: &PrismaticSection,
        water_depth: f64,
        slope: f64,
        manning_n: f64,
    ) -> f64 {
        let props = section.hydraulic_properties(water_depth);
        if props.area <= 0.0 || props.hydraulic_radius <= 0.0 || slope <= 0.0 {
            return 0.0;
        }
        (1.0 / manning_n) * props.area * props.hydraulic_radius.powf(2.0 / 3.0) * slope.sqrt()
    }

    /// Caudal de Manning para seccion irregular: Q = K_total * S^(1/2)
    pub fn manning_flow_irregular(
        section: &IrregularCrossSection,
        wsel: f64,
        slope: f64,
    ) -> f64 {
        if slope <= 0.0 {
            return 0.0;
        }
        geometry::at(section, wsel).conveyance * slope.sqrt()
    }

    /// Numero de Froude: Fr = V / sqrt(g * D)
    pub fn froude_number(velocity: f64, hydraulic_depth: f64) -> f64 {
        if hydraulic_depth <= 0.0 {
            return 0.0;
        }
        velocity / (G * hydraulic_depth).sqrt()
    }

    /// Numero de Froude compuesto para secciones irregulares:
    /// Fr = sqrt(α) * V / sqrt(g * D)
    pub fn composite_froude(alpha: f64, velocity: f64, hydraulic_depth: f64) -> f64 {
        alpha.max(1.0).sqrt() * Self::froude_number(velocity, hydraulic_depth)
    }

    /// Energia especifica: E = y + V^2/(2g)
    pub fn specific_energy(water_depth: f64, velocity: f64) -> f64 {
        water_depth + velocity.powi(2) / (2.0 * G)
    }

    /// Esfuerzo cortante en el fondo: τ = γ_w * R * S
    pub fn shear_stress(hydraulic_radius: f64, slope: f64) -> f64 {
        if hydraulic_radius <= 0.0 || slope <= 0.0 {
            return 0.0;
        }
        GAMMA_W * hydraulic_radius * slope
    }

    /// Profundidad critica para un caudal dado
    ///
    /// Para seccion rectangular usa la forma cerrada
    /// y_c = ((Q/b)^2 / g)^(1/3); para el resto, biseccion sobre
    /// Q^2 T / (g A^3) = 1.
    pub fn critical_depth(
        section: &PrismaticSection,
        discharge: f64,
        config: &SolverConfig,
    ) -> SolverResult {
        if discharge <= 0.0 {
            return SolverResult::exact(0.0);
        }

        if let PrismaticSection::Rectangular { bottom_width } = section {
            let unit_discharge = discharge / bottom_width;
            let yc = (unit_discharge.powi(2) / G).powf(1.0 / 3.0);
            return SolverResult::exact(yc);
        }

        Self::critical_depth_bisection(section, discharge, config)
    }

    /// Profundidad critica por biseccion (cualquier seccion prismatica)
    ///
    /// Busca la raiz de Q^2 T / (g A^3) - 1 en (ε, y_max]; y_max se duplica
    /// hasta que la seccion tenga capacidad sobrada o se alcancen 100 m.
    pub fn critical_depth_bisection(
        section: &PrismaticSection,
        discharge: f64,
        config: &SolverConfig,
    ) -> SolverResult {
        if discharge <= 0.0 {
            return SolverResult::exact(0.0);
        }

        let mut y_max = 1.0;
        while section.area(y_max) * 0.1 <= discharge && y_max < MAX_SEARCH_DEPTH {
            y_max *= 2.0;
        }
        y_max = y_max.min(MAX_SEARCH_DEPTH);

        let residual_at = |y: f64| -> f64 {
            let area = section.area(y);
            let top = section.top_width(y);
            if area <= 0.0 {
                return f64::INFINITY;
            }
            discharge.powi(2) * top / (G * area.powi(3)) - 1.0
        };

        let mut y_low = MIN_DEPTH;
        let mut y_high = y_max;
        let mut best = y_high;
        let mut best_residual = f64::INFINITY;

        for iteration in 0..config.max_iterations {
            let y_mid = 0.5 * (y_low + y_high);
            let residual = residual_at(y_mid);

            if residual.is_finite() && residual.abs() < best_residual {
                best = y_mid;
                best_residual = residual.abs();
            }

            if residual.abs() < config.tolerance {
                return SolverResult {
                    value: y_mid,
                    converged: true,
                    iterations: iteration + 1,
                    residual: residual.abs(),
                };
            }

            // El residuo decrece con la profundidad
            if residual > 0.0 {
                y_low = y_mid;
            } else {
                y_high = y_mid;
            }
        }

        debug!(
            residual = best_residual,
            "critical depth bisection did not converge"
        );
        SolverResult {
            value: best,
            converged: false,
            iterations: config.max_iterations,
            residual: best_residual,
        }
    }

    /// Profundidad normal por Newton-Raphson con respaldo de biseccion
    ///
    /// Newton parte de la profundidad critica y usa una derivada
    /// aproximada con dA/dy = T y dP/dy ≈ 2 (exacta solo para seccion
    /// rectangular). Si la derivada se anula o la iteracion no converge,
    /// cae a biseccion acotada sobre el caudal de Manning.
    pub fn normal_depth(
        section: &PrismaticSection,
        discharge: f64,
        slope: f64,
        manning_n: f64,
        config: &SolverConfig,
    ) -> Result<SolverResult> {
        if discharge <= 0.0 {
            return Ok(SolverResult::exact(0.0));
        }
        if slope <= 0.0 {
            return Err(HydraulicError::Calculation(
                "Slope must be positive for normal depth calculation".into(),
            ));
        }

        let seed = Self::critical_depth(section, discharge, config).value.max(MIN_DEPTH);

        let discharge_at = |y: f64| Self::manning_flow_prismatic(section, y, slope, manning_n);

        // Derivada aproximada de Q respecto a y:
        // dQ/dy = (√S/n) [ (5/3) A^(2/3) P^(-2/3) T - (2/3) A^(5/3) P^(-5/3) dP/dy ]
        // con dP/dy ≈ 2 (solo exacta para rectangular)
        let derivative_at = |y: f64| -> f64 {
            let area = section.area(y);
            let perimeter = section.wetted_perimeter(y);
            let top = section.top_width(y);
            if area <= 0.0 || perimeter <= 0.0 {
                return 0.0;
            }
            let dp_dy = 2.0;
            (slope.sqrt() / manning_n)
                * ((5.0 / 3.0) * area.powf(2.0 / 3.0) * perimeter.powf(-2.0 / 3.0) * top
                    - (2.0 / 3.0) * area.powf(5.0 / 3.0) * perimeter.powf(-5.0 / 3.0) * dp_dy)
        };

        let mut y = seed;
        for iteration in 0..config.max_iterations {
            let q = discharge_at(y);
            let relative_error = (q - discharge).abs() / discharge;
            if relative_error < config.tolerance {
                return Ok(SolverResult {
                    value: y,
                    converged: true,
                    iterations: iteration,
                    residual: relative_error,
                });
            }

            let derivative = derivative_at(y);
            if derivative.abs() < 1e-4 {
                break;
            }

            let next = y - (q - discharge) / derivative;
            if !next.is_finite() || next <= 0.0 || next > MAX_SEARCH_DEPTH * 2.0 {
                break;
            }
            y = next;
        }

        debug!("normal depth Newton fell back to bisection");
        Ok(Self::normal_depth_bisection(
            section, discharge, slope, manning_n, config,
        ))
    }

    /// Respaldo de biseccion para la profundidad normal
    fn normal_depth_bisection(
        section: &PrismaticSection,
        discharge: f64,
        slope: f64,
        manning_n: f64,
        config: &SolverConfig,
    ) -> SolverResult {
        let discharge_at = |y: f64| Self::manning_flow_prismatic(section, y, slope, manning_n);

        let mut y_max = 1.0;
        while discharge_at(y_max) <= discharge && y_max < MAX_SEARCH_DEPTH {
            y_max *= 2.0;
        }
        y_max = y_max.min(MAX_SEARCH_DEPTH);

        let mut y_low = MIN_DEPTH;
        let mut y_high = y_max;
        let mut best = y_high;
        let mut best_residual = f64::INFINITY;

        for iteration in 0..config.max_iterations {
            let y_mid = 0.5 * (y_low + y_high);
            let q_mid = discharge_at(y_mid);
            let relative_error = (q_mid - discharge).abs() / discharge;

            if relative_error < best_residual {
                best = y_mid;
                best_residual = relative_error;
            }

            if relative_error < config.tolerance {
                return SolverResult {
                    value: y_mid,
                    converged: true,
                    iterations: iteration + 1,
                    residual: relative_error,
                };
            }

            if q_mid < discharge {
                y_low = y_mid;
            } else {
                y_high = y_mid;
            }
        }

        debug!(
            residual = best_residual,
            "normal depth bisection did not converge"
        );
        SolverResult {
            value: best,
            converged: false,
            iterations: config.max_iterations,
            residual: best_residual,
        }
    }

    /// Pendiente critica: S_c = (Q n / (A_c R_c^(2/3)))^2
    pub fn critical_slope(
        section: &PrismaticSection,
        discharge: f64,
        manning_n: f64,
        config: &SolverConfig,
    ) -> f64 {
        if discharge <= 0.0 {
            return 0.0;
        }
        let yc = Self::critical_depth(section, discharge, config).value;
        let props = section.hydraulic_properties(yc);
        if props.area <= 0.0 || props.hydraulic_radius <= 0.0 {
            return 0.0;
        }
        (discharge * manning_n / (props.area * props.hydraulic_radius.powf(2.0 / 3.0))).powi(2)
    }

    /// Elevacion critica de una seccion irregular
    ///
    /// Biseccion sobre WSEL en [z_min + ε, z_max] buscando Fr = 1 con el
    /// Froude de seccion promedio (D = A/T).
    pub fn critical_wsel(
        section: &IrregularCrossSection,
        discharge: f64,
        config: &SolverConfig,
    ) -> SolverResult {
        let z_min = section.min_elevation();
        if discharge <= 0.0 {
            return SolverResult::exact(z_min);
        }
        let z_max = section.max_elevation();

        let froude_at = |wsel: f64| -> f64 {
            let g = geometry::at(section, wsel);
            if g.area <= 0.0 {
                return f64::INFINITY;
            }
            let velocity = discharge / g.area;
            Self::froude_number(velocity, g.hydraulic_depth)
        };

        let mut low = z_min + MIN_DEPTH;
        let mut high = z_max;
        let mut best = high;
        let mut best_residual = f64::INFINITY;

        for iteration in 0..config.max_iterations {
            let mid = 0.5 * (low + high);
            let froude = froude_at(mid);
            let residual = if froude.is_finite() {
                (froude - 1.0).abs()
            } else {
                f64::INFINITY
            };

            if residual < best_residual {
                best = mid;
                best_residual = residual;
            }

            if residual < config.tolerance {
                return SolverResult {
                    value: mid,
                    converged: true,
                    iterations: iteration + 1,
                    residual,
                };
            }

            // Froude decrece al subir el nivel
            if froude > 1.0 {
                low = mid;
            } else {
                high = mid;
            }
        }

        debug!(
            residual = best_residual,
            "critical WSEL bisection did not converge"
        );
        SolverResult {
            value: best,
            converged: false,
            iterations: config.max_iterations,
            residual: best_residual,
        }
    }

    /// Elevacion normal de una seccion irregular
    ///
    /// Biseccion sobre WSEL buscando K_total * sqrt(S) = Q.
    pub fn normal_wsel(
        section: &IrregularCrossSection,
        discharge: f64,
        slope: f64,
        config: &SolverConfig,
    ) -> Result<SolverResult> {
        let z_min = section.min_elevation();
        if discharge <= 0.0 {
            return Ok(SolverResult::exact(z_min));
        }
        if slope <= 0.0 {
            return Err(HydraulicError::Calculation(
                "Slope must be positive for normal WSEL calculation".into(),
            ));
        }

        let z_max = section.max_elevation();
        let discharge_at = |wsel: f64| geometry::at(section, wsel).conveyance * slope.sqrt();

        let mut low = z_min + MIN_DEPTH;
        let mut high = z_max;
        let mut best = high;
        let mut best_residual = f64::INFINITY;

        for iteration in 0..config.max_iterations {
            let mid = 0.5 * (low + high);
            let q_mid = discharge_at(mid);
            let relative_error = (q_mid - discharge).abs() / discharge;

            if relative_error < best_residual {
                best = mid;
                best_residual = relative_error;
            }

            if relative_error < config.tolerance {
                return Ok(SolverResult {
                    value: mid,
                    converged: true,
                    iterations: iteration + 1,
                    residual: relative_error,
                });
            }

            if q_mid < discharge {
                low = mid;
            } else {
                high = mid;
            }
        }

        debug!(
            residual = best_residual,
            "normal WSEL bisection did not converge"
        );
        Ok(SolverResult {
            value: best,
            converged: false,
            iterations: config.max_iterations,
            residual: best_residual,
        })
    }

    /// Comparar un flujo calculado contra los limites de un material de
    /// revestimiento
    pub fn check_lining(
        material: crate::roughness::ChannelMaterial,
        velocity: f64,
        shear: f64,
    ) -> crate::roughness::LiningCheck {
        crate::roughness::LiningCheck::evaluate(material, velocity, shear)
    }

    /// Reporte completo de flujo uniforme en una seccion prismatica
    pub fn analyze_prismatic(
        section: &PrismaticSection,
        water_depth: f64,
        slope: f64,
        manning_n: f64,
    ) -> Result<PrismaticFlowResult> {
        section.validate()?;

        let config = SolverConfig::default();
        let props = section.hydraulic_properties(water_depth);
        let discharge = Self::manning_flow_prismatic(section, water_depth, slope, manning_n);
        let velocity = if props.area > 0.0 {
            discharge / props.area
        } else {
            0.0
        };
        let froude = Self::froude_number(velocity, props.hydraulic_depth);
        let critical = Self::critical_depth(section, discharge, &config);

        let mut warnings = Vec::new();
        if discharge <= 0.0 {
            warnings.push("Zero discharge - section dry or slope not positive".to_string());
        }
        if velocity > 0.0 && velocity < 0.3 {
            warnings.push("Low velocity".to_string());
        }
        if velocity > 6.0 {
            warnings.push("Erosion risk".to_string());
        }
        if froude > 0.86 && froude < 1.13 {
            warnings.push("Near critical flow".to_string());
        }

        Ok(PrismaticFlowResult {
            water_depth,
            discharge,
            velocity,
            froude,
            flow_regime: FlowRegime::from_froude(froude),
            area: props.area,
            wetted_perimeter: props.wetted_perimeter,
            hydraulic_radius: props.hydraulic_radius,
            top_width: props.top_width,
            hydraulic_depth: props.hydraulic_depth,
            specific_energy: Self::specific_energy(water_depth, velocity),
            shear_stress: Self::shear_stress(props.hydraulic_radius, slope),
            critical_depth: critical.value,
            critical_slope: Self::critical_slope(section, discharge, manning_n, &config),
            slope,
            manning_n,
            warnings,
        })
    }

    /// Reporte completo de flujo en una seccion irregular
    ///
    /// La pendiente es opcional: sin ella no se calculan la elevacion
    /// normal ni el esfuerzo cortante de fondo.
    pub fn analyze_irregular(
        section: &IrregularCrossSection,
        wsel: f64,
        discharge: f64,
        slope: Option<f64>,
    ) -> Result<IrregularFlowResult> {
        section.ensure_valid()?;

        let config = SolverConfig::default();
        let geometry = geometry::at(section, wsel);

        let mut warnings = Vec::new();
        if geometry.area <= 0.0 {
            warnings.push("Zero flow area at this stage".to_string());
        }

        let velocity = if geometry.area > 0.0 {
            discharge / geometry.area
        } else {
            0.0
        };
        let froude = Self::composite_froude(geometry.alpha, velocity, geometry.hydraulic_depth);
        let velocity_head = geometry.alpha * velocity.powi(2) / (2.0 * G);
        let friction_slope = if geometry.conveyance > 0.0 {
            (discharge / geometry.conveyance).powi(2)
        } else {
            0.0
        };

        if velocity > 0.0 && velocity < 0.3 {
            warnings.push("Low velocity".to_string());
        }
        if velocity > 4.0 {
            warnings.push("Erosion risk".to_string());
        }
        if froude > 0.86 && froude < 1.13 {
            warnings.push("Near critical flow".to_string());
        }
        if geometry.overbank_conveyance_fraction() > 0.2 {
            warnings.push("Significant overbank flow".to_string());
        }

        let critical = Self::critical_wsel(section, discharge, &config);
        let normal_wsel = match slope {
            Some(s) if s > 0.0 => Some(Self::normal_wsel(section, discharge, s, &config)?.value),
            _ => None,
        };
        let shear_stress = slope
            .filter(|s| *s > 0.0)
            .map(|s| Self::shear_stress(geometry.hydraulic_radius, s));

        Ok(IrregularFlowResult {
            wsel,
            water_depth: geometry.max_depth,
            discharge,
            velocity,
            velocity_head,
            froude,
            flow_regime: FlowRegime::from_froude(froude),
            specific_energy: geometry.max_depth + velocity_head,
            friction_slope,
            shear_stress,
            critical_wsel: critical.value,
            normal_wsel,
            geometry,
            warnings,
        })
    }
}
