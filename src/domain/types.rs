//! Shared domain types.
//!
//! These types are intentionally plain records so they can be:
//!
//! - passed between the analysis stages without behavior attached
//! - exported to JSON/CSV
//! - formatted field by field by the report layer

use std::f64::consts::PI;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::fit::CellFitOptions;
use crate::math::{RootOptions, round_to};

/// One tracer observation: time `t` (s) and outlet concentration `Cind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracerPoint {
    pub t: f64,
    #[serde(rename = "Cind")]
    pub concentration: f64,
}

/// An immutable, validated tracer-response series.
///
/// Time is expected to be non-decreasing (the quadrature in the simplified
/// method assumes it), but this is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TracerSeries {
    points: Vec<TracerPoint>,
}

impl TracerSeries {
    pub fn new(points: Vec<TracerPoint>) -> AnalysisResult<Self> {
        if points.is_empty() {
            return Err(AnalysisError::InvalidSeries("series is empty".to_string()));
        }
        for (i, p) in points.iter().enumerate() {
            if !(p.t.is_finite() && p.concentration.is_finite()) {
                return Err(AnalysisError::InvalidSeries(format!(
                    "non-finite value at index {i} (t={}, Cind={})",
                    p.t, p.concentration
                )));
            }
            if p.t < 0.0 || p.concentration < 0.0 {
                return Err(AnalysisError::InvalidSeries(format!(
                    "negative value at index {i} (t={}, Cind={})",
                    p.t, p.concentration
                )));
            }
        }
        if points.windows(2).any(|w| w[1].t < w[0].t) {
            log::warn!("tracer series time is not non-decreasing; quadrature assumes ordered samples");
        }
        Ok(Self { points })
    }

    /// Build a series from parallel `t` / `Cind` columns.
    pub fn from_columns(t: &[f64], concentration: &[f64]) -> AnalysisResult<Self> {
        if t.len() != concentration.len() {
            return Err(AnalysisError::InvalidSeries(format!(
                "column length mismatch: t={}, Cind={}",
                t.len(),
                concentration.len()
            )));
        }
        Self::new(
            t.iter()
                .zip(concentration)
                .map(|(&t, &c)| TracerPoint { t, concentration: c })
                .collect(),
        )
    }

    pub fn points(&self) -> &[TracerPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.t)
    }

    pub fn concentrations(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.concentration)
    }

    pub fn t_max(&self) -> f64 {
        self.times().fold(0.0, f64::max)
    }
}

/// Raw apparatus configuration.
///
/// Defaults describe the packed column the tool was built for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApparatusParams {
    /// Column length `L` (m).
    #[serde(rename = "L")]
    pub length: f64,
    /// Column diameter `d` (m).
    #[serde(rename = "d")]
    pub diameter: f64,
    /// Volumetric flow rate `w` (m³/s).
    #[serde(rename = "w")]
    pub flow_rate: f64,
    /// Injected tracer mass `Q` (kg).
    #[serde(rename = "Q")]
    pub tracer_mass: f64,
    /// Packing coefficient `gamma` (fraction of the column occupied by packing).
    #[serde(rename = "gamma")]
    pub void_fraction: f64,
}

impl Default for ApparatusParams {
    fn default() -> Self {
        Self {
            length: 20.0,
            diameter: 0.03,
            flow_rate: 0.001,
            tracer_mass: 0.3,
            void_fraction: 0.7,
        }
    }
}

/// Apparatus constants consumed read-only by every analysis stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApparatusConstants {
    pub length: f64,
    pub diameter: f64,
    pub flow_rate: f64,
    pub tracer_mass: f64,
    pub void_fraction: f64,
    /// Free volume `V = π (d/2)² L (1 − gamma)` (m³).
    pub volume: f64,
    /// Mean residence time `tau = V / w` (s).
    pub tau: f64,
    /// Linear velocity term `v = w / V`.
    pub velocity: f64,
}

impl ApparatusConstants {
    /// Derive `V`, `tau` and `v` from the raw parameters.
    pub fn derive(params: &ApparatusParams) -> AnalysisResult<Self> {
        let ApparatusParams {
            length,
            diameter,
            flow_rate,
            tracer_mass,
            void_fraction,
        } = *params;

        let positive = [
            ("L", length),
            ("d", diameter),
            ("w", flow_rate),
            ("Q", tracer_mass),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::degenerate(
                    "apparatus",
                    format!("`{name}` must be finite and > 0 (got {value})"),
                ));
            }
        }
        if !(void_fraction.is_finite() && (0.0..1.0).contains(&void_fraction)) {
            return Err(AnalysisError::degenerate(
                "apparatus",
                format!("`gamma` must lie in [0, 1) (got {void_fraction})"),
            ));
        }

        let radius = diameter / 2.0;
        let volume = PI * radius * radius * length * (1.0 - void_fraction);
        Ok(Self {
            length,
            diameter,
            flow_rate,
            tracer_mass,
            void_fraction,
            volume,
            tau: volume / flow_rate,
            velocity: flow_rate / volume,
        })
    }

    /// Scale factor turning `Cind` into the dimensionless response `ψ`.
    pub fn psi_scale(&self) -> f64 {
        self.volume / self.tracer_mass
    }
}

/// Raw moments `α1..α4` of the dimensionless response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub alpha1: f64,
    pub alpha2: f64,
    pub alpha3: f64,
    pub alpha4: f64,
}

impl Moments {
    /// Display precision: 3 decimals.
    pub fn rounded(&self) -> Self {
        Self {
            alpha1: round_to(self.alpha1, 3),
            alpha2: round_to(self.alpha2, 3),
            alpha3: round_to(self.alpha3, 3),
            alpha4: round_to(self.alpha4, 3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// θ at the maximum of ψ.
    pub mode: f64,
    /// max ψ.
    pub modal_density: f64,
    pub variance: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl Statistics {
    pub fn rounded(&self) -> Self {
        Self {
            mode: round_to(self.mode, 6),
            modal_density: round_to(self.modal_density, 6),
            variance: round_to(self.variance, 6),
            skewness: round_to(self.skewness, 6),
            kurtosis: round_to(self.kurtosis, 6),
        }
    }
}

/// Number of Péclet estimators.
pub const PECLET_ESTIMATORS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PecletResult {
    /// Estimates 1..9 in order; `None` marks an unavailable estimator.
    pub estimates: [Option<f64>; PECLET_ESTIMATORS],
    /// Denominator of the nine-estimator average.
    pub n_all: usize,
    /// Denominator of the four-estimator average.
    pub n4: usize,
    pub pesr_all: f64,
    pub pesr4: f64,
    /// Longitudinal mixing coefficient from `pesr_all`.
    pub dsr_all: f64,
    /// Longitudinal mixing coefficient from `pesr4`.
    pub dsr4: f64,
    pub n1: f64,
    pub n2: f64,
}

impl PecletResult {
    pub fn available(&self) -> usize {
        self.estimates.iter().filter(|e| e.is_some()).count()
    }

    pub fn rounded(&self) -> Self {
        Self {
            estimates: self.estimates.map(|e| e.map(|v| round_to(v, 6))),
            pesr_all: round_to(self.pesr_all, 6),
            pesr4: round_to(self.pesr4, 6),
            dsr_all: round_to(self.dsr_all, 6),
            dsr4: round_to(self.dsr4, 6),
            n1: round_to(self.n1, 6),
            n2: round_to(self.n2, 6),
            ..*self
        }
    }
}

/// Result of the tanks-in-series least-squares fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellFit {
    /// Number of ideal mixing cells (`ceil` of the optimizer's `n`).
    pub n: u32,
    /// Fitted inlet concentration `C0`.
    pub inlet_concentration: f64,
    /// Continuous `n` reported by the optimizer.
    pub n_raw: f64,
    /// Sum of squared residuals at the returned point.
    pub sse: f64,
    /// Whether the simplex reported convergence (informational only).
    pub converged: bool,
    pub iterations: u64,
    pub cost_evaluations: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedResult {
    /// `tau1` from the simplified method (s).
    pub mean_residence_time: f64,
    pub delta_t: f64,
    pub delta_theta: f64,
    /// Midpoint response `Csr` (one entry per interval).
    pub mean_concentration: Vec<f64>,
    pub m0: f64,
    pub m1: f64,
    pub m2: f64,
    pub pe: f64,
    pub n: f64,
}

impl SimplifiedResult {
    pub fn rounded(&self) -> Self {
        Self {
            mean_residence_time: round_to(self.mean_residence_time, 6),
            delta_t: round_to(self.delta_t, 6),
            delta_theta: round_to(self.delta_theta, 6),
            mean_concentration: self.mean_concentration.iter().map(|&v| round_to(v, 6)).collect(),
            m0: round_to(self.m0, 6),
            m1: round_to(self.m1, 6),
            m2: round_to(self.m2, 6),
            pe: round_to(self.pe, 6),
            n: round_to(self.n, 6),
        }
    }
}

/// Per-point observed vs fitted concentration (used for exports).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointFit {
    pub point: TracerPoint,
    pub theta: f64,
    pub psi: f64,
    pub c_fit: f64,
    pub residual: f64,
}

/// Numeric knobs shared by every analysis stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    /// Round moments (3 dp) and statistics (6 dp) before they feed the
    /// downstream stages, reproducing the legacy tool's numbers.
    pub legacy_rounding: bool,
    pub roots: RootOptions,
    pub cell_fit: CellFitOptions,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            legacy_rounding: false,
            roots: RootOptions::default(),
            cell_fit: CellFitOptions::default(),
        }
    }
}

/// Full outcome of one analysis run, at boundary precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    pub apparatus: ApparatusConstants,
    pub n_points: usize,
    pub moments: Moments,
    pub statistics: Statistics,
    pub peclet: PecletResult,
    pub cell_fit: CellFit,
    pub simplified: SimplifiedResult,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and the apparatus file).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub delimiter: u8,
    pub apparatus: ApparatusParams,
    pub options: AnalysisOptions,

    pub export_json: Option<PathBuf>,
    pub export_points: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
    /// Grid size of the exported model curve.
    pub curve_points: usize,
}

/// A saved model curve (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub apparatus: ApparatusConstants,
    pub cells: u32,
    pub inlet_concentration: f64,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub t: Vec<f64>,
    /// Fitted outlet response `f(t; n, C0)`.
    pub outlet: Vec<f64>,
    /// Closed-form profile of every cell `j = 1..n`, indexed `[j-1][i]`.
    pub cells: Vec<Vec<f64>>,
}
