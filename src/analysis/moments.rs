//! Dimensionless transform and raw moments of the tracer response.
//!
//! `θ_i = t_i / tau`, `ψ_i = Cind_i · V / Q`, and
//! `alpha_k = Σ θ_i^k ψ_i / Σ ψ_i` for `k = 1..4`.

use nalgebra::DVector;

use crate::domain::{ApparatusConstants, Moments, TracerSeries};
use crate::error::AnalysisResult;
use crate::math::checked_div;

/// Dimensionless time and response, index-aligned with the source series.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimensionless {
    pub theta: DVector<f64>,
    pub psi: DVector<f64>,
}

impl Dimensionless {
    pub fn new(series: &TracerSeries, apparatus: &ApparatusConstants) -> Self {
        let scale = apparatus.psi_scale();
        let theta = DVector::from_iterator(series.len(), series.times().map(|t| t / apparatus.tau));
        let psi = DVector::from_iterator(series.len(), series.concentrations().map(|c| c * scale));
        Self { theta, psi }
    }

    /// Index of the first maximum of `ψ`.
    pub fn peak_index(&self) -> usize {
        self.psi.imax()
    }
}

pub fn calculate_moments(series: &TracerSeries, apparatus: &ApparatusConstants) -> AnalysisResult<Moments> {
    moments_of(&Dimensionless::new(series, apparatus))
}

pub fn moments_of(dimless: &Dimensionless) -> AnalysisResult<Moments> {
    let sum_psi = dimless.psi.sum();
    let weighted = |k: i32| -> AnalysisResult<f64> {
        let num = dimless.theta.map(|th| th.powi(k)).dot(&dimless.psi);
        checked_div(num, sum_psi, "moments", "sum of psi")
    };

    Ok(Moments {
        alpha1: weighted(1)?,
        alpha2: weighted(2)?,
        alpha3: weighted(3)?,
        alpha4: weighted(4)?,
    })
}
