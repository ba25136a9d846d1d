//! Simplified (closed-form) cell-count estimate from quadrature moments.
//!
//! The dimensionless response is resampled at interval midpoints
//! (`Csr_i = ψ_i + (ψ_{i+1} − ψ_i)/2`) and integrated with a fixed step
//! `Δθ = Δt / tau1`:
//!
//! ```text
//! M0 = Σ Δθ Csr_i    M1 = Σ Δθ Csr_i θ_i    M2 = Σ Δθ Csr_i θ_i²
//! M2t = (M2/M0) / (M1/M0)²    Pe = 2/(M2t − 1)    n = 1/(M2t − 1)
//! ```
//!
//! `tau1` is computed as `Σ(t + Cind) / Σ Cind`. This sums time and
//! concentration rather than weighting time by concentration; it is kept
//! as-is because downstream `Pe`/`n` values are compared against results
//! produced with it.

use crate::analysis::moments::Dimensionless;
use crate::domain::{ApparatusConstants, SimplifiedResult, TracerSeries};
use crate::error::{AnalysisError, AnalysisResult};
use crate::math::checked_div;

/// Assumed sampling step of the tracer series (s).
pub const DELTA_T: f64 = 0.25;

const COMPUTATION: &str = "simplified method";

pub fn calc_simple_method(series: &TracerSeries, apparatus: &ApparatusConstants) -> AnalysisResult<SimplifiedResult> {
    if series.len() < 2 {
        return Err(AnalysisError::InvalidSeries(format!(
            "simplified method needs at least 2 samples (got {})",
            series.len()
        )));
    }

    let sum_c: f64 = series.concentrations().sum();
    let sum_t_plus_c: f64 = series.points().iter().map(|p| p.t + p.concentration).sum();
    let tau1 = checked_div(sum_t_plus_c, sum_c, COMPUTATION, "sum of Cind")?;
    let delta_theta = checked_div(DELTA_T, tau1, COMPUTATION, "mean residence time tau1")?;

    let dimless = Dimensionless::new(series, apparatus);
    let psi = dimless.psi.as_slice();
    let theta = dimless.theta.as_slice();

    let csr: Vec<f64> = psi.windows(2).map(|w| w[0] + (w[1] - w[0]) / 2.0).collect();

    let (mut m0, mut m1, mut m2) = (0.0, 0.0, 0.0);
    for (&c, &th) in csr.iter().zip(theta) {
        let w = delta_theta * c;
        m0 += w;
        m1 += w * th;
        m2 += w * th * th;
    }

    let m1m = checked_div(m1, m0, COMPUTATION, "zeroth moment M0")?;
    let m2m = checked_div(m2, m0, COMPUTATION, "zeroth moment M0")?;
    let m2t = checked_div(m2m, m1m * m1m, COMPUTATION, "squared normalized first moment")?;

    let spread = m2t - 1.0;
    let pe = checked_div(2.0, spread, COMPUTATION, "M2t - 1")?;
    let n = checked_div(1.0, spread, COMPUTATION, "M2t - 1")?;

    log::info!("simplified method: tau1={tau1:.6}, M2t={m2t:.6}, Pe={pe:.6}, n={n:.6}");

    Ok(SimplifiedResult {
        mean_residence_time: tau1,
        delta_t: DELTA_T,
        delta_theta,
        mean_concentration: csr,
        m0,
        m1,
        m2,
        pe,
        n,
    })
}
