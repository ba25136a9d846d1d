//! Reporting utilities: per-point fit values and formatted terminal output.

pub mod format;

pub use format::*;

use crate::analysis::Dimensionless;
use crate::domain::{ApparatusConstants, CellFit, PointFit, TracerSeries};
use crate::error::AppError;
use crate::models::fit_response;

/// Compute the dimensionless coordinates, fitted response and residual of each sample.
pub fn compute_point_fits(
    series: &TracerSeries,
    apparatus: &ApparatusConstants,
    fit: &CellFit,
) -> Result<Vec<PointFit>, AppError> {
    let dimless = Dimensionless::new(series, apparatus);
    let n = f64::from(fit.n);
    let mut out = Vec::with_capacity(series.len());
    for (i, p) in series.points().iter().enumerate() {
        let c_fit = fit_response(p.t, apparatus.tau, n, fit.inlet_concentration)
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::new(4, "Non-finite model prediction during residual computation."))?;
        out.push(PointFit {
            point: *p,
            theta: dimless.theta[i],
            psi: dimless.psi[i],
            c_fit,
            residual: p.concentration - c_fit,
        });
    }
    Ok(out)
}
