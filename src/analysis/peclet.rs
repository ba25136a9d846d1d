//! Nine independent Péclet-number estimators and their weighted averages.
//!
//! Each estimator expresses one moment or statistic as a function of the
//! Péclet number `x` and inverts it:
//!
//! | # | relation | method |
//! |---|----------|--------|
//! | 1 | `Pe = 1/(α1 − 1)` if `α1 > 1.001` | closed form |
//! | 2 | `α2 = 1 + 4/x + 4/x²` | root |
//! | 3 | `α3 = 1 + 9/x + 30/x² + 30/x³` | root |
//! | 4 | `α4 = 1 + 16/x + 108/x² + 336/x³ + 336/x⁴` | root |
//! | 5 | `Pe = 2·mode/(1 − mode)` if `mode < 1` | closed form |
//! | 6 | `modal density = f(x)` (see [`modal_density`]) | root |
//! | 7 | `variance = 2/x + 3/x²` | root |
//! | 8 | `skewness = (20 + 12x)/(3 + 2x)^1.5` | root |
//! | 9 | `kurtosis = (210 + 120x)/(3 + 2x)²` | root |
//!
//! A failed root is recorded as unavailable (`None`) and the run continues.
//!
//! Averaging keeps the legacy weighting: only estimators 1 and 5 reduce the
//! denominator when unavailable, while every unavailable slot contributes
//! zero to the sum.

use crate::domain::{ApparatusConstants, Moments, PECLET_ESTIMATORS, PecletResult, Statistics};
use crate::error::AnalysisResult;
use crate::math::{RootOptions, checked_div, modal_density, newton_root};

/// Threshold on `α1` below which estimator 1 is unavailable.
const ALPHA1_MIN: f64 = 1.001;

/// Zero-based slots of the closed-form estimators with availability guards.
const GUARDED: [usize; 2] = [0, 4];

/// Zero-based slots averaged into `pesr4` (estimators 1, 2, 5, 7).
const FOUR_SET: [usize; 4] = [0, 1, 4, 6];

/// Evaluate all nine estimators, aggregate them and derive dispersion coefficients.
pub fn calc_peclet_numbers(
    moments: &Moments,
    stats: &Statistics,
    apparatus: &ApparatusConstants,
    roots: &RootOptions,
) -> AnalysisResult<PecletResult> {
    let estimates = estimate_all(moments, stats, roots);

    let unavailable_guarded = GUARDED.iter().filter(|&&i| estimates[i].is_none()).count();
    let n_all = PECLET_ESTIMATORS - unavailable_guarded;
    let n4 = FOUR_SET.len() - unavailable_guarded;

    let sum_all: f64 = estimates.iter().flatten().sum();
    let sum4: f64 = FOUR_SET.iter().filter_map(|&i| estimates[i]).sum();

    let pesr_all = sum_all / n_all as f64;
    let pesr4 = sum4 / n4 as f64;

    let vl = apparatus.velocity * apparatus.length;
    let dsr_all = checked_div(vl, pesr_all, "peclet", "nine-estimator average Pe")?;
    let dsr4 = checked_div(vl, pesr4, "peclet", "four-estimator average Pe")?;

    log::info!(
        "peclet: {} of {} estimators available, Pe(9)={pesr_all:.6}, Pe(4)={pesr4:.6}",
        estimates.iter().flatten().count(),
        PECLET_ESTIMATORS
    );

    Ok(PecletResult {
        estimates,
        n_all,
        n4,
        pesr_all,
        pesr4,
        dsr_all,
        dsr4,
        n1: pesr_all / 2.0,
        n2: pesr4 / 2.0,
    })
}

/// Evaluate the nine estimators in order.
pub fn estimate_all(moments: &Moments, stats: &Statistics, roots: &RootOptions) -> [Option<f64>; PECLET_ESTIMATORS] {
    let Moments {
        alpha1: a1,
        alpha2: a2,
        alpha3: a3,
        alpha4: a4,
    } = *moments;
    let Statistics {
        mode,
        modal_density: cm,
        variance,
        skewness,
        kurtosis,
    } = *stats;

    [
        pe_from_mean(a1),
        solve(2, roots, |x| a2 - 1.0 - 4.0 / x - 4.0 / x.powi(2)),
        solve(3, roots, |x| a3 - 1.0 - 9.0 / x - 30.0 / x.powi(2) - 30.0 / x.powi(3)),
        solve(4, roots, |x| {
            a4 - 1.0 - 16.0 / x - 108.0 / x.powi(2) - 336.0 / x.powi(3) - 336.0 / x.powi(4)
        }),
        pe_from_mode(mode),
        solve(6, roots, |x| cm - modal_density(x)),
        solve(7, roots, |x| variance - 2.0 / x - 3.0 / x.powi(2)),
        solve(8, roots, |x| skewness - (20.0 + 12.0 * x) / (3.0 + 2.0 * x).powf(1.5)),
        solve(9, roots, |x| kurtosis - (210.0 + 120.0 * x) / (3.0 + 2.0 * x).powi(2)),
    ]
}

/// Estimator 1.
pub fn pe_from_mean(alpha1: f64) -> Option<f64> {
    (alpha1 > ALPHA1_MIN).then(|| 1.0 / (alpha1 - 1.0))
}

/// Estimator 5.
pub fn pe_from_mode(mode: f64) -> Option<f64> {
    (mode < 1.0).then(|| 2.0 * mode / (1.0 - mode))
}

fn solve<F>(index: usize, roots: &RootOptions, equation: F) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    match newton_root(equation, roots) {
        Ok(x) if x.is_finite() => Some(x.abs()),
        Ok(x) => {
            log::debug!("peclet estimator {index}: non-finite root {x}");
            None
        }
        Err(e) => {
            log::debug!("peclet estimator {index} unavailable: {e}");
            None
        }
    }
}
