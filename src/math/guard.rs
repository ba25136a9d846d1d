//! Guards for divisions that must never leak `NaN`/`Inf` into results.

use crate::error::{AnalysisError, AnalysisResult};

/// Divide `num / den`, failing with `DegenerateInput` when the quotient is undefined.
///
/// `what` names the denominator in the error message (e.g. `"sum of psi"`).
pub fn checked_div(num: f64, den: f64, computation: &'static str, what: &str) -> AnalysisResult<f64> {
    if den == 0.0 || !den.is_finite() {
        return Err(AnalysisError::degenerate(
            computation,
            format!("{what} is {den}; division undefined"),
        ));
    }
    let q = num / den;
    if !q.is_finite() {
        return Err(AnalysisError::degenerate(
            computation,
            format!("{what} = {den} produced a non-finite quotient"),
        ));
    }
    Ok(q)
}

/// Round to `digits` decimal places (half away from zero).
pub fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}
