//! Special functions used by the RTD estimators.
//!
//! - `modal_density(x)`: the dispersion-model density at its mode, as a
//!   function of the Péclet number `x`
//! - `ln_erlang_term(k, z)`: `ln(z^k e^{-z} / k!)`, the log of the
//!   tanks-in-series density kernel

use std::f64::consts::PI;

use statrs::function::erf::erfc;
use statrs::function::factorial::{factorial, ln_factorial};

/// Order of the truncated exponential series in `modal_density`.
const TAYLOR_ORDER: u64 = 5;

/// Modal density of the dispersion model for Péclet number `x`:
///
/// `f(x) = √((2+x)/π) · exp(−1/(2+x)) · (x/2) · erfc((1+x)/√(2+x)) · Σ_{k=0}^{5} x^k/k!`
///
/// Returns `NaN` for `x < −2` (outside the model domain).
pub fn modal_density(x: f64) -> f64 {
    let s = 2.0 + x;
    let tail = erfc((1.0 + x) / s.sqrt());
    let norm = (s / PI).sqrt();
    let damp = (-1.0 / s).exp();
    let series: f64 = (0..=TAYLOR_ORDER)
        .map(|k| x.powi(k as i32) / factorial(k))
        .sum();
    norm * damp * (x / 2.0) * tail * series
}

/// `ln(z^k · e^{−z} / k!)` for `z ≥ 0`.
///
/// Returns `None` when the kernel is exactly zero (`z = 0`, `k > 0`).
pub fn ln_erlang_term(k: u64, z: f64) -> Option<f64> {
    if z == 0.0 {
        // 0^0 = 1 for the first cell.
        return if k == 0 { Some(0.0) } else { None };
    }
    Some(k as f64 * z.ln() - z - ln_factorial(k))
}
