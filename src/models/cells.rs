//! Tanks-in-series (Erlang) response model.
//!
//! Two primitive operations:
//! - `fit_response`: the outlet response used by the least-squares fit, where
//!   the cell count is continuous and snapped with a ceiling
//! - `cell_profile`: the closed-form concentration of cell `j` in a cascade
//!   of equal cells (used for curve exports)

use crate::math::ln_erlang_term;

/// Kernel order for a continuous cell count: `k = ceil(n) − 1`.
///
/// Returns `None` for `n ≤ 0` (no cells) or a non-finite `n`.
pub fn snapped_order(n: f64) -> Option<u64> {
    if !n.is_finite() || n <= 0.0 {
        return None;
    }
    Some((n.ceil() - 1.0) as u64)
}

/// Outlet response `C0 · (t/tau)^k · exp(−t/tau) / k!` with `k = ceil(n) − 1`.
///
/// The objective built on this is piecewise constant in `n`.
/// Returns `None` outside the model domain (`n ≤ 0`).
pub fn fit_response(t: f64, tau: f64, n: f64, c0: f64) -> Option<f64> {
    let k = snapped_order(n)?;
    Some(erlang(t / tau, k, c0))
}

/// Concentration of cell `j` (1-based) in a cascade with per-cell residence
/// time `tau_cell`, after a pulse of concentration `c0` in the first cell.
pub fn cell_profile(t: f64, tau_cell: f64, j: u32, c0: f64) -> f64 {
    erlang(t / tau_cell, u64::from(j.max(1) - 1), c0)
}

fn erlang(z: f64, k: u64, c0: f64) -> f64 {
    match ln_erlang_term(k, z) {
        Some(ln) => c0 * ln.exp(),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_snaps_order() {
        assert_eq!(snapped_order(5.0), Some(4));
        assert_eq!(snapped_order(4.01), Some(4));
        assert_eq!(snapped_order(5.25), Some(5));
        assert_eq!(snapped_order(0.2), Some(0));
        assert_eq!(snapped_order(0.0), None);
        assert_eq!(snapped_order(-1.0), None);
    }

    #[test]
    fn response_is_flat_within_a_plateau() {
        let a = fit_response(3.0, 2.0, 4.1, 10.0).unwrap();
        let b = fit_response(3.0, 2.0, 4.9, 10.0).unwrap();
        assert_eq!(a, b);
        assert!(fit_response(3.0, 2.0, -0.5, 10.0).is_none());
    }

    #[test]
    fn single_cell_is_exponential_washout() {
        let c = fit_response(2.0, 2.0, 1.0, 5.0).unwrap();
        assert!((c - 5.0 * (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(cell_profile(0.0, 1.0, 1, 5.0), 5.0);
        assert_eq!(cell_profile(0.0, 1.0, 3, 5.0), 0.0);
    }

    #[test]
    fn large_orders_stay_finite() {
        let c = fit_response(400.0, 2.0, 250.0, 1.0).unwrap();
        assert!(c.is_finite());
    }
}
