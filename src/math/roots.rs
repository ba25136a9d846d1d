//! Scalar root finding for the Péclet estimators.
//!
//! All transcendental estimators share one solving policy:
//!
//! - start from the same point (`x0 = 1.0` by default)
//! - Newton steps with a central finite-difference slope (`finitediff`)
//! - backtracking: halve the step until `|f|` decreases and stays finite
//!
//! Backtracking keeps iterates out of regions where an estimator equation is
//! undefined (e.g. `(3 + 2x)^1.5` for `x < −1.5`). Failure is reported as a
//! [`RootFailure`]; callers decide whether it is fatal.

use finitediff::FiniteDiff;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOptions {
    /// Starting point.
    pub x0: f64,
    /// Maximum Newton iterations.
    pub max_iter: usize,
    /// `|f(x)|` at or below this is a root.
    pub f_tol: f64,
    /// Relative step size at which iteration stops.
    pub x_tol: f64,
    /// Residual accepted when the step has collapsed or stalled.
    pub residual_tol: f64,
    /// Step halvings per iteration.
    pub max_backtracks: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            x0: 1.0,
            max_iter: 200,
            f_tol: 1e-12,
            x_tol: 1.49012e-8,
            residual_tol: 1e-8,
            max_backtracks: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RootFailure {
    #[error("equation is not finite at the start point x={x}")]
    NonFiniteStart { x: f64 },
    #[error("slope vanished or is not finite at x={x}")]
    FlatSlope { x: f64 },
    #[error("no step decreases the residual at x={x} (|f|={residual:e})")]
    Stalled { x: f64, residual: f64 },
    #[error("iteration limit reached at x={x} (|f|={residual:e})")]
    MaxIterations { x: f64, residual: f64 },
}

/// Find a root of `f` starting at `opts.x0`.
pub fn newton_root<F>(f: F, opts: &RootOptions) -> Result<f64, RootFailure>
where
    F: Fn(f64) -> f64,
{
    let mut x = opts.x0;
    let mut fx = f(x);
    if !fx.is_finite() {
        return Err(RootFailure::NonFiniteStart { x });
    }

    for _ in 0..opts.max_iter {
        if fx.abs() <= opts.f_tol {
            return Ok(x);
        }

        let slope = slope_at(&f, x);
        if !slope.is_finite() || slope == 0.0 {
            return Err(RootFailure::FlatSlope { x });
        }
        let step = fx / slope;

        let mut lambda = 1.0;
        let mut accepted = None;
        for _ in 0..=opts.max_backtracks {
            let x_new = x - lambda * step;
            let f_new = f(x_new);
            if f_new.is_finite() && f_new.abs() < fx.abs() {
                accepted = Some((x_new, f_new));
                break;
            }
            lambda *= 0.5;
        }

        let Some((x_new, f_new)) = accepted else {
            return if fx.abs() <= opts.residual_tol {
                Ok(x)
            } else {
                Err(RootFailure::Stalled { x, residual: fx.abs() })
            };
        };

        let dx = (x_new - x).abs();
        x = x_new;
        fx = f_new;
        if dx <= opts.x_tol * (x.abs() + opts.x_tol) && fx.abs() <= opts.residual_tol {
            return Ok(x);
        }
    }

    if fx.abs() <= opts.f_tol {
        Ok(x)
    } else {
        Err(RootFailure::MaxIterations { x, residual: fx.abs() })
    }
}

fn slope_at<F>(f: &F, x: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let point = vec![x];
    let grad = point.central_diff(&|v: &Vec<f64>| f(v[0]));
    grad[0]
}
