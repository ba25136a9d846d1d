//! Least-squares fit of the tanks-in-series model.
//!
//! Given the raw series `(t_i, Cind_i)` we minimize
//!
//! ```text
//! SSE(n, C0) = Σ (Cind_i − C0 · (t_i/tau)^k · exp(−t_i/tau) / k!)²,   k = ceil(n) − 1
//! ```
//!
//! over `[n, C0]`. The ceiling makes the objective piecewise constant in `n`,
//! so gradient-based methods see a zero slope almost everywhere. We use
//! `argmin`'s Nelder–Mead simplex, which only compares costs.
//!
//! Non-convergence is not an error: the best point seen is returned and
//! `CellFit::converged` records what the simplex reported. The same holds
//! when the cost-evaluation budget runs out, which stops the search at once.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use argmin::core::observers::{Observe, ObserverMode};
use argmin::core::{CostFunction, Error, Executor, KV, State, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;
use thiserror::Error as ThisError;

use crate::domain::{ApparatusConstants, CellFit, TracerSeries};
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::fit_response;

/// Options for the simplex search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFitOptions {
    /// Starting point `[n, C0]`.
    pub start: [f64; 2],
    pub max_iters: u64,
    /// Cost evaluations after which the search stops with the best point seen.
    pub max_cost_evals: u64,
    /// Stop when the standard deviation of simplex costs falls below this.
    pub sd_tolerance: f64,
    /// Relative perturbation used to build the initial simplex.
    pub simplex_step: f64,
}

impl Default for CellFitOptions {
    fn default() -> Self {
        Self {
            start: [5.0, 10.0],
            max_iters: 1000,
            max_cost_evals: 3000,
            sd_tolerance: 1e-12,
            simplex_step: 0.05,
        }
    }
}

/// Step used for a zero coordinate in the initial simplex.
const ZERO_COORD_STEP: f64 = 0.00025;

/// Raised from the cost function to stop the executor once the budget is spent.
#[derive(Debug, ThisError)]
#[error("cost evaluation budget of {0} exhausted")]
struct BudgetExhausted(u64);

struct CellProblem<'a> {
    series: &'a TracerSeries,
    tau: f64,
    evals: &'a AtomicU64,
    budget: u64,
    /// Lowest finite cost seen so far and its parameters.
    best: &'a Mutex<Option<(Vec<f64>, f64)>>,
}

impl CostFunction for CellProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        let used = self.evals.fetch_add(1, Ordering::Relaxed);
        if used >= self.budget {
            return Err(BudgetExhausted(self.budget).into());
        }
        let cost = sum_squared_residuals(self.series, self.tau, p[0], p[1]);
        if cost.is_finite() {
            let mut best = self.best.lock().map_err(|_| Error::msg("cell fit best-point lock poisoned"))?;
            if best.as_ref().is_none_or(|(_, c)| cost < *c) {
                *best = Some((p.clone(), cost));
            }
        }
        Ok(cost)
    }
}

/// Records the last completed iteration so it survives an aborted run.
struct IterationCounter(Arc<AtomicU64>);

impl<I: State> Observe<I> for IterationCounter {
    fn observe_iter(&mut self, state: &I, _kv: &KV) -> Result<(), Error> {
        self.0.store(state.get_iter(), Ordering::Relaxed);
        Ok(())
    }
}

/// Objective value at `[n, c0]`; `+∞` outside the model domain (`n ≤ 0`).
pub fn sum_squared_residuals(series: &TracerSeries, tau: f64, n: f64, c0: f64) -> f64 {
    let mut sse = 0.0;
    for p in series.points() {
        let Some(c_fit) = fit_response(p.t, tau, n, c0) else {
            return f64::INFINITY;
        };
        let r = p.concentration - c_fit;
        sse += r * r;
    }
    if sse.is_finite() { sse } else { f64::INFINITY }
}

/// Fit the number of cells and the inlet concentration.
pub fn calc_cells_and_inlet(
    series: &TracerSeries,
    apparatus: &ApparatusConstants,
    opts: &CellFitOptions,
) -> AnalysisResult<CellFit> {
    let evals = AtomicU64::new(0);
    let best_seen = Mutex::new(None);
    let last_iter = Arc::new(AtomicU64::new(0));
    let problem = CellProblem {
        series,
        tau: apparatus.tau,
        evals: &evals,
        budget: opts.max_cost_evals,
        best: &best_seen,
    };

    let solver = NelderMead::new(initial_simplex(opts.start, opts.simplex_step))
        .with_sd_tolerance(opts.sd_tolerance)
        .map_err(|e| AnalysisError::Optimizer(format!("invalid simplex settings: {e}")))?;

    let outcome = Executor::new(problem, solver)
        .configure(|state| state.max_iters(opts.max_iters))
        .add_observer(IterationCounter(Arc::clone(&last_iter)), ObserverMode::Always)
        .run();

    let (best, sse, converged, iterations) = match outcome {
        Ok(result) => {
            let state = result.state();
            let best = state
                .get_best_param()
                .cloned()
                .ok_or_else(|| AnalysisError::Optimizer("cell fit returned no parameters".to_string()))?;
            let converged = matches!(
                state.get_termination_status(),
                TerminationStatus::Terminated(TerminationReason::SolverConverged)
            );
            if !converged {
                log::warn!("cell fit did not report convergence ({:?})", state.get_termination_status());
            }
            (best, state.get_best_cost(), converged, state.get_iter())
        }
        Err(e) if e.downcast_ref::<BudgetExhausted>().is_some() => {
            let (best, sse) = best_seen
                .lock()
                .ok()
                .and_then(|guard| guard.clone())
                .ok_or_else(|| AnalysisError::Optimizer(format!("cell fit: {e} before any finite cost")))?;
            log::warn!("cell fit stopped early: {e}");
            (best, sse, false, last_iter.load(Ordering::Relaxed))
        }
        Err(e) => return Err(AnalysisError::Optimizer(format!("cell fit: {e}"))),
    };
    let cost_evaluations = evals.load(Ordering::Relaxed).min(opts.max_cost_evals);

    let n_raw = best[0];
    let inlet_concentration = best[1];
    if !(n_raw.is_finite() && inlet_concentration.is_finite() && sse.is_finite()) {
        return Err(AnalysisError::Optimizer(format!(
            "cell fit ended at a non-finite point (n={n_raw}, C0={inlet_concentration}, SSE={sse})"
        )));
    }
    let n = n_raw.ceil().max(1.0) as u32;

    log::info!("cell fit: n={n} (raw {n_raw:.4}), C0={inlet_concentration:.6}, SSE={sse:.6e}, iters={iterations}");

    Ok(CellFit {
        n,
        inlet_concentration,
        n_raw,
        sse,
        converged,
        iterations,
        cost_evaluations,
    })
}

fn initial_simplex(start: [f64; 2], step: f64) -> Vec<Vec<f64>> {
    let mut simplex = vec![start.to_vec()];
    for i in 0..start.len() {
        let mut vertex = start.to_vec();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * (1.0 + step)
        } else {
            ZERO_COORD_STEP
        };
        simplex.push(vertex);
    }
    simplex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::apparatus_with_tau;
    use crate::domain::TracerPoint;

    fn synthetic(n: f64, c0: f64, tau: f64) -> TracerSeries {
        let points = (0..=160)
            .map(|i| {
                let t = i as f64 * 0.25;
                TracerPoint {
                    t,
                    concentration: fit_response(t, tau, n, c0).unwrap(),
                }
            })
            .collect();
        TracerSeries::new(points).unwrap()
    }

    #[test]
    fn initial_simplex_perturbs_each_coordinate() {
        let s = initial_simplex([5.0, 0.0], 0.05);
        assert_eq!(s.len(), 3);
        assert_eq!(s[0], vec![5.0, 0.0]);
        assert_eq!(s[1], vec![5.25, 0.0]);
        assert_eq!(s[2], vec![5.0, ZERO_COORD_STEP]);
    }

    #[test]
    fn objective_is_infinite_without_cells() {
        let series = synthetic(3.0, 10.0, 4.0);
        assert_eq!(sum_squared_residuals(&series, 4.0, 0.0, 10.0), f64::INFINITY);
        assert_eq!(sum_squared_residuals(&series, 4.0, 3.0, 10.0), 0.0);
    }

    #[test]
    fn recovers_inlet_concentration_on_start_plateau() {
        let tau = 4.0;
        let series = synthetic(5.0, 25.0, tau);
        let fit = calc_cells_and_inlet(&series, &apparatus_with_tau(tau), &CellFitOptions::default()).unwrap();
        assert_eq!(fit.n, 5);
        assert!((fit.inlet_concentration - 25.0).abs() < 0.5, "C0 = {}", fit.inlet_concentration);
        assert!(fit.cost_evaluations <= 3000);
    }

    #[test]
    fn cell_count_is_a_positive_integer() {
        let tau = 2.0;
        let series = synthetic(1.0, 3.0, tau);
        let fit = calc_cells_and_inlet(&series, &apparatus_with_tau(tau), &CellFitOptions::default()).unwrap();
        assert!(fit.n >= 1);
        assert_eq!(fit.n, (fit.n_raw.ceil().max(1.0)) as u32);
        let start_cost = sum_squared_residuals(&series, tau, 5.0, 10.0);
        assert!(fit.sse <= start_cost);
    }

    #[test]
    fn evaluation_budget_caps_the_search() {
        let tau = 4.0;
        let series = synthetic(2.0, 8.0, tau);
        let opts = CellFitOptions {
            max_cost_evals: 10,
            ..CellFitOptions::default()
        };
        let fit = calc_cells_and_inlet(&series, &apparatus_with_tau(tau), &opts).unwrap();
        assert_eq!(fit.cost_evaluations, 10);
        assert!(fit.sse.is_finite());
        assert!(fit.n >= 1);
        // Stops as soon as the budget is spent: 3 vertices, then at least one evaluation per iteration.
        assert!(!fit.converged);
        assert!(fit.iterations <= 7, "iterations = {}", fit.iterations);
        assert!(fit.sse <= sum_squared_residuals(&series, tau, 5.0, 10.0));
    }

    #[test]
    fn empty_budget_is_an_optimizer_error() {
        let tau = 4.0;
        let series = synthetic(2.0, 8.0, tau);
        let opts = CellFitOptions {
            max_cost_evals: 0,
            ..CellFitOptions::default()
        };
        let err = calc_cells_and_inlet(&series, &apparatus_with_tau(tau), &opts).unwrap_err();
        assert!(matches!(err, AnalysisError::Optimizer(_)));
    }
}
