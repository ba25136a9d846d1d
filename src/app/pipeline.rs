//! Shared analysis pipeline used by the CLI and the integration tests.
//!
//! Workflow: ingest -> apparatus constants -> three independent branches -> report.
//!
//! - moments -> statistics -> Péclet numbers
//! - tanks-in-series fit
//! - simplified method
//!
//! The branches share only read-only inputs and run on the rayon pool.

use chrono::Local;

use crate::analysis::{Dimensionless, calc_peclet_numbers, calc_simple_method, calculate_statistics, moments_of};
use crate::domain::{
    AnalysisConfig, AnalysisOptions, AnalysisReport, ApparatusConstants, ApparatusParams, CellFit, Moments,
    PecletResult, PointFit, SimplifiedResult, Statistics, TracerSeries,
};
use crate::error::{AnalysisResult, AppError};
use crate::fit::calc_cells_and_inlet;
use crate::io::{IngestedData, load_tracer_series};

/// Full-precision analysis of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub apparatus: ApparatusConstants,
    pub n_points: usize,
    pub moments: Moments,
    pub statistics: Statistics,
    pub peclet: PecletResult,
    pub cell_fit: CellFit,
    pub simplified: SimplifiedResult,
}

impl Analysis {
    /// Snapshot at display precision (3 dp moments, 6 dp elsewhere).
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            tool: "rtd".to_string(),
            generated_at: Local::now(),
            apparatus: self.apparatus,
            n_points: self.n_points,
            moments: self.moments.rounded(),
            statistics: self.statistics.rounded(),
            peclet: self.peclet.rounded(),
            cell_fit: self.cell_fit,
            simplified: self.simplified.rounded(),
        }
    }
}

/// All computed outputs of a single `rtd analyze` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub analysis: Analysis,
    pub report: AnalysisReport,
    pub point_fits: Vec<PointFit>,
}

/// Run every analysis stage on an in-memory series.
pub fn analyze(series: &TracerSeries, params: &ApparatusParams, options: &AnalysisOptions) -> AnalysisResult<Analysis> {
    let apparatus = ApparatusConstants::derive(params)?;
    log::debug!("apparatus: V={:.6e}, tau={:.6}, v={:.6e}", apparatus.volume, apparatus.tau, apparatus.velocity);

    let (moment_branch, (cell_fit, simplified)) = rayon::join(
        || moment_chain(series, &apparatus, options),
        || {
            rayon::join(
                || calc_cells_and_inlet(series, &apparatus, &options.cell_fit),
                || calc_simple_method(series, &apparatus),
            )
        },
    );
    let (moments, statistics, peclet) = moment_branch?;

    Ok(Analysis {
        apparatus,
        n_points: series.len(),
        moments,
        statistics,
        peclet,
        cell_fit: cell_fit?,
        simplified: simplified?,
    })
}

fn moment_chain(
    series: &TracerSeries,
    apparatus: &ApparatusConstants,
    options: &AnalysisOptions,
) -> AnalysisResult<(Moments, Statistics, PecletResult)> {
    let dimless = Dimensionless::new(series, apparatus);

    let mut moments = moments_of(&dimless)?;
    if options.legacy_rounding {
        moments = moments.rounded();
    }
    let mut statistics = calculate_statistics(&dimless, &moments)?;
    if options.legacy_rounding {
        statistics = statistics.rounded();
    }
    let peclet = calc_peclet_numbers(&moments, &statistics, apparatus, &options.roots)?;
    Ok((moments, statistics, peclet))
}

/// Execute the full pipeline for a configured run: ingest, analyze, per-point fits.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let ingest = load_tracer_series(&config.input, config.delimiter)?;
    let analysis = analyze(&ingest.series, &config.apparatus, &config.options)?;
    let point_fits = crate::report::compute_point_fits(&ingest.series, &analysis.apparatus, &analysis.cell_fit)?;
    let report = analysis.report();

    Ok(RunOutput {
        ingest,
        analysis,
        report,
        point_fits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::calculate_moments;

    fn washout() -> (TracerSeries, ApparatusParams) {
        let params = ApparatusParams::default();
        let tau = ApparatusConstants::derive(&params).unwrap().tau;
        let t: Vec<f64> = (0..=400).map(|i| i as f64 * tau / 40.0).collect();
        let c: Vec<f64> = t.iter().map(|&ti| 5.0 * (ti / tau) * (-ti / tau).exp()).collect();
        (TracerSeries::from_columns(&t, &c).unwrap(), params)
    }

    #[test]
    fn branches_agree_with_direct_calls() {
        let (series, params) = washout();
        let analysis = analyze(&series, &params, &AnalysisOptions::default()).unwrap();
        let direct = calculate_moments(&series, &analysis.apparatus).unwrap();
        assert_eq!(analysis.moments, direct);
        assert_eq!(analysis.n_points, 401);
        assert!(analysis.cell_fit.n >= 1);
    }

    #[test]
    fn legacy_rounding_rounds_moments_before_downstream() {
        let (series, params) = washout();
        let options = AnalysisOptions {
            legacy_rounding: true,
            ..AnalysisOptions::default()
        };
        let analysis = analyze(&series, &params, &options).unwrap();
        assert_eq!(analysis.moments, analysis.moments.rounded());
        assert_eq!(analysis.statistics, analysis.statistics.rounded());
    }

    #[test]
    fn degenerate_apparatus_is_reported() {
        let (series, _) = washout();
        let params = ApparatusParams {
            flow_rate: 0.0,
            ..ApparatusParams::default()
        };
        let err = analyze(&series, &params, &AnalysisOptions::default()).unwrap_err();
        assert!(err.is_degenerate());
    }
}
