//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the apparatus configuration
//! - runs the analysis pipeline
//! - prints reports and writes optional exports

use clap::Parser;

use crate::cli::{AnalyzeArgs, ApparatusArgs, Command, SampleArgs};
use crate::domain::{AnalysisConfig, AnalysisOptions, ApparatusConstants, ApparatusParams};
use crate::error::AppError;
use crate::fit::CellFitOptions;
use crate::io::{ApparatusOverrides, resolve_apparatus};
use crate::math::RootOptions;

pub mod pipeline;

/// Entry point for the `rtd` binary.
pub fn run() -> Result<(), AppError> {
    // A second init (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Sample(args) => handle_sample(args),
        Command::Apparatus(args) => handle_apparatus(args),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = config_from_args(&args)?;
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_run_summary(&run.ingest, &run.report));
    if args.top > 0 {
        println!("{}", crate::report::format_largest_residuals(&run.point_fits, args.top));
    }

    // Optional exports.
    if let Some(path) = &config.export_json {
        crate::io::write_report_json(path, &run.report)?;
    }
    if let Some(path) = &config.export_points {
        crate::io::write_points_csv(path, &run.point_fits)?;
    }
    if let Some(path) = &config.export_curve {
        let curve = crate::io::build_curve(
            &run.analysis.apparatus,
            &run.analysis.cell_fit,
            run.ingest.series.t_max(),
            config.curve_points,
        );
        crate::io::write_curve_json(path, &curve)?;
    }

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let params = apparatus_from_args(&args.apparatus)?;
    let apparatus = ApparatusConstants::derive(&params)?;

    let config = crate::data::SampleConfig {
        cells: args.cells,
        inlet_concentration: args.c0,
        tau: apparatus.tau,
        dt: args.dt,
        duration: args.duration.unwrap_or(4.0 * apparatus.tau),
        noise: args.noise,
        seed: args.seed,
    };
    let sample = crate::data::generate_sample(&config)?;
    crate::data::write_series_csv(&args.out, &sample.series)?;

    println!(
        "Wrote {} samples (n={}, tau={:.4} s) to {}",
        sample.series.len(),
        config.cells,
        config.tau,
        args.out.display()
    );
    Ok(())
}

fn handle_apparatus(args: ApparatusArgs) -> Result<(), AppError> {
    let params = apparatus_from_args(&args)?;
    let apparatus = ApparatusConstants::derive(&params)?;
    println!("{}", crate::report::format_apparatus(&apparatus));
    Ok(())
}

fn apparatus_from_args(args: &ApparatusArgs) -> Result<ApparatusParams, AppError> {
    let overrides = ApparatusOverrides {
        length: args.length,
        diameter: args.diameter,
        flow_rate: args.flow_rate,
        tracer_mass: args.tracer_mass,
        void_fraction: args.gamma,
    };
    resolve_apparatus(args.apparatus.as_deref(), &overrides)
}

pub fn config_from_args(args: &AnalyzeArgs) -> Result<AnalysisConfig, AppError> {
    if !args.delimiter.is_ascii() {
        return Err(AppError::new(2, format!("Delimiter must be a single ASCII character (got '{}').", args.delimiter)));
    }

    let options = AnalysisOptions {
        legacy_rounding: args.legacy_rounding,
        roots: RootOptions {
            x0: args.root_start,
            max_iter: args.root_max_iter,
            ..RootOptions::default()
        },
        cell_fit: CellFitOptions {
            max_iters: args.fit_max_iters,
            max_cost_evals: args.fit_max_evals,
            ..CellFitOptions::default()
        },
    };

    Ok(AnalysisConfig {
        input: args.input.clone(),
        delimiter: args.delimiter as u8,
        apparatus: apparatus_from_args(&args.apparatus)?,
        options,
        export_json: args.export_json.clone(),
        export_points: args.export_points.clone(),
        export_curve: args.export_curve.clone(),
        curve_points: args.curve_points,
    })
}
