//! Command-line parsing for the RTD tracer analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the numeric code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rtd", version, about = "Residence time distribution analysis of tracer experiments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a tracer table: moments, statistics, Péclet numbers, cell fit, simplified method.
    Analyze(AnalyzeArgs),
    /// Generate a synthetic tanks-in-series tracer table.
    Sample(SampleArgs),
    /// Print the resolved apparatus parameters and derived constants.
    Apparatus(ApparatusArgs),
}

/// Apparatus file plus per-field overrides (shared by every subcommand).
#[derive(Debug, Args, Clone, Default)]
pub struct ApparatusArgs {
    /// Apparatus JSON file (keys `L`, `d`, `w`, `Q`, `gamma`). Falls back to `RTD_APPARATUS`.
    #[arg(long, value_name = "JSON")]
    pub apparatus: Option<PathBuf>,

    /// Column length `L` (m).
    #[arg(long)]
    pub length: Option<f64>,

    /// Column diameter `d` (m).
    #[arg(long)]
    pub diameter: Option<f64>,

    /// Volumetric flow rate `w` (m3/s).
    #[arg(long)]
    pub flow_rate: Option<f64>,

    /// Injected tracer mass `Q` (kg).
    #[arg(long)]
    pub tracer_mass: Option<f64>,

    /// Packing coefficient `gamma` in [0, 1).
    #[arg(long)]
    pub gamma: Option<f64>,
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Tracer table with `t` and `Cind` columns.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Field delimiter of the tracer table.
    #[arg(long, default_value_t = ';')]
    pub delimiter: char,

    #[command(flatten)]
    pub apparatus: ApparatusArgs,

    /// Round moments (3 dp) and statistics (6 dp) before downstream stages, like the legacy tool.
    #[arg(long)]
    pub legacy_rounding: bool,

    /// Starting guess for the Péclet root finder.
    #[arg(long, default_value_t = 1.0)]
    pub root_start: f64,

    /// Maximum Newton iterations per Péclet equation.
    #[arg(long, default_value_t = 200)]
    pub root_max_iter: usize,

    /// Maximum simplex iterations for the cell fit.
    #[arg(long, default_value_t = 1000)]
    pub fit_max_iters: u64,

    /// Maximum objective evaluations for the cell fit.
    #[arg(long, default_value_t = 3000)]
    pub fit_max_evals: u64,

    /// Show the N samples with the largest residuals.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Export the summary (all result blocks) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Export per-point results (t, Cind, theta, psi, c_fit, residual) to CSV.
    #[arg(long = "export-points")]
    pub export_points: Option<PathBuf>,

    /// Export the fitted model curve with per-cell profiles to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,

    /// Grid size of the exported curve.
    #[arg(long, default_value_t = 201)]
    pub curve_points: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output table (`t;Cind`).
    #[arg(long, short = 'o', value_name = "CSV")]
    pub out: PathBuf,

    /// Number of ideal mixing cells.
    #[arg(long, short = 'n', default_value_t = 5)]
    pub cells: u32,

    /// Inlet concentration `C0`.
    #[arg(long, default_value_t = 10.0)]
    pub c0: f64,

    /// Sampling step (s).
    #[arg(long, default_value_t = 0.25)]
    pub dt: f64,

    /// Last sample time (s). Defaults to four residence times.
    #[arg(long)]
    pub duration: Option<f64>,

    /// Noise standard deviation as a fraction of the peak.
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub apparatus: ApparatusArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_defaults() {
        let cli = Cli::parse_from(["rtd", "analyze", "data.csv"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.delimiter, ';');
        assert_eq!(args.fit_max_evals, 3000);
        assert!(!args.legacy_rounding);
        assert!(args.apparatus.apparatus.is_none());
    }

    #[test]
    fn apparatus_overrides_parse() {
        let cli = Cli::parse_from(["rtd", "apparatus", "--length", "10", "--gamma", "0.5"]);
        let Command::Apparatus(args) = cli.command else {
            panic!("expected apparatus");
        };
        assert_eq!(args.length, Some(10.0));
        assert_eq!(args.gamma, Some(0.5));
    }

    #[test]
    fn sample_requires_output() {
        assert!(Cli::try_parse_from(["rtd", "sample"]).is_err());
        assert!(Cli::try_parse_from(["rtd", "sample", "-o", "s.csv", "-n", "3"]).is_ok());
    }
}
