//! Formatted terminal output.
//!
//! Formatting lives in one place so the analysis code stays clean and
//! output changes are localized.

use crate::domain::{AnalysisReport, ApparatusConstants, PECLET_ESTIMATORS, PointFit};
use crate::io::IngestedData;

/// Format the full run summary (dataset stats + every analysis section).
pub fn format_run_summary(ingest: &IngestedData, report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str("=== rtd - Residence Time Distribution Analysis ===\n");
    out.push_str(&format!("Generated: {}\n", report.generated_at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!(
        "Points: n={} of {} rows | t=[{:.3}, {:.3}]s | Cind max={:.6}\n",
        ingest.stats.n_points,
        ingest.rows_read,
        ingest.stats.t_min,
        ingest.stats.t_max,
        ingest.stats.c_max,
    ));
    if !ingest.row_errors.is_empty() {
        out.push_str(&format!("Skipped rows: {}\n", ingest.row_errors.len()));
    }

    out.push('\n');
    out.push_str(&format_apparatus(&report.apparatus));
    out.push('\n');
    out.push_str(&format_analysis(report));

    out
}

/// Format apparatus parameters and derived constants.
pub fn format_apparatus(a: &ApparatusConstants) -> String {
    let mut out = String::new();
    out.push_str("Apparatus:\n");
    out.push_str(&format!(
        "- L={} m | d={} m | w={} m3/s | Q={} kg | gamma={}\n",
        a.length, a.diameter, a.flow_rate, a.tracer_mass, a.void_fraction
    ));
    out.push_str(&format!("- V   : {:.6e} m3\n", a.volume));
    out.push_str(&format!("- tau : {:.6} s\n", a.tau));
    out.push_str(&format!("- v   : {:.6e} 1/s\n", a.velocity));
    out
}

/// Format moments, statistics, Péclet numbers, cell fit and simplified method.
pub fn format_analysis(report: &AnalysisReport) -> String {
    let mut out = String::new();

    let m = &report.moments;
    out.push_str("Moments:\n");
    out.push_str(&format!("- alpha: {}\n", fmt_vec(&[m.alpha1, m.alpha2, m.alpha3, m.alpha4], 3)));

    let s = &report.statistics;
    out.push_str("\nStatistics:\n");
    out.push_str(&format!("- mode          : {:.6}\n", s.mode));
    out.push_str(&format!("- modal density : {:.6}\n", s.modal_density));
    out.push_str(&format!("- variance      : {:.6}\n", s.variance));
    out.push_str(&format!("- skewness      : {:.6}\n", s.skewness));
    out.push_str(&format!("- kurtosis      : {:.6}\n", s.kurtosis));

    let p = &report.peclet;
    out.push_str(&format!(
        "\nPeclet numbers ({} of {} available):\n",
        p.available(),
        PECLET_ESTIMATORS
    ));
    for (i, e) in p.estimates.iter().enumerate() {
        out.push_str(&format!("- Pe{:<2}: {}\n", i + 1, fmt_opt(*e)));
    }
    out.push_str(&format!("- Pe (all, /{}) : {:.6}\n", p.n_all, p.pesr_all));
    out.push_str(&format!("- Pe (1,2,5,7, /{}) : {:.6}\n", p.n4, p.pesr4));
    out.push_str(&format!("- D (all) : {:.6e}\n", p.dsr_all));
    out.push_str(&format!("- D (four): {:.6e}\n", p.dsr4));
    out.push_str(&format!("- n1={:.6} | n2={:.6}\n", p.n1, p.n2));

    let c = &report.cell_fit;
    out.push_str("\nCell model fit:\n");
    out.push_str(&format!(
        "- n={} (raw {:.4}) | C0={:.6} | SSE={:.6e}\n",
        c.n, c.n_raw, c.inlet_concentration, c.sse
    ));
    out.push_str(&format!(
        "- converged={} | iters={} | evals={}\n",
        c.converged, c.iterations, c.cost_evaluations
    ));

    let sm = &report.simplified;
    out.push_str("\nSimplified method:\n");
    out.push_str(&format!(
        "- tau1={:.6} s | dt={} | dtheta={:.6}\n",
        sm.mean_residence_time, sm.delta_t, sm.delta_theta
    ));
    out.push_str(&format!("- M0={:.6} | M1={:.6} | M2={:.6}\n", sm.m0, sm.m1, sm.m2));
    out.push_str(&format!("- Pe={:.6} | n={:.6}\n", sm.pe, sm.n));

    out
}

/// Format the samples with the largest absolute residuals.
pub fn format_largest_residuals(fits: &[PointFit], top_n: usize) -> String {
    let mut sorted = fits.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .abs()
            .partial_cmp(&a.residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = String::new();
    out.push_str("Largest residuals:\n");
    out.push_str(format!("{:>10} {:>12} {:>12} {:>12}", "t", "Cind", "c_fit", "residual").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<10} {:-<12} {:-<12} {:-<12}", "", "", "", "").trim_end());
    out.push('\n');
    for f in sorted.iter().take(top_n) {
        out.push_str(
            format!(
                "{:>10.3} {:>12.6} {:>12.6} {:>12.6}",
                f.point.t, f.point.concentration, f.c_fit, f.residual
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_vec(v: &[f64], digits: usize) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.digits$}")).collect();
    format!("[{}]", parts.join(", "))
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{x:.6}"),
        None => "n/a".to_string(),
    }
}
