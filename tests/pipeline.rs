//! End-to-end runs over synthetic tracer tables.

use approx::assert_abs_diff_eq;

use rtd_analysis::app::pipeline::{analyze, run_analysis};
use rtd_analysis::data::{SampleConfig, generate_sample, write_series_csv};
use rtd_analysis::domain::{AnalysisConfig, AnalysisOptions, ApparatusConstants, ApparatusParams};
use rtd_analysis::io::{build_curve, read_curve_json, write_curve_json, write_points_csv, write_report_json};

fn erlang_sample(cells: u32, noise: f64) -> (SampleConfig, ApparatusParams) {
    let params = ApparatusParams::default();
    let tau = ApparatusConstants::derive(&params).unwrap().tau;
    let config = SampleConfig {
        cells,
        inlet_concentration: 10.0,
        tau,
        dt: 0.25,
        duration: 15.0 * tau,
        noise,
        seed: 11,
    };
    (config, params)
}

#[test]
fn noiseless_cascade_has_erlang_moments() {
    let (config, params) = erlang_sample(3, 0.0);
    let sample = generate_sample(&config).unwrap();
    let analysis = analyze(&sample.series, &params, &AnalysisOptions::default()).unwrap();

    // Erlang(3) in θ: mean 3, variance 3, skewness 2/√3, kurtosis 5.
    assert_abs_diff_eq!(analysis.moments.alpha1, 3.0, epsilon = 1e-2);
    assert_abs_diff_eq!(analysis.moments.alpha2, 12.0, epsilon = 5e-2);
    assert_abs_diff_eq!(analysis.statistics.variance, 3.0, epsilon = 5e-2);
    assert_abs_diff_eq!(analysis.statistics.skewness, 2.0 / 3f64.sqrt(), epsilon = 5e-2);
    assert_abs_diff_eq!(analysis.statistics.kurtosis, 5.0, epsilon = 1e-1);

    // α1 > 1.001 so the mean-based estimator is available.
    assert!(analysis.peclet.estimates[0].is_some());
    assert!(analysis.peclet.pesr_all.is_finite());
    assert!(analysis.peclet.n_all >= 7 && analysis.peclet.n_all <= 9);
    assert!(analysis.simplified.pe.is_finite());
}

#[test]
fn csv_to_report_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tracer.csv");
    let (config, params) = erlang_sample(4, 0.01);
    let sample = generate_sample(&config).unwrap();
    write_series_csv(&input, &sample.series).unwrap();

    let run = run_analysis(&AnalysisConfig {
        input: input.clone(),
        delimiter: b';',
        apparatus: params,
        options: AnalysisOptions::default(),
        export_json: None,
        export_points: None,
        export_curve: None,
        curve_points: 51,
    })
    .unwrap();

    assert_eq!(run.report.n_points, sample.series.len());
    assert_eq!(run.point_fits.len(), sample.series.len());
    assert!(run.report.cell_fit.n >= 1);
    assert!(run.report.cell_fit.sse.is_finite());
    assert!(run.point_fits.iter().all(|f| f.residual.is_finite()));

    let summary = dir.path().join("summary.json");
    write_report_json(&summary, &run.report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(json["tool"], "rtd");
    assert_eq!(json["peclet"]["estimates"].as_array().unwrap().len(), 9);

    let points = dir.path().join("points.csv");
    write_points_csv(&points, &run.point_fits).unwrap();
    let rows = std::fs::read_to_string(&points).unwrap().lines().count();
    assert_eq!(rows, sample.series.len() + 1);

    let curve_path = dir.path().join("curve.json");
    let curve = build_curve(&run.analysis.apparatus, &run.analysis.cell_fit, run.ingest.series.t_max(), 51);
    write_curve_json(&curve_path, &curve).unwrap();
    let curve = read_curve_json(&curve_path).unwrap();
    assert_eq!(curve.grid.t.len(), 51);
    assert_eq!(curve.grid.cells.len(), run.analysis.cell_fit.n as usize);
}

#[test]
fn all_zero_table_is_degenerate() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("flat.csv");
    std::fs::write(&input, "t;Cind\n0;0\n1;0\n2;0\n").unwrap();

    let err = run_analysis(&AnalysisConfig {
        input,
        delimiter: b';',
        apparatus: ApparatusParams::default(),
        options: AnalysisOptions::default(),
        export_json: None,
        export_points: None,
        export_curve: None,
        curve_points: 10,
    })
    .unwrap_err();
    assert_eq!(err.exit_code(), 3);
}
