//! Synthetic tracer responses from an ideal tanks-in-series column.
//!
//! The clean signal is the outlet of `cells` equal cells with total residence
//! time `tau`. Gaussian noise proportional to the peak is added, then clipped
//! at zero so the series stays physically valid.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{TracerPoint, TracerSeries};
use crate::error::AppError;
use crate::models::fit_response;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    pub cells: u32,
    pub inlet_concentration: f64,
    /// Mean residence time of the whole cascade (s).
    pub tau: f64,
    /// Sampling step (s).
    pub dt: f64,
    /// Last sample time (s).
    pub duration: f64,
    /// Noise standard deviation as a fraction of the clean peak.
    pub noise: f64,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub series: TracerSeries,
    /// Noise-free response at the same times.
    pub clean: Vec<f64>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.cells == 0 {
        return Err(AppError::new(2, "Cell count must be > 0."));
    }
    let positive = [
        ("inlet concentration", config.inlet_concentration),
        ("tau", config.tau),
        ("dt", config.dt),
        ("duration", config.duration),
    ];
    for (name, v) in positive {
        if !(v.is_finite() && v > 0.0) {
            return Err(AppError::new(2, format!("Sample {name} must be finite and > 0.")));
        }
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Sample noise must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let steps = (config.duration / config.dt).floor() as usize;
    let n = f64::from(config.cells);
    let clean: Vec<f64> = (0..=steps)
        .map(|i| fit_response(i as f64 * config.dt, config.tau, n, config.inlet_concentration).unwrap_or(0.0))
        .collect();

    let peak = clean.iter().copied().fold(0.0, f64::max);
    let sigma = config.noise * peak;

    let points = clean
        .iter()
        .enumerate()
        .map(|(i, &c)| TracerPoint {
            t: i as f64 * config.dt,
            concentration: (c + sigma * normal.sample(&mut rng)).max(0.0),
        })
        .collect();
    let series = TracerSeries::new(points)?;

    log::info!(
        "sample: {} points, n={}, tau={:.3}, noise={:.3}",
        series.len(),
        config.cells,
        config.tau,
        config.noise
    );

    Ok(SampleData { series, clean })
}

/// Write a series as a `;`-delimited `t;Cind` table (the ingest format).
pub fn write_series_csv(path: &Path, series: &TracerSeries) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    for p in series.points() {
        writer
            .serialize(p)
            .map_err(|e| AppError::new(2, format!("Failed to write sample CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sample CSV: {e}")))?;
    Ok(())
}

fn sample_seed(config: &SampleConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.cells.hash(&mut hasher);
    config.inlet_concentration.to_bits().hash(&mut hasher);
    config.tau.to_bits().hash(&mut hasher);
    config.dt.to_bits().hash(&mut hasher);
    config.duration.to_bits().hash(&mut hasher);
    config.noise.to_bits().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_tracer_series;

    fn config() -> SampleConfig {
        SampleConfig {
            cells: 3,
            inlet_concentration: 10.0,
            tau: 5.0,
            dt: 0.5,
            duration: 40.0,
            noise: 0.02,
            seed: 7,
        }
    }

    #[test]
    fn same_seed_same_series() {
        let a = generate_sample(&config()).unwrap();
        let b = generate_sample(&config()).unwrap();
        assert_eq!(a.series, b.series);
        assert_eq!(a.series.len(), 81);
    }

    #[test]
    fn noiseless_sample_matches_model() {
        let cfg = SampleConfig { noise: 0.0, ..config() };
        let s = generate_sample(&cfg).unwrap();
        for (p, c) in s.series.points().iter().zip(&s.clean) {
            assert_eq!(p.concentration, *c);
        }
    }

    #[test]
    fn noisy_sample_is_never_negative() {
        let cfg = SampleConfig { noise: 0.5, ..config() };
        let s = generate_sample(&cfg).unwrap();
        assert!(s.series.concentrations().all(|c| c >= 0.0));
    }

    #[test]
    fn rejects_zero_cells() {
        let cfg = SampleConfig { cells: 0, ..config() };
        assert_eq!(generate_sample(&cfg).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn written_sample_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        let s = generate_sample(&config()).unwrap();
        write_series_csv(&path, &s.series).unwrap();

        let ingest = load_tracer_series(&path, b';').unwrap();
        assert_eq!(ingest.series.len(), s.series.len());
        assert!(ingest.row_errors.is_empty());
    }
}
