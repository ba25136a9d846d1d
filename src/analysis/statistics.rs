//! Shape statistics of the RTD: mode, modal density, variance, skewness, kurtosis.

use crate::analysis::moments::Dimensionless;
use crate::domain::{Moments, Statistics};
use crate::error::{AnalysisError, AnalysisResult};

/// Variances within this many ulps of `max(|alpha2|, 1)` are cancellation residue.
const VARIANCE_ULPS: f64 = 64.0;

/// Derive the shape statistics from the dimensionless series and its moments.
///
/// Fails with `DegenerateInput` when the variance is not strictly positive
/// (at or below rounding noise relative to `alpha2`),
/// before skewness and kurtosis are formed.
pub fn calculate_statistics(dimless: &Dimensionless, moments: &Moments) -> AnalysisResult<Statistics> {
    let Moments {
        alpha1: a1,
        alpha2: a2,
        alpha3: a3,
        alpha4: a4,
    } = *moments;

    let peak = dimless.peak_index();
    let mode = dimless.theta[peak];
    let modal_density = dimless.psi[peak];

    let variance = a2 - a1 * a1;
    let floor = VARIANCE_ULPS * f64::EPSILON * a2.abs().max(1.0);
    if !(variance.is_finite() && variance > floor) {
        return Err(AnalysisError::degenerate(
            "statistics",
            format!("variance alpha2 - alpha1^2 = {variance} must be > 0 for skewness/kurtosis"),
        ));
    }

    let skewness = (a3 - 3.0 * a1 * a2 + 2.0 * a1.powi(3)) / variance.powf(1.5);
    let kurtosis = (a4 - 4.0 * a3 * a1 + 6.0 * a2 * a1 * a1 - 3.0 * a1.powi(4)) / (variance * variance);

    Ok(Statistics {
        mode,
        modal_density,
        variance,
        skewness,
        kurtosis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::moments::moments_of;
    use crate::analysis::test_support::apparatus_with_tau;
    use crate::domain::{ApparatusConstants, ApparatusParams, TracerSeries};

    #[test]
    fn hand_computed_statistics() {
        let series =
            TracerSeries::from_columns(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 2.0, 5.0, 3.0, 1.0]).unwrap();
        let apparatus = apparatus_with_tau(2.0);
        let dimless = Dimensionless::new(&series, &apparatus);
        let m = moments_of(&dimless).unwrap();
        let s = calculate_statistics(&dimless, &m).unwrap();

        assert_eq!(s.mode, 1.0);
        assert!((s.modal_density - 5.0 * apparatus.psi_scale()).abs() < 1e-15);
        let mean = 12.5 / 11.0;
        let var = 16.25 / 11.0 - mean * mean;
        assert!((s.variance - var).abs() < 1e-12);
        assert!(s.skewness.is_finite() && s.kurtosis.is_finite());
        assert!(s.kurtosis > 0.0);
    }

    #[test]
    fn exponential_moments_give_known_shape() {
        // Exponential RTD: alpha_k = k!, skewness 2, kurtosis 9.
        let series = TracerSeries::from_columns(&[0.0, 1.0], &[1.0, 0.5]).unwrap();
        let dimless = Dimensionless::new(&series, &apparatus_with_tau(1.0));
        let m = Moments {
            alpha1: 1.0,
            alpha2: 2.0,
            alpha3: 6.0,
            alpha4: 24.0,
        };
        let s = calculate_statistics(&dimless, &m).unwrap();
        assert!((s.variance - 1.0).abs() < 1e-12);
        assert!((s.skewness - 2.0).abs() < 1e-12);
        assert!((s.kurtosis - 9.0).abs() < 1e-12);
    }

    #[test]
    fn single_spike_has_zero_variance() {
        let series = TracerSeries::from_columns(&[0.0, 1.0, 2.0], &[0.0, 4.0, 0.0]).unwrap();
        let dimless = Dimensionless::new(&series, &apparatus_with_tau(1.0));
        let m = moments_of(&dimless).unwrap();
        let err = calculate_statistics(&dimless, &m).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn spike_at_any_time_has_zero_variance() {
        let apparatus = ApparatusConstants::derive(&ApparatusParams::default()).unwrap();
        for i in 1..200 {
            let t = 0.37 * i as f64;
            let series = TracerSeries::from_columns(&[0.0, t, t + 1.0], &[0.0, 3.7, 0.0]).unwrap();
            let dimless = Dimensionless::new(&series, &apparatus);
            let m = moments_of(&dimless).unwrap();
            let err = calculate_statistics(&dimless, &m).unwrap_err();
            assert!(err.is_degenerate(), "t = {t}");
        }
    }

    #[test]
    fn small_real_variance_is_kept() {
        let series = TracerSeries::from_columns(&[0.0, 1.0], &[1.0, 1.0]).unwrap();
        let dimless = Dimensionless::new(&series, &apparatus_with_tau(1.0));
        let m = Moments {
            alpha1: 1.0,
            alpha2: 1.001,
            alpha3: 1.003,
            alpha4: 1.006,
        };
        let s = calculate_statistics(&dimless, &m).unwrap();
        assert!((s.variance - 0.001).abs() < 1e-12);
    }

    #[test]
    fn negative_variance_is_degenerate() {
        let series = TracerSeries::from_columns(&[0.0, 1.0], &[1.0, 1.0]).unwrap();
        let dimless = Dimensionless::new(&series, &apparatus_with_tau(1.0));
        let m = Moments {
            alpha1: 2.0,
            alpha2: 3.0,
            alpha3: 1.0,
            alpha4: 1.0,
        };
        assert!(calculate_statistics(&dimless, &m).is_err());
    }
}
