//! RTD analysis engine.
//!
//! Stages, leaf-first:
//!
//! - `moments`: dimensionless transform and raw moments `α1..α4`
//! - `statistics`: mode, modal density, variance, skewness, kurtosis
//! - `peclet`: nine Péclet estimators, weighted averages, dispersion coefficients
//! - `simplified`: closed-form cell count from quadrature moments
//!
//! The tanks-in-series fit lives in `crate::fit`. Every stage is a pure function
//! of the series and the apparatus constants.

pub mod moments;
pub mod peclet;
pub mod simplified;
pub mod statistics;

pub use moments::*;
pub use peclet::*;
pub use simplified::*;
pub use statistics::*;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::{ApparatusConstants, ApparatusParams};

    /// Default column with the residence time overridden.
    pub fn apparatus_with_tau(tau: f64) -> ApparatusConstants {
        ApparatusConstants {
            tau,
            ..ApparatusConstants::derive(&ApparatusParams::default()).unwrap()
        }
    }
}
