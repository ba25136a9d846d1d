//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the tracer series and apparatus constants (`TracerSeries`, `ApparatusConstants`)
//! - the result records of every analysis stage (`Moments`, `PecletResult`, `CellFit`, ...)
//! - run configuration and export schemas (`AnalysisConfig`, `CurveFile`)

pub mod types;

pub use types::*;
