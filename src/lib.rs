//! `rtd-analysis` library crate.
//!
//! The binary (`rtd`) is a thin wrapper around this library so that:
//!
//! - the analysis engine is testable without spawning processes
//! - the stages are reusable from other front ends

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
