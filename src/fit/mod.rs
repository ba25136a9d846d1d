//! Model fitting.
//!
//! Responsibilities:
//!
//! - fit the tanks-in-series model to the raw tracer series (Nelder–Mead)
//! - report the integer cell count, inlet concentration and solver diagnostics

pub mod cells;

pub use cells::*;
