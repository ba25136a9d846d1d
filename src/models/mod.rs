//! Tanks-in-series model implementations.
//!
//! Models are implemented as small, pure functions so that fitting and export
//! code can stay generic.

pub mod cells;

pub use cells::*;
