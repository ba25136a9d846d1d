//! Input/output helpers.
//!
//! - tracer table ingest + validation (`ingest`)
//! - apparatus configuration (`apparatus`)
//! - result exports (CSV/JSON) (`export`)
//! - model curve JSON read/write (`curve`)

pub mod apparatus;
pub mod curve;
pub mod export;
pub mod ingest;

pub use apparatus::*;
pub use curve::*;
pub use export::*;
pub use ingest::*;
