//! Read/write model curve JSON files.
//!
//! A curve file carries the fitted tanks-in-series model on a regular time
//! grid: the outlet response plus the closed-form profile of every cell.
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{ApparatusConstants, CellFit, CurveFile, CurveGrid};
use crate::error::AppError;
use crate::models::{cell_profile, fit_response};

/// Build the curve for a fit over `[0, t_end]` with `n` grid points.
pub fn build_curve(apparatus: &ApparatusConstants, fit: &CellFit, t_end: f64, n: usize) -> CurveFile {
    let n = n.max(2);
    let t_end = if t_end.is_finite() && t_end > 0.0 {
        t_end
    } else {
        // No usable time span: show three residence times.
        3.0 * apparatus.tau
    };

    let cells = fit.n.max(1);
    let tau_cell = apparatus.tau / f64::from(cells);
    let c0 = fit.inlet_concentration;

    let t: Vec<f64> = (0..n).map(|i| t_end * i as f64 / (n as f64 - 1.0)).collect();
    let outlet = t
        .iter()
        .map(|&ti| fit_response(ti, apparatus.tau, f64::from(cells), c0).unwrap_or(0.0))
        .collect();
    let profiles = (1..=cells)
        .map(|j| t.iter().map(|&ti| cell_profile(ti, tau_cell, j, c0)).collect())
        .collect();

    CurveFile {
        tool: "rtd".to_string(),
        apparatus: *apparatus,
        cells,
        inlet_concentration: c0,
        grid: CurveGrid {
            t,
            outlet,
            cells: profiles,
        },
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}
