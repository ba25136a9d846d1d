//! Export analysis results.
//!
//! - per-point CSV (observed vs fitted response), easy to open in spreadsheets
//! - JSON summary of the full `AnalysisReport`

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{AnalysisReport, PointFit};
use crate::error::AppError;

/// Write per-point results to a CSV file.
pub fn write_points_csv(path: &Path, fits: &[PointFit]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "t,Cind,theta,psi,c_fit,residual")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for f in fits {
        writeln!(
            file,
            "{},{},{:.10},{:.10},{:.10},{:.10}",
            f.point.t, f.point.concentration, f.theta, f.psi, f.c_fit, f.residual,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the analysis summary as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &AnalysisReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TracerPoint;

    #[test]
    fn points_csv_has_header_and_one_row_per_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        let fits = vec![
            PointFit {
                point: TracerPoint { t: 0.0, concentration: 0.0 },
                theta: 0.0,
                psi: 0.0,
                c_fit: 0.0,
                residual: 0.0,
            },
            PointFit {
                point: TracerPoint { t: 1.5, concentration: 2.0 },
                theta: 0.5,
                psi: 4.0,
                c_fit: 1.75,
                residual: 0.25,
            },
        ];
        write_points_csv(&path, &fits).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "t,Cind,theta,psi,c_fit,residual");
        assert!(lines[2].starts_with("1.5,2,0.5000000000,4.0000000000"));
    }

    #[test]
    fn export_to_missing_directory_fails_with_io_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("points.csv");
        let err = write_points_csv(&path, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
