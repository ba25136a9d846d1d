//! Tracer table ingest.
//!
//! Turns a delimited text file with a header row into a validated
//! `TracerSeries`.
//!
//! Design goals:
//! - **Strict schema**: `t` and `Cind` columns are required (exit code 2)
//! - **Row-level validation**: bad rows are skipped and reported
//! - **No analysis here**: ingest only parses and validates

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{TracerPoint, TracerSeries};
use crate::error::AppError;

/// Header names are matched case-insensitively.
const COL_TIME: &str = "t";
const COL_CONCENTRATION: &str = "cind";

/// Summary stats about the samples actually used.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_points: usize,
    pub t_min: f64,
    pub t_max: f64,
    pub c_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated series + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub series: TracerSeries,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a tracer table from `path`.
pub fn load_tracer_series(path: &Path, delimiter: u8) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open tracer table '{}': {e}", path.display())))?;
    read_tracer_series(file, delimiter)
}

/// Parse a tracer table from any reader.
pub fn read_tracer_series<R: Read>(input: R, delimiter: u8) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read table headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let t_idx = column(&header_map, COL_TIME, "t")?;
    let c_idx = column(&header_map, COL_CONCENTRATION, "Cind")?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line, lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, t_idx, c_idx) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in &row_errors {
        log::warn!("skipping line {}: {}", e.line, e.message);
    }

    if points.is_empty() {
        return Err(AppError::new(3, "No valid tracer samples in the table."));
    }

    let stats = compute_stats(&points);
    let series = TracerSeries::new(points)?;

    log::info!(
        "ingest: {} of {} rows used, t=[{:.3}, {:.3}]",
        stats.n_points,
        rows_read,
        stats.t_min,
        stats.t_max
    );

    Ok(IngestedData {
        series,
        stats,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn column(header_map: &HashMap<String, usize>, key: &str, display: &str) -> Result<usize, AppError> {
    header_map
        .get(key)
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{display}`")))
}

fn parse_row(record: &StringRecord, t_idx: usize, c_idx: usize) -> Result<TracerPoint, String> {
    let t = parse_value(record, t_idx, "t")?;
    let concentration = parse_value(record, c_idx, "Cind")?;
    if t < 0.0 {
        return Err(format!("negative `t` value {t}"));
    }
    if concentration < 0.0 {
        return Err(format!("negative `Cind` value {concentration}"));
    }
    Ok(TracerPoint { t, concentration })
}

fn parse_value(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing `{name}` value"))?;
    // Decimal commas are common in `;`-delimited exports.
    let v = raw
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| format!("invalid `{name}` value '{raw}'"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("non-finite `{name}` value '{raw}'"))
    }
}

fn compute_stats(points: &[TracerPoint]) -> DatasetStats {
    let mut t_min = f64::INFINITY;
    let mut t_max = f64::NEG_INFINITY;
    let mut c_max = f64::NEG_INFINITY;
    for p in points {
        t_min = t_min.min(p.t);
        t_max = t_max.max(p.t);
        c_max = c_max.max(p.concentration);
    }
    DatasetStats {
        n_points: points.len(),
        t_min,
        t_max,
        c_max,
    }
}
