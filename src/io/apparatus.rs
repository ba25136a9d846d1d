//! Apparatus configuration loading.
//!
//! Precedence, lowest first:
//!
//! 1. built-in defaults (`ApparatusParams::default()`)
//! 2. a JSON file (`--apparatus`, or `RTD_APPARATUS` from the environment / `.env`)
//! 3. per-field CLI overrides
//!
//! Missing keys in the JSON file keep their defaults.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::ApparatusParams;
use crate::error::AppError;

/// Environment variable naming the apparatus JSON file.
pub const APPARATUS_ENV: &str = "RTD_APPARATUS";

/// Per-field overrides applied after the file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApparatusOverrides {
    pub length: Option<f64>,
    pub diameter: Option<f64>,
    pub flow_rate: Option<f64>,
    pub tracer_mass: Option<f64>,
    pub void_fraction: Option<f64>,
}

impl ApparatusOverrides {
    pub fn apply(&self, params: &mut ApparatusParams) {
        if let Some(v) = self.length {
            params.length = v;
        }
        if let Some(v) = self.diameter {
            params.diameter = v;
        }
        if let Some(v) = self.flow_rate {
            params.flow_rate = v;
        }
        if let Some(v) = self.tracer_mass {
            params.tracer_mass = v;
        }
        if let Some(v) = self.void_fraction {
            params.void_fraction = v;
        }
    }
}

/// Read apparatus parameters from a JSON file.
pub fn read_apparatus_json(path: &Path) -> Result<ApparatusParams, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open apparatus JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid apparatus JSON: {e}")))
}

/// Resolve the apparatus parameters for a run.
///
/// An explicit `path` wins over `RTD_APPARATUS`; with neither, defaults are used.
pub fn resolve_apparatus(path: Option<&Path>, overrides: &ApparatusOverrides) -> Result<ApparatusParams, AppError> {
    dotenvy::dotenv().ok();

    let source: Option<PathBuf> = match path {
        Some(p) => Some(p.to_path_buf()),
        None => std::env::var_os(APPARATUS_ENV).map(PathBuf::from),
    };

    let mut params = match &source {
        Some(p) => {
            log::info!("apparatus: loading {}", p.display());
            read_apparatus_json(p)?
        }
        None => {
            log::debug!("apparatus: using built-in defaults");
            ApparatusParams::default()
        }
    };
    overrides.apply(&mut params);
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column.json");
        let mut f = File::create(&path).unwrap();
        writeln!(f, r#"{{ "L": 10.0, "gamma": 0.5 }}"#).unwrap();

        let params = read_apparatus_json(&path).unwrap();
        assert_eq!(params.length, 10.0);
        assert_eq!(params.void_fraction, 0.5);
        assert_eq!(params.diameter, ApparatusParams::default().diameter);
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column.json");
        std::fs::write(&path, r#"{ "Q": 0.5, "w": 0.002 }"#).unwrap();

        let overrides = ApparatusOverrides {
            flow_rate: Some(0.004),
            ..ApparatusOverrides::default()
        };
        let params = resolve_apparatus(Some(&path), &overrides).unwrap();
        assert_eq!(params.tracer_mass, 0.5);
        assert_eq!(params.flow_rate, 0.004);
    }

    #[test]
    fn malformed_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(read_apparatus_json(&path).unwrap_err().exit_code(), 2);
    }
}
