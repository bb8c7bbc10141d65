//! Frozen counters file.
//!
//! The counters JSON is the portable result of a `ttx run`: every dataset's
//! role, weighted stage counters and reconstruction diagnostics, plus the
//! luminosity used. `ttx estimate` rebuilds the cross-section table from it
//! without rereading any events.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::LuminosityConfig;
use crate::error::AppError;
use crate::selection::DatasetSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountersFile {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub luminosity: LuminosityConfig,
    #[serde(default)]
    pub reference_xs: Option<f64>,
    pub datasets: Vec<DatasetSummary>,
}

impl CountersFile {
    pub fn new(datasets: Vec<DatasetSummary>, luminosity: LuminosityConfig, reference_xs: Option<f64>) -> Self {
        Self {
            tool: "ttx".to_string(),
            created_at: Utc::now(),
            luminosity,
            reference_xs,
            datasets,
        }
    }
}

pub fn write_counters_json(path: &Path, file: &CountersFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create counters JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write counters JSON: {e}")))?;
    Ok(())
}

pub fn read_counters_json(path: &Path) -> Result<CountersFile, AppError> {
    let input = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open counters JSON '{}': {e}", path.display())))?;
    let file: CountersFile =
        serde_json::from_reader(input).map_err(|e| AppError::new(2, format!("Invalid counters JSON: {e}")))?;

    for ds in &file.datasets {
        if !ds.counters.is_monotone() {
            return Err(AppError::new(
                2,
                format!("Counters of dataset '{}' are not monotone in stage order.", ds.name),
            ));
        }
    }
    Ok(file)
}
