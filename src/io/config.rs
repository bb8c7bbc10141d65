//! Analysis configuration loading.
//!
//! The configuration is a JSON document deserialized into `AnalysisConfig`.
//! Relative dataset paths are resolved against `TTX_DATA_DIR` when it is set
//! (the environment or a `.env` file), else against the config file's directory.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::AnalysisConfig;
use crate::error::AppError;

/// Environment variable naming the directory of the event files.
pub const DATA_DIR_VAR: &str = "TTX_DATA_DIR";

/// Read, resolve and validate an analysis configuration.
pub fn read_analysis_config(path: &Path) -> Result<AnalysisConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open config '{}': {e}", path.display())))?;
    let mut config: AnalysisConfig = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))?;

    let base = data_dir_from_env().unwrap_or_else(|| {
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });
    resolve_dataset_paths(&mut config, &base);

    config.validate()?;
    Ok(config)
}

/// Write a configuration as pretty JSON.
pub fn write_analysis_config(path: &Path, config: &AnalysisConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create config '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, config)
        .map_err(|e| AppError::new(2, format!("Failed to write config JSON: {e}")))?;
    Ok(())
}

fn data_dir_from_env() -> Option<PathBuf> {
    dotenvy::dotenv().ok();
    std::env::var_os(DATA_DIR_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Make every relative dataset path relative to `base`.
pub fn resolve_dataset_paths(config: &mut AnalysisConfig, base: &Path) {
    for ds in &mut config.datasets {
        if ds.path.is_relative() {
            ds.path = base.join(&ds.path);
        }
    }
}
