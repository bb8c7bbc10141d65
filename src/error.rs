//! Error types.
//!
//! `AppError` is the application-level error carried up to `main` (message +
//! process exit code). The estimator has its own typed error so that
//! statistically degenerate inputs are distinguishable from I/O or config
//! problems by callers and tests.

use thiserror::Error;

use crate::domain::DatasetRole;
use crate::selection::Stage;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of the efficiency / purity / cross-section computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimateError {
    /// A denominator (total weight, luminosity × efficiency, ...) is zero.
    #[error("zero denominator for {quantity} at stage '{}'", stage.name())]
    ZeroDenominator { quantity: &'static str, stage: Stage },

    /// Counters that cannot come from one consistent selection.
    #[error("malformed counters at stage '{}': selected={selected}, total={total}", stage.name())]
    MalformedCounters { stage: Stage, selected: f64, total: f64 },

    /// No dataset with the given role contributed to the estimate.
    #[error("no {0} dataset available")]
    MissingRole(DatasetRole),

    #[error("invalid luminosity: value={value}, uncertainty={uncertainty}")]
    InvalidLuminosity { value: f64, uncertainty: f64 },
}

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        let code = match err {
            EstimateError::MissingRole(_) => 3,
            EstimateError::InvalidLuminosity { .. } => 2,
            _ => 4,
        };
        AppError::new(code, format!("Estimate failed: {err}"))
    }
}
