//! Reporting: formatted terminal output of the analysis results.
//!
//! Formatting lives in one place so that the selection and estimation code
//! stays free of presentation concerns.

pub mod format;

pub use format::*;
