//! Input/output helpers.
//!
//! - event sources (`events`)
//! - analysis-config JSON (`config`)
//! - frozen counters JSON (`counters`)
//! - CSV exports (`export`)

pub mod config;
pub mod counters;
pub mod events;
pub mod export;

pub use config::*;
pub use counters::*;
pub use events::*;
pub use export::*;
