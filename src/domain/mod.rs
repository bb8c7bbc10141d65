//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the physics object model (`FourMomentum`, `Jet`, `Muon`, `MissingEt`, `PhysicsEvent`)
//! - dataset roles (`DatasetRole`)
//! - run configuration (`AnalysisConfig`, `SelectionConfig`, `ReconstructionConfig`, ...)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
