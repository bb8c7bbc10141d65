//! `ttbar-xs` library crate.
//!
//! The binary (`ttx`) is a thin wrapper around this library so that:
//!
//! - the selection, reconstruction and estimation are testable without spawning processes
//! - the event-source and histogram seams can be driven from other front-ends

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod estimate;
pub mod hist;
pub mod io;
pub mod math;
pub mod reco;
pub mod report;
pub mod selection;
