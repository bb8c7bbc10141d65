//! Efficiency, purity and cross-section estimation.
//!
//! Runs once, after every dataset's counters are frozen. Everything here is a
//! pure function of those counters and the luminosity.

pub mod table;
pub mod xsec;

pub use table::*;
pub use xsec::*;
