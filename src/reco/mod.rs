//! Top-quark pair reconstruction.
//!
//! Responsibilities:
//!
//! - recover the neutrino `pz` from the W-mass constraint (`neutrino`)
//! - enumerate jet assignments within the configured jet-count bounds (`assignments`)
//! - evaluate every assignment (parallel) and keep the best mass match (`reconstructor`)

pub mod assignments;
pub mod neutrino;
pub mod reconstructor;

pub use assignments::*;
pub use neutrino::*;
pub use reconstructor::*;
