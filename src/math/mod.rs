//! Math utilities used by the reconstruction.
//!
//! - Lorentz-vector sums, invariant masses and boosts (`lorentz`)

pub mod lorentz;

pub use lorentz::*;
