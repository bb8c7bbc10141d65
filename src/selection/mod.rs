//! Event selection.
//!
//! Responsibilities:
//!
//! - the fixed stage order of the cut cascade (`stage`)
//! - per-stage predicates (`cuts`)
//! - weighted per-stage counters (`counters`)
//! - the per-dataset pipeline that drives cuts, histogram fills and the
//!   top reconstruction (`pipeline`)

pub mod counters;
pub mod cuts;
pub mod pipeline;
pub mod stage;

pub use counters::*;
pub use pipeline::*;
pub use stage::*;
