//! Histogram filling.
//!
//! The analysis core only talks to a `HistogramSink`: a consumer of
//! `(slot, value, weight)` triples. Binning, rendering and persistence belong
//! to whoever implements the sink. `HistogramBook` is the in-process
//! implementation used by the CLI and the tests.

pub mod book;
pub mod observables;

pub use book::*;
pub use observables::*;

use crate::selection::Stage;

/// Name of the terminal top-mass histogram variable.
pub const TOP_MASS: &str = "top_mass";

/// Address of one histogram: a selection stage (or none, for the top mass) and a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistSlot {
    pub stage: Option<Stage>,
    pub variable: &'static str,
}

impl HistSlot {
    pub const fn at(stage: Stage, variable: &'static str) -> Self {
        Self {
            stage: Some(stage),
            variable,
        }
    }

    pub const fn top_mass() -> Self {
        Self {
            stage: None,
            variable: TOP_MASS,
        }
    }

    /// Flat name, e.g. `met/jet1_pt` or `top_mass`.
    pub fn key(&self) -> String {
        match self.stage {
            Some(stage) => format!("{}/{}", stage.name(), self.variable),
            None => self.variable.to_string(),
        }
    }
}

/// Consumer of histogram fills.
pub trait HistogramSink {
    fn fill(&mut self, slot: &HistSlot, value: f64, weight: f64);
}

/// A sink that discards everything (counter-only runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl HistogramSink for NullSink {
    fn fill(&mut self, _slot: &HistSlot, _value: f64, _weight: f64) {}
}

impl<S: HistogramSink + ?Sized> HistogramSink for &mut S {
    fn fill(&mut self, slot: &HistSlot, value: f64, weight: f64) {
        (**self).fill(slot, value, weight);
    }
}
