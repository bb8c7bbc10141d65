//! Fixed-binning histograms and the histogram book.

use std::collections::BTreeMap;

use crate::hist::{HistSlot, HistogramSink, TOP_MASS};

/// A weighted 1D histogram with uniform bins on `[lo, hi)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D {
    pub lo: f64,
    pub hi: f64,
    pub bins: Vec<f64>,
    pub underflow: f64,
    pub overflow: f64,
    /// Number of fills (unweighted).
    pub entries: u64,
}

/// Weighted content of a histogram window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    pub lo: f64,
    pub hi: f64,
    pub sum_weights: f64,
    pub mean: f64,
    pub rms: f64,
}

impl Histogram1D {
    pub fn new(n_bins: usize, lo: f64, hi: f64) -> Self {
        Self {
            lo,
            hi,
            bins: vec![0.0; n_bins.max(1)],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    pub fn bin_width(&self) -> f64 {
        (self.hi - self.lo) / self.bins.len() as f64
    }

    pub fn bin_center(&self, idx: usize) -> f64 {
        self.lo + (idx as f64 + 0.5) * self.bin_width()
    }

    pub fn fill(&mut self, value: f64, weight: f64) {
        self.entries += 1;
        if value.is_nan() {
            return;
        }
        if value < self.lo {
            self.underflow += weight;
        } else if value >= self.hi {
            self.overflow += weight;
        } else {
            let idx = ((value - self.lo) / self.bin_width()) as usize;
            let idx = idx.min(self.bins.len() - 1);
            self.bins[idx] += weight;
        }
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Add another histogram with identical binning.
    ///
    /// Returns `false` (and leaves `self` untouched) when the binning differs.
    pub fn merge(&mut self, other: &Histogram1D) -> bool {
        if self.bins.len() != other.bins.len() || self.lo != other.lo || self.hi != other.hi {
            return false;
        }
        for (a, b) in self.bins.iter_mut().zip(&other.bins) {
            *a += b;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.entries += other.entries;
        true
    }

    /// Weighted mean and RMS of bin centers whose center lies in `[lo, hi]`.
    ///
    /// Returns `None` when the window holds no positive weight.
    pub fn window_summary(&self, lo: f64, hi: f64) -> Option<WindowSummary> {
        let mut sw = 0.0;
        let mut swx = 0.0;
        let mut swxx = 0.0;
        for (idx, &w) in self.bins.iter().enumerate() {
            let x = self.bin_center(idx);
            if x < lo || x > hi {
                continue;
            }
            sw += w;
            swx += w * x;
            swxx += w * x * x;
        }
        if !(sw > 0.0) {
            return None;
        }
        let mean = swx / sw;
        let var = (swxx / sw - mean * mean).max(0.0);
        Some(WindowSummary {
            lo,
            hi,
            sum_weights: sw,
            mean,
            rms: var.sqrt(),
        })
    }
}

/// Default binning `(n_bins, lo, hi)` for a variable name.
pub fn default_binning(variable: &str) -> (usize, f64, f64) {
    if variable == TOP_MASS {
        (120, 0.0, 300.0)
    } else if variable.ends_with("_number") {
        (11, -0.5, 10.5)
    } else if variable.ends_with("_pt") {
        (60, 0.0, 300.0)
    } else if variable.ends_with("_eta") {
        (50, -5.0, 5.0)
    } else if variable.ends_with("_phi") {
        (40, -3.2, 3.2)
    } else {
        (100, 0.0, 500.0)
    }
}

/// In-memory sink: books one `Histogram1D` per slot on first fill.
#[derive(Debug, Clone, Default)]
pub struct HistogramBook {
    hists: BTreeMap<HistSlot, Histogram1D>,
}

impl HistogramBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: &HistSlot) -> Option<&Histogram1D> {
        self.hists.get(slot)
    }

    pub fn top_mass(&self) -> Option<&Histogram1D> {
        self.get(&HistSlot::top_mass())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HistSlot, &Histogram1D)> {
        self.hists.iter()
    }

    pub fn merge(&mut self, other: &HistogramBook) {
        for (slot, hist) in &other.hists {
            match self.hists.get_mut(slot) {
                Some(mine) => {
                    if !mine.merge(hist) {
                        tracing::warn!(slot = ?slot, "histogram binning mismatch; merge skipped");
                    }
                }
                None => {
                    self.hists.insert(*slot, hist.clone());
                }
            }
        }
    }
}

impl HistogramSink for HistogramBook {
    fn fill(&mut self, slot: &HistSlot, value: f64, weight: f64) {
        self.hists
            .entry(*slot)
            .or_insert_with(|| {
                let (n, lo, hi) = default_binning(slot.variable);
                Histogram1D::new(n, lo, hi)
            })
            .fill(value, weight);
    }
}
