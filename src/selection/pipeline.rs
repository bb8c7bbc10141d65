//! The selection cascade for one dataset.
//!
//! Stages run in a fixed order and short-circuit on the first failure:
//!
//! trigger -> n_jets -> n_muon -> n_b_jets -> met -> top reconstruction
//!
//! The counter of stage `k` is incremented exactly when stages `1..k` all
//! passed; `no_cuts` counts every event. Because each stage's counter is only
//! touched on the straight-line path after its predicate, a later counter
//! cannot move without the earlier ones.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{DatasetRole, PhysicsEvent, SelectionConfig};
use crate::error::AppError;
use crate::hist::{HistSlot, HistogramBook, HistogramSink, fill_observables};
use crate::reco::{RecoFailure, RecoOutcome, Reconstruction, TopReconstructor};
use crate::selection::cuts::{leading_muon, passes_b_jet_count, passes_jet_count, passes_met, passes_trigger};
use crate::selection::{SelectionCounters, Stage};

/// Reconstruction bookkeeping for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoDiagnostics {
    pub attempted: u64,
    pub reconstructed: u64,
    pub too_few_jets: u64,
    pub no_neutrino_solution: u64,
    pub mass_difference_too_large: u64,
    pub candidates_evaluated: u64,
    /// Summed weight of reconstructed events (the top-mass histogram integral incl. overflow).
    pub reconstructed_weight: f64,
}

impl RecoDiagnostics {
    pub fn record(&mut self, reco: &Reconstruction, weight: f64) {
        self.attempted += 1;
        self.candidates_evaluated += reco.candidates_evaluated as u64;
        match &reco.outcome {
            RecoOutcome::Reconstructed(_) => {
                self.reconstructed += 1;
                self.reconstructed_weight += weight;
            }
            RecoOutcome::NotReconstructed(RecoFailure::TooFewJets { .. }) => self.too_few_jets += 1,
            RecoOutcome::NotReconstructed(RecoFailure::NoNeutrinoSolution) => self.no_neutrino_solution += 1,
            RecoOutcome::NotReconstructed(RecoFailure::MassDifferenceTooLarge { .. }) => {
                self.mass_difference_too_large += 1
            }
        }
    }

    pub fn failed(&self) -> u64 {
        self.too_few_jets + self.no_neutrino_solution + self.mass_difference_too_large
    }

    pub fn merge(&mut self, other: &RecoDiagnostics) {
        self.attempted += other.attempted;
        self.reconstructed += other.reconstructed;
        self.too_few_jets += other.too_few_jets;
        self.no_neutrino_solution += other.no_neutrino_solution;
        self.mass_difference_too_large += other.mass_difference_too_large;
        self.candidates_evaluated += other.candidates_evaluated;
        self.reconstructed_weight += other.reconstructed_weight;
    }
}

/// Everything one dataset's run accumulates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetAccumulator {
    pub counters: SelectionCounters,
    pub reco: RecoDiagnostics,
}

impl DatasetAccumulator {
    pub fn merge(&mut self, other: &DatasetAccumulator) {
        self.counters.merge(&other.counters);
        self.reco.merge(&other.reco);
    }

    pub fn into_summary(self, name: impl Into<String>, role: DatasetRole) -> DatasetSummary {
        DatasetSummary {
            name: name.into(),
            role,
            counters: self.counters,
            reco: self.reco,
        }
    }
}

/// Frozen result of one dataset's run; what the estimator and the counters file consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub role: DatasetRole,
    pub counters: SelectionCounters,
    #[serde(default)]
    pub reco: RecoDiagnostics,
}

/// Cut cascade + reconstructor + the accumulator of a single dataset run.
#[derive(Debug, Clone)]
pub struct SelectionPipeline {
    config: SelectionConfig,
    reconstructor: TopReconstructor,
    acc: DatasetAccumulator,
}

impl SelectionPipeline {
    pub fn new(config: SelectionConfig, reconstructor: TopReconstructor) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            config,
            reconstructor,
            acc: DatasetAccumulator::default(),
        })
    }

    pub fn counters(&self) -> &SelectionCounters {
        &self.acc.counters
    }

    pub fn diagnostics(&self) -> &RecoDiagnostics {
        &self.acc.reco
    }

    /// Same configuration, empty accumulator.
    pub fn fork(&self) -> Self {
        Self {
            config: self.config.clone(),
            reconstructor: self.reconstructor.clone(),
            acc: DatasetAccumulator::default(),
        }
    }

    /// Finish the run and hand back what was accumulated.
    pub fn finish(self) -> DatasetAccumulator {
        self.acc
    }

    /// Run one event through the cascade.
    pub fn process<S: HistogramSink + ?Sized>(&mut self, event: &mut PhysicsEvent, sink: &mut S) {
        let cfg = &self.config;
        let counters = &mut self.acc.counters;

        record(counters, Stage::NoCuts, event, sink);

        if !passes_trigger(cfg, event) {
            return;
        }
        record(counters, Stage::Trigger, event, sink);

        if !passes_jet_count(cfg, event) {
            return;
        }
        record(counters, Stage::JetCount, event, sink);

        let Some(muon) = leading_muon(cfg, event) else {
            return;
        };
        record(counters, Stage::MuonCount, event, sink);

        if !passes_b_jet_count(cfg, event) {
            return;
        }
        record(counters, Stage::BJetCount, event, sink);

        if !passes_met(cfg, event) {
            return;
        }
        record(counters, Stage::Met, event, sink);

        let reco = self.reconstructor.reconstruct(&event.jets, &event.met, &muon);
        self.acc.reco.record(&reco, event.weight);
        match reco.outcome {
            RecoOutcome::Reconstructed(candidate) => {
                event.top_mass = Some(candidate.mass);
                sink.fill(&HistSlot::top_mass(), candidate.mass, event.weight);
            }
            RecoOutcome::NotReconstructed(failure) => {
                tracing::trace!(reason = failure.kind(), "event not reconstructed");
            }
        }
    }

    /// Process a batch of events in parallel.
    ///
    /// Each worker accumulates into its own counters and histograms; the
    /// partial results are merged afterwards, so no counter is shared between
    /// threads. Reconstructed masses are written back into `events`.
    ///
    /// Raw event counts match sequential processing exactly; weighted sums
    /// match up to floating-point rounding, since the merge order varies.
    pub fn process_batch(&mut self, events: &mut [PhysicsEvent], book: &mut HistogramBook) {
        let (acc, batch_book) = events
            .par_iter_mut()
            .fold(
                || (self.fork(), HistogramBook::new()),
                |(mut worker, mut worker_book), event| {
                    worker.process(event, &mut worker_book);
                    (worker, worker_book)
                },
            )
            .map(|(worker, worker_book)| (worker.finish(), worker_book))
            .reduce(
                || (DatasetAccumulator::default(), HistogramBook::new()),
                |(mut a, mut a_book), (b, b_book)| {
                    a.merge(&b);
                    a_book.merge(&b_book);
                    (a, a_book)
                },
            );
        self.acc.merge(&acc);
        book.merge(&batch_book);
    }
}

fn record<S: HistogramSink + ?Sized>(counters: &mut SelectionCounters, stage: Stage, event: &PhysicsEvent, sink: &mut S) {
    counters.increment(stage, event.weight);
    fill_observables(stage, event, sink);
}
