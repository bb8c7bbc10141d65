//! Multi-dataset run orchestration shared by `ttx run` and `ttx demo`.
//!
//! datasets (parallel) -> per-dataset selection + reconstruction -> join -> estimate
//!
//! Each dataset owns its pipeline, counters and histograms for exactly the
//! duration of its run. The estimator only starts after every dataset has
//! been collected.

use std::time::Instant;

use rayon::prelude::*;

use crate::domain::{AnalysisConfig, DatasetRole, DatasetSpec, PhysicsEvent};
use crate::error::{AppError, EstimateError};
use crate::estimate::{Luminosity, RoleCounters, StageTable};
use crate::hist::HistogramBook;
use crate::io::{EventSource, JsonLinesSource};
use crate::reco::TopReconstructor;
use crate::selection::{DatasetSummary, SelectionPipeline, Stage};

/// Outputs of one dataset's run.
#[derive(Debug, Clone)]
pub struct DatasetRun {
    pub summary: DatasetSummary,
    pub book: HistogramBook,
}

/// All computed outputs of a `ttx run`.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// In configuration order.
    pub datasets: Vec<DatasetRun>,
    pub table: Result<StageTable, EstimateError>,
}

impl AnalysisOutput {
    pub fn summaries(&self) -> Vec<DatasetSummary> {
        self.datasets.iter().map(|d| d.summary.clone()).collect()
    }

    /// Histograms of every dataset with `role`, merged.
    pub fn merged_book(&self, role: DatasetRole) -> HistogramBook {
        let mut book = HistogramBook::new();
        for run in self.datasets.iter().filter(|d| d.summary.role == role) {
            book.merge(&run.book);
        }
        book
    }
}

/// Run every configured dataset from its JSON-lines file.
pub fn run_analysis(config: &AnalysisConfig, batch_size: usize) -> Result<AnalysisOutput, AppError> {
    run_with_sources(config, batch_size, |spec| {
        let source = JsonLinesSource::open(&spec.path)?;
        Ok(Box::new(source) as Box<dyn EventSource + Send>)
    })
}

/// Run every configured dataset, opening its events through `open`.
pub fn run_with_sources<F>(config: &AnalysisConfig, batch_size: usize, open: F) -> Result<AnalysisOutput, AppError>
where
    F: Fn(&DatasetSpec) -> Result<Box<dyn EventSource + Send>, AppError> + Sync,
{
    config.validate()?;
    let lumi = Luminosity::from_config(&config.luminosity)?;

    let datasets = config
        .datasets
        .par_iter()
        .map(|spec| {
            let mut source = open(spec)?;
            run_dataset(spec, source.as_mut(), config, batch_size)
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let counters: Vec<RoleCounters> = datasets.iter().map(|d| RoleCounters::from(&d.summary)).collect();
    let table = StageTable::build(&counters, &lumi);
    if let Err(err) = &table {
        tracing::warn!(error = %err, "cross-section table unavailable");
    }

    Ok(AnalysisOutput { datasets, table })
}

/// Process one dataset to completion.
pub fn run_dataset(
    spec: &DatasetSpec,
    source: &mut dyn EventSource,
    config: &AnalysisConfig,
    batch_size: usize,
) -> Result<DatasetRun, AppError> {
    let started = Instant::now();
    tracing::info!(dataset = %spec.name, role = %spec.role, "processing dataset");

    let reconstructor = TopReconstructor::new(config.reconstruction)?;
    let mut pipeline = SelectionPipeline::new(config.selection.clone(), reconstructor)?;
    let mut book = HistogramBook::new();

    let batch_size = batch_size.max(1);
    let mut raw = Vec::with_capacity(batch_size);
    loop {
        if source.fill_batch(&mut raw, batch_size)? == 0 {
            break;
        }
        let mut events: Vec<PhysicsEvent> = raw.drain(..).map(|r| config.event.build(r)).collect();
        pipeline.process_batch(&mut events, &mut book);
    }

    let summary = pipeline.finish().into_summary(spec.name.clone(), spec.role);
    tracing::info!(
        dataset = %spec.name,
        events = summary.counters.events(Stage::NoCuts),
        selected = summary.counters.events(Stage::Met),
        reconstructed = summary.reco.reconstructed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "dataset done"
    );
    tracing::debug!(
        dataset = %spec.name,
        too_few_jets = summary.reco.too_few_jets,
        no_neutrino_solution = summary.reco.no_neutrino_solution,
        mass_difference_too_large = summary.reco.mass_difference_too_large,
        candidates = summary.reco.candidates_evaluated,
        "reconstruction diagnostics"
    );

    Ok(DatasetRun { summary, book })
}
