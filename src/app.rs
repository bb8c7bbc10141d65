//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initializes logging
//! - loads the analysis configuration (or generates a toy one)
//! - runs selection + reconstruction over every dataset
//! - prints the counters and cross-section tables
//! - writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{Cli, Command, DemoArgs, EstimateArgs, OutputArgs, Overrides, RunArgs};
use crate::data::{Process, generate_mc_sample, generate_pseudo_data};
use crate::domain::{AnalysisConfig, DatasetRole, DatasetSpec, LuminosityConfig};
use crate::error::AppError;
use crate::estimate::{Luminosity, RoleCounters, StageTable};
use crate::hist::HistogramBook;
use crate::io::{
    CountersFile, read_analysis_config, read_counters_json, resolve_dataset_paths, write_analysis_config,
    write_counters_json, write_events_jsonl, write_histograms_csv, write_table_csv,
};
use crate::report;

pub mod pipeline;

use pipeline::AnalysisOutput;

/// Entry point for the `ttx` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Demo(args) => handle_demo(args),
        Command::Estimate(args) => handle_estimate(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let mut config = read_analysis_config(&args.config)?;
    apply_overrides(&mut config, &args.overrides)?;
    analyze(&config, &args.output)
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = write_demo_inputs(&args.out_dir, args.mc_events, args.data_luminosity, args.seed)?;
    println!(
        "Demo datasets written to {} (config: {})",
        args.out_dir.display(),
        args.out_dir.join(DEMO_CONFIG).display()
    );
    resolve_dataset_paths(&mut config, &args.out_dir);
    apply_overrides(&mut config, &args.overrides)?;
    analyze(&config, &args.output)
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let file = read_counters_json(&args.counters)?;
    let lumi_cfg = LuminosityConfig {
        value: args.luminosity.unwrap_or(file.luminosity.value),
        rel_uncertainty: args.lumi_uncertainty.unwrap_or(file.luminosity.rel_uncertainty),
    };
    let lumi = Luminosity::from_config(&lumi_cfg)?;
    let counters: Vec<RoleCounters> = file.datasets.iter().map(RoleCounters::from).collect();
    let table = StageTable::build(&counters, &lumi)?;

    println!("{}", report::format_counters(&file.datasets));
    print_table(&table, args.reference.or(file.reference_xs));

    if let Some(path) = &args.export_table {
        write_table_csv(path, &table)?;
    }
    Ok(())
}

/// Run, report and export one fully resolved configuration.
fn analyze(config: &AnalysisConfig, output: &OutputArgs) -> Result<(), AppError> {
    let run = pipeline::run_analysis(config, output.batch_size)?;
    let summaries = run.summaries();

    println!("{}", report::format_counters(&summaries));
    println!("{}", report::format_reco_diagnostics(&summaries));
    print_top_mass(&run, config);

    if let Some(path) = &output.export_counters {
        let file = CountersFile::new(summaries.clone(), config.luminosity, config.reference_xs);
        write_counters_json(path, &file)?;
    }
    if let Some(dir) = &output.export_hists {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", dir.display())))?;
        for ds in &run.datasets {
            write_histograms_csv(&dir.join(format!("{}.csv", ds.summary.name)), &ds.book)?;
        }
    }

    let table = run.table?;
    print_table(&table, config.reference_xs);
    if let Some(path) = &output.export_table {
        write_table_csv(path, &table)?;
    }
    Ok(())
}

fn print_table(table: &StageTable, reference: Option<f64>) {
    println!("{}", report::format_eff_pur(table));
    println!("{}", report::format_cross_sections(table));
    if let Some(reference) = reference {
        println!("{}", report::format_reference_comparison(table, reference));
    }
}

fn print_top_mass(run: &AnalysisOutput, config: &AnalysisConfig) {
    let [lo, hi] = config.fit_window;
    for (label, role) in [("signal MC", DatasetRole::Signal), ("data", DatasetRole::Data)] {
        let book: HistogramBook = run.merged_book(role);
        let summary = book.top_mass().and_then(|h| h.window_summary(lo, hi));
        print!("{}", report::format_top_mass_window(label, summary.as_ref()));
    }
    println!();
}

/// Apply CLI overrides, then re-validate.
pub fn apply_overrides(config: &mut AnalysisConfig, o: &Overrides) -> Result<(), AppError> {
    if let Some(jec) = o.jec {
        config.event.jec = jec;
    }
    if let Some(iso) = o.muon_isolation {
        config.event.muon_isolation = iso;
    }
    if let Some(lumi) = o.luminosity {
        config.luminosity.value = lumi;
    }
    if let Some(unc) = o.lumi_uncertainty {
        config.luminosity.rel_uncertainty = unc;
    }
    let reco = &mut config.reconstruction;
    if let Some(v) = o.max_mass_diff {
        reco.max_mass_difference = v;
    }
    if let Some(v) = o.min_jets {
        reco.min_jets = v;
    }
    if let Some(v) = o.max_jets {
        reco.max_jets = v;
    }
    if let Some(v) = o.root_policy {
        reco.root_policy = v;
    }
    if let Some(v) = o.complex_policy {
        reco.complex_policy = v;
    }
    if let Some(v) = o.mass_combination {
        reco.combination = v;
    }
    config.validate()
}

const DEMO_CONFIG: &str = "analysis.json";

/// Generate the toy datasets into `dir` and return the matching config
/// (dataset paths relative to `dir`).
pub fn write_demo_inputs(dir: &Path, mc_events: usize, lumi: f64, seed: u64) -> Result<AnalysisConfig, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", dir.display())))?;

    let mut datasets = Vec::new();
    for (i, process) in Process::ALL.into_iter().enumerate() {
        let events = generate_mc_sample(process, mc_events, lumi, seed.wrapping_add(i as u64))?;
        let file = PathBuf::from(format!("{}.jsonl", process.name()));
        write_events_jsonl(&dir.join(&file), &events)?;
        let role = match process {
            Process::Ttbar => DatasetRole::Signal,
            Process::Wjets | Process::Qcd => DatasetRole::Background,
        };
        datasets.push(DatasetSpec {
            name: process.name().to_string(),
            path: file,
            role,
        });
        tracing::info!(process = process.name(), events = events.len(), "generated MC sample");
    }

    let data = generate_pseudo_data(lumi, seed)?;
    let file = PathBuf::from("data.jsonl");
    write_events_jsonl(&dir.join(&file), &data)?;
    tracing::info!(events = data.len(), "generated pseudo-data");
    datasets.push(DatasetSpec {
        name: "data".to_string(),
        path: file,
        role: DatasetRole::Data,
    });

    let config = AnalysisConfig {
        datasets,
        luminosity: LuminosityConfig {
            value: lumi,
            ..LuminosityConfig::default()
        },
        ..AnalysisConfig::default()
    };
    config.validate()?;
    write_analysis_config(&dir.join(DEMO_CONFIG), &config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Jec;

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut config = AnalysisConfig {
            datasets: vec![DatasetSpec {
                name: "ttbar".into(),
                path: PathBuf::from("ttbar.jsonl"),
                role: DatasetRole::Signal,
            }],
            ..AnalysisConfig::default()
        };
        let o = Overrides {
            jec: Some(Jec::Down),
            max_mass_diff: Some(25.0),
            ..Overrides::default()
        };
        apply_overrides(&mut config, &o).unwrap();
        assert_eq!(config.event.jec, Jec::Down);
        assert_eq!(config.reconstruction.max_mass_difference, 25.0);
        assert_eq!(config.reconstruction.min_jets, 4);
        assert_eq!(config.luminosity.value, 50.0);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let mut config = AnalysisConfig {
            datasets: vec![DatasetSpec {
                name: "ttbar".into(),
                path: PathBuf::from("ttbar.jsonl"),
                role: DatasetRole::Signal,
            }],
            ..AnalysisConfig::default()
        };
        let o = Overrides {
            min_jets: Some(6),
            max_jets: Some(5),
            ..Overrides::default()
        };
        assert_eq!(apply_overrides(&mut config, &o).unwrap_err().exit_code(), 2);
    }
}
