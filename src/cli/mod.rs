//! Command-line parsing for the tt̄ cross-section analysis.
//!
//! Argument parsing lives here; `app` turns the parsed arguments into a run.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ComplexRootPolicy, Jec, MassCombination, NeutrinoRootPolicy};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ttx", version, about = "Top-quark pair selection, reconstruction and cross-section estimate")]
pub struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the selection and reconstruction over every configured dataset and
    /// print the efficiency / purity / cross-section tables.
    Run(RunArgs),
    /// Generate toy datasets plus a matching config, then run the analysis on them.
    Demo(DemoArgs),
    /// Rebuild the cross-section tables from a counters JSON written by `run`.
    Estimate(EstimateArgs),
}

/// Overrides applied on top of the analysis configuration.
#[derive(Debug, Args, Clone, Default)]
pub struct Overrides {
    /// Jet energy correction variant.
    #[arg(long, value_enum)]
    pub jec: Option<Jec>,

    /// Muon isolation threshold.
    #[arg(long)]
    pub muon_isolation: Option<f64>,

    /// Integrated luminosity (pb⁻¹).
    #[arg(long)]
    pub luminosity: Option<f64>,

    /// Fractional luminosity uncertainty (e.g. 0.05).
    #[arg(long)]
    pub lumi_uncertainty: Option<f64>,

    /// Maximum |m_had - m_lep| accepted by the reconstruction (GeV).
    #[arg(long)]
    pub max_mass_diff: Option<f64>,

    /// Minimum number of jets per assignment.
    #[arg(long)]
    pub min_jets: Option<usize>,

    /// Maximum number of jets per assignment.
    #[arg(long)]
    pub max_jets: Option<usize>,

    /// Neutrino pz root choice.
    #[arg(long, value_enum)]
    pub root_policy: Option<NeutrinoRootPolicy>,

    /// Handling of a negative W-constraint discriminant.
    #[arg(long, value_enum)]
    pub complex_policy: Option<ComplexRootPolicy>,

    /// How the hadronic and leptonic masses combine into the top mass.
    #[arg(long, value_enum)]
    pub mass_combination: Option<MassCombination>,
}

/// Output options shared by `run` and `demo`.
#[derive(Debug, Args, Clone, Default)]
pub struct OutputArgs {
    /// Events processed per parallel batch.
    #[arg(long, default_value_t = 4096)]
    pub batch_size: usize,

    /// Export the stage table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_table: Option<PathBuf>,

    /// Export the frozen per-dataset counters to JSON (input of `ttx estimate`).
    #[arg(long, value_name = "JSON")]
    pub export_counters: Option<PathBuf>,

    /// Export every dataset's histograms as `<DIR>/<dataset>.csv`.
    #[arg(long, value_name = "DIR")]
    pub export_hists: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Analysis configuration (JSON).
    #[arg(short, long, value_name = "JSON")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Directory receiving the generated event files and config.
    #[arg(long, value_name = "DIR", default_value = "ttx-demo")]
    pub out_dir: PathBuf,

    /// Monte-Carlo events generated per process.
    #[arg(long, default_value_t = 20000)]
    pub mc_events: usize,

    /// Luminosity of the pseudo-data (pb⁻¹).
    #[arg(long, default_value_t = 50.0)]
    pub data_luminosity: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct EstimateArgs {
    /// Counters JSON produced by `ttx run --export-counters`.
    #[arg(long, value_name = "JSON")]
    pub counters: PathBuf,

    /// Integrated luminosity (pb⁻¹); defaults to the value stored in the file.
    #[arg(long)]
    pub luminosity: Option<f64>,

    /// Fractional luminosity uncertainty; defaults to the value stored in the file.
    #[arg(long)]
    pub lumi_uncertainty: Option<f64>,

    /// Reference cross-section (pb) to compare against.
    #[arg(long)]
    pub reference: Option<f64>,

    /// Export the stage table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_table: Option<PathBuf>,
}
