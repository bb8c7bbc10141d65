//! Run configuration.
//!
//! Everything tunable about an analysis run lives here so that the selection,
//! reconstruction and estimation code only ever sees validated values:
//!
//! - event building options (`EventOptions`, `Jec`)
//! - the cut cascade thresholds (`SelectionConfig`)
//! - the top reconstruction knobs (`ReconstructionConfig` + policy enums)
//! - luminosity and the dataset list (`AnalysisConfig`)

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{DatasetRole, PhysicsEvent, RawEvent};
use crate::error::AppError;

/// Jet-energy-correction variant applied while building events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Jec {
    #[default]
    Nominal,
    Up,
    Down,
}

impl Jec {
    /// Multiplicative jet-energy factor for a jet with the given fractional uncertainty.
    pub fn factor(self, uncertainty: f64) -> f64 {
        match self {
            Jec::Nominal => 1.0,
            Jec::Up => 1.0 + uncertainty,
            Jec::Down => (1.0 - uncertainty).max(0.0),
        }
    }
}

/// Options applied when turning input records into `PhysicsEvent`s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventOptions {
    pub jec: Jec,
    /// Muons with relative isolation above this value are dropped.
    pub muon_isolation: f64,
}

impl Default for EventOptions {
    fn default() -> Self {
        Self {
            jec: Jec::Nominal,
            muon_isolation: 0.1,
        }
    }
}

impl EventOptions {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.muon_isolation.is_finite() && self.muon_isolation >= 0.0) {
            return Err(AppError::new(2, "Invalid muon_isolation setting (must be finite and >= 0)."));
        }
        Ok(())
    }

    /// Build an event: apply the JEC variant, re-sort jets by pT, drop non-isolated muons.
    pub fn build(&self, raw: RawEvent) -> PhysicsEvent {
        let mut jets: Vec<_> = raw
            .jets
            .into_iter()
            .map(|mut jet| {
                jet.p4 = jet.p4.scaled(self.jec.factor(jet.jec_uncertainty));
                jet
            })
            .collect();
        jets.sort_by(|a, b| b.p4.pt.partial_cmp(&a.p4.pt).unwrap_or(std::cmp::Ordering::Equal));

        let muons = raw
            .muons
            .into_iter()
            .filter(|m| m.isolation <= self.muon_isolation)
            .collect();

        PhysicsEvent {
            weight: raw.weight,
            jets,
            muons,
            met: raw.met,
            triggers: raw.triggers,
            top_mass: None,
        }
    }
}

/// Inclusive multiplicity window `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

impl CountRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }
}

impl std::fmt::Display for CountRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Thresholds of the default cut cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub trigger_name: String,
    pub jet_count: CountRange,
    pub muon_count: CountRange,
    pub b_jet_count: CountRange,
    /// Minimum missing transverse momentum (GeV).
    pub met_threshold: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            trigger_name: "IsoMu24".to_string(),
            jet_count: CountRange::new(3, 8),
            muon_count: CountRange::new(1, 2),
            b_jet_count: CountRange::new(1, 3),
            met_threshold: 25.0,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.trigger_name.trim().is_empty() {
            return Err(AppError::new(2, "Selection trigger_name must not be empty."));
        }
        for (label, range) in [
            ("jet_count", self.jet_count),
            ("muon_count", self.muon_count),
            ("b_jet_count", self.b_jet_count),
        ] {
            if range.min > range.max {
                return Err(AppError::new(2, format!("Selection {label} range is inverted: {range}.")));
            }
        }
        // The reconstruction needs the leading muon; the muon stage must guarantee one exists.
        if self.muon_count.min == 0 {
            return Err(AppError::new(
                2,
                "Selection muon_count.min must be >= 1 (the top reconstruction needs a muon).",
            ));
        }
        if !(self.met_threshold.is_finite() && self.met_threshold >= 0.0) {
            return Err(AppError::new(2, "Selection met_threshold must be finite and >= 0."));
        }
        Ok(())
    }
}

/// How to choose between the two real neutrino `pz` solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NeutrinoRootPolicy {
    /// Try both roots for every jet assignment; keep the better mass match.
    #[default]
    BestMassMatch,
    /// Keep only the root with the smaller |pz|.
    SmallerMagnitude,
}

/// What to do when the W-mass constraint has no real solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ComplexRootPolicy {
    /// The event is not reconstructible.
    #[default]
    Reject,
    /// Drop the imaginary part and use the real part of the complex pair.
    RealPart,
}

/// How the hadronic and leptonic top masses are combined into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MassCombination {
    #[default]
    Average,
    Hadronic,
    Leptonic,
}

/// Parameters of the combinatorial top-pair reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Maximum allowed |m_had - m_lep| (GeV).
    pub max_mass_difference: f64,
    /// Smallest number of jets used in one assignment (one leptonic + rest hadronic).
    pub min_jets: usize,
    /// Largest number of jets used in one assignment.
    pub max_jets: usize,
    /// W boson mass used in the neutrino constraint (GeV).
    pub w_mass: f64,
    pub root_policy: NeutrinoRootPolicy,
    pub complex_policy: ComplexRootPolicy,
    pub combination: MassCombination,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            max_mass_difference: 10.0,
            min_jets: 4,
            max_jets: 4,
            w_mass: 80.4,
            root_policy: NeutrinoRootPolicy::BestMassMatch,
            complex_policy: ComplexRootPolicy::Reject,
            combination: MassCombination::Average,
        }
    }
}

impl ReconstructionConfig {
    pub fn new(max_mass_difference: f64, min_jets: usize, max_jets: usize) -> Self {
        Self {
            max_mass_difference,
            min_jets,
            max_jets,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.max_mass_difference.is_finite() && self.max_mass_difference >= 0.0) {
            return Err(AppError::new(2, "Reconstruction max_mass_difference must be finite and >= 0."));
        }
        if self.min_jets < 2 {
            return Err(AppError::new(
                2,
                "Reconstruction min_jets must be >= 2 (one leptonic and at least one hadronic jet).",
            ));
        }
        if self.min_jets > self.max_jets {
            return Err(AppError::new(
                2,
                format!(
                    "Reconstruction min_jets ({}) exceeds max_jets ({}).",
                    self.min_jets, self.max_jets
                ),
            ));
        }
        if !(self.w_mass.is_finite() && self.w_mass > 0.0) {
            return Err(AppError::new(2, "Reconstruction w_mass must be finite and > 0."));
        }
        Ok(())
    }
}

/// Integrated luminosity and its fractional uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuminosityConfig {
    /// Integrated luminosity in pb⁻¹.
    pub value: f64,
    /// Fractional uncertainty (e.g. 0.05 for 5 %).
    pub rel_uncertainty: f64,
}

impl Default for LuminosityConfig {
    fn default() -> Self {
        Self {
            value: 50.0,
            rel_uncertainty: 0.05,
        }
    }
}

/// One input dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub path: PathBuf,
    pub role: DatasetRole,
}

/// The complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub datasets: Vec<DatasetSpec>,
    pub event: EventOptions,
    pub selection: SelectionConfig,
    pub reconstruction: ReconstructionConfig,
    pub luminosity: LuminosityConfig,
    /// Reference (literature) cross-section in pb for the comparison table.
    pub reference_xs: Option<f64>,
    /// Top-mass window `[lo, hi]` handed to the peak summary.
    pub fit_window: [f64; 2],
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            datasets: Vec::new(),
            event: EventOptions::default(),
            selection: SelectionConfig::default(),
            reconstruction: ReconstructionConfig::default(),
            luminosity: LuminosityConfig::default(),
            reference_xs: Some(173.0),
            fit_window: [130.0, 210.0],
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.event.validate()?;
        self.selection.validate()?;
        self.reconstruction.validate()?;

        if !(self.luminosity.value.is_finite() && self.luminosity.value > 0.0) {
            return Err(AppError::new(2, "Luminosity value must be finite and > 0."));
        }
        if !(self.luminosity.rel_uncertainty.is_finite() && self.luminosity.rel_uncertainty >= 0.0) {
            return Err(AppError::new(2, "Luminosity rel_uncertainty must be finite and >= 0."));
        }
        let [lo, hi] = self.fit_window;
        if !(lo.is_finite() && hi.is_finite() && hi > lo) {
            return Err(AppError::new(2, format!("Invalid fit_window [{lo}, {hi}].")));
        }

        if self.datasets.is_empty() {
            return Err(AppError::new(2, "No datasets configured."));
        }
        let mut names = std::collections::HashSet::new();
        for ds in &self.datasets {
            if !names.insert(ds.name.as_str()) {
                return Err(AppError::new(2, format!("Duplicate dataset name '{}'.", ds.name)));
            }
        }
        let n_signal = self
            .datasets
            .iter()
            .filter(|d| d.role == DatasetRole::Signal)
            .count();
        if n_signal != 1 {
            return Err(AppError::new(
                2,
                format!("Exactly one signal dataset is required (found {n_signal})."),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FourMomentum, Jet, MissingEt, Muon};
    use std::collections::BTreeMap;

    fn raw_event() -> RawEvent {
        let mut soft = Jet::new(FourMomentum::new(40.0, 0.0, 0.0, 40.0), false);
        soft.jec_uncertainty = 0.5;
        let hard = Jet::new(FourMomentum::new(50.0, 0.0, 1.0, 50.0), true);
        RawEvent {
            weight: 0.7,
            jets: vec![hard, soft],
            muons: vec![
                Muon::new(FourMomentum::new(30.0, 0.0, 0.0, 30.0), -1, 0.02),
                Muon::new(FourMomentum::new(20.0, 0.0, 0.0, 20.0), 1, 0.4),
            ],
            met: MissingEt::new(10.0, 0.0),
            triggers: BTreeMap::new(),
        }
    }

    #[test]
    fn default_selection_matches_standard_cascade() {
        let s = SelectionConfig::default();
        assert_eq!(s.trigger_name, "IsoMu24");
        assert_eq!(s.jet_count, CountRange::new(3, 8));
        assert_eq!(s.muon_count, CountRange::new(1, 2));
        assert_eq!(s.b_jet_count, CountRange::new(1, 3));
        assert_eq!(s.met_threshold, 25.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn selection_rejects_muon_range_starting_at_zero() {
        let s = SelectionConfig {
            muon_count: CountRange::new(0, 2),
            ..SelectionConfig::default()
        };
        assert_eq!(s.validate().unwrap_err().exit_code(), 2);
    }

    #[test]
    fn reconstruction_rejects_inverted_jet_bounds() {
        let cfg = ReconstructionConfig::new(10.0, 5, 4);
        assert!(cfg.validate().is_err());
        assert!(ReconstructionConfig::new(10.0, 4, 4).validate().is_ok());
    }

    #[test]
    fn build_drops_non_isolated_muons() {
        let event = EventOptions::default().build(raw_event());
        assert_eq!(event.n_muons(), 1);
        assert_eq!(event.muons[0].charge, -1);
        assert_eq!(event.weight, 0.7);
        assert_eq!(event.top_mass, None);
    }

    #[test]
    fn jec_up_rescales_and_reorders_jets() {
        let opts = EventOptions {
            jec: Jec::Up,
            ..EventOptions::default()
        };
        let event = opts.build(raw_event());
        // 40 GeV * 1.5 = 60 GeV overtakes the 50 GeV jet.
        assert!((event.jets[0].p4.pt - 60.0).abs() < 1e-12);
        assert!(!event.jets[0].b_tag);
        assert!((event.jets[1].p4.pt - 50.0).abs() < 1e-12);
    }

    #[test]
    fn jec_down_rescales_and_reorders_jets() {
        let mut raw = raw_event();
        raw.jets[0].jec_uncertainty = 0.4;
        raw.jets[1].jec_uncertainty = 0.0;
        let opts = EventOptions {
            jec: Jec::Down,
            ..EventOptions::default()
        };
        let event = opts.build(raw);
        // 50 GeV * 0.6 = 30 GeV falls below the unscaled 40 GeV jet.
        assert!((event.jets[0].p4.pt - 40.0).abs() < 1e-12);
        assert!(!event.jets[0].b_tag);
        assert!((event.jets[1].p4.pt - 30.0).abs() < 1e-12);
        assert!(event.jets[1].b_tag);
    }

    #[test]
    fn nominal_build_sorts_jets_by_pt() {
        let mut raw = raw_event();
        raw.jets.reverse();
        let event = EventOptions::default().build(raw);
        assert!((event.jets[0].p4.pt - 50.0).abs() < 1e-12);
        assert!((event.jets[1].p4.pt - 40.0).abs() < 1e-12);
    }

    #[test]
    fn analysis_config_parses_partial_json() {
        let json = r#"{
            "datasets": [
                {"name": "TTbar", "path": "ttbar.jsonl", "role": "signal"},
                {"name": "Data", "path": "data.jsonl", "role": "data"}
            ],
            "selection": {"met_threshold": 30.0}
        }"#;
        let cfg: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.selection.met_threshold, 30.0);
        assert_eq!(cfg.selection.jet_count, CountRange::new(3, 8));
        assert_eq!(cfg.reconstruction, ReconstructionConfig::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn analysis_config_requires_single_signal() {
        let cfg = AnalysisConfig {
            datasets: vec![DatasetSpec {
                name: "Data".to_string(),
                path: PathBuf::from("data.jsonl"),
                role: DatasetRole::Data,
            }],
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
