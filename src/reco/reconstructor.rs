//! Combinatorial top-pair reconstruction for one semileptonic event.
//!
//! Given:
//! - the event's jets
//! - the missing transverse momentum
//! - the selected muon
//!
//! we recover the neutrino `pz` candidates once, then for every jet assignment
//! and every `pz` candidate compute the hadronic and leptonic top masses. The
//! candidate with the smallest `|m_had - m_lep|` wins; ties go to the earlier
//! assignment so the result does not depend on thread scheduling.

use rayon::prelude::*;

use crate::domain::{Jet, MassCombination, MissingEt, Muon, ReconstructionConfig};
use crate::error::AppError;
use crate::math::{LorentzVector, invariant_mass, mass_of};
use crate::reco::assignments::{Assignment, enumerate_assignments};
use crate::reco::neutrino::{candidate_pz, neutrino_vector, solve_neutrino_pz};

/// A successful reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct TopCandidate {
    /// Combined top mass (per `MassCombination`).
    pub mass: f64,
    pub hadronic_mass: f64,
    pub leptonic_mass: f64,
    pub mass_difference: f64,
    pub leptonic_jet: usize,
    pub hadronic_jets: Vec<usize>,
    pub neutrino_pz: f64,
}

/// Why an event was not reconstructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoFailure {
    TooFewJets { available: usize, required: usize },
    /// The W-mass constraint has no acceptable neutrino solution.
    NoNeutrinoSolution,
    /// The best assignment is still outside the allowed mass difference.
    MassDifferenceTooLarge { best: f64 },
}

impl RecoFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            RecoFailure::TooFewJets { .. } => "too_few_jets",
            RecoFailure::NoNeutrinoSolution => "no_neutrino_solution",
            RecoFailure::MassDifferenceTooLarge { .. } => "mass_difference_too_large",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecoOutcome {
    Reconstructed(TopCandidate),
    NotReconstructed(RecoFailure),
}

/// Outcome plus the size of the search that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub outcome: RecoOutcome,
    /// Number of (assignment, neutrino `pz`) pairs evaluated.
    pub candidates_evaluated: usize,
}

impl Reconstruction {
    fn failed(failure: RecoFailure, candidates_evaluated: usize) -> Self {
        Self {
            outcome: RecoOutcome::NotReconstructed(failure),
            candidates_evaluated,
        }
    }

    pub fn mass(&self) -> Option<f64> {
        match &self.outcome {
            RecoOutcome::Reconstructed(c) => Some(c.mass),
            RecoOutcome::NotReconstructed(_) => None,
        }
    }

    pub fn is_reconstructed(&self) -> bool {
        matches!(self.outcome, RecoOutcome::Reconstructed(_))
    }
}

#[derive(Debug, Clone)]
struct Scored {
    idx: usize,
    hadronic_mass: f64,
    leptonic_mass: f64,
    diff: f64,
    pz: f64,
}

/// The reconstructor; cheap to clone and shareable across threads.
#[derive(Debug, Clone)]
pub struct TopReconstructor {
    config: ReconstructionConfig,
}

impl TopReconstructor {
    pub fn new(config: ReconstructionConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Reconstruct the top mass.
    ///
    /// Requires a lepton: callers pass the muon guaranteed by the selection's
    /// muon stage. Failure is an ordinary outcome, never an error.
    pub fn reconstruct(&self, jets: &[Jet], met: &MissingEt, lepton: &Muon) -> Reconstruction {
        let cfg = &self.config;
        if jets.len() < cfg.min_jets {
            return Reconstruction::failed(
                RecoFailure::TooFewJets {
                    available: jets.len(),
                    required: cfg.min_jets,
                },
                0,
            );
        }

        let roots = solve_neutrino_pz(&lepton.p4, met, cfg.w_mass);
        let pz_candidates = candidate_pz(roots, cfg.root_policy, cfg.complex_policy);
        if pz_candidates.is_empty() {
            return Reconstruction::failed(RecoFailure::NoNeutrinoSolution, 0);
        }

        let lep = lepton.p4.to_lorentz();
        let neutrinos: Vec<(f64, LorentzVector)> = pz_candidates
            .iter()
            .map(|&pz| (pz, neutrino_vector(met, pz)))
            .collect();
        let jet_vecs: Vec<LorentzVector> = jets.iter().map(|j| j.p4.to_lorentz()).collect();

        let assignments = enumerate_assignments(jets.len(), cfg.min_jets, cfg.max_jets);
        let evaluated = assignments.len() * neutrinos.len();

        // Evaluate each assignment independently (parallel).
        let best = assignments
            .par_iter()
            .enumerate()
            .filter_map(|(idx, a)| score_assignment(idx, a, &jet_vecs, &lep, &neutrinos))
            .reduce_with(pick_better);

        let Some(best) = best else {
            return Reconstruction::failed(RecoFailure::NoNeutrinoSolution, evaluated);
        };

        if best.diff > cfg.max_mass_difference {
            return Reconstruction::failed(RecoFailure::MassDifferenceTooLarge { best: best.diff }, evaluated);
        }

        let assignment = &assignments[best.idx];
        let mass = match cfg.combination {
            MassCombination::Average => 0.5 * (best.hadronic_mass + best.leptonic_mass),
            MassCombination::Hadronic => best.hadronic_mass,
            MassCombination::Leptonic => best.leptonic_mass,
        };

        Reconstruction {
            outcome: RecoOutcome::Reconstructed(TopCandidate {
                mass,
                hadronic_mass: best.hadronic_mass,
                leptonic_mass: best.leptonic_mass,
                mass_difference: best.diff,
                leptonic_jet: assignment.leptonic,
                hadronic_jets: assignment.hadronic.clone(),
                neutrino_pz: best.pz,
            }),
            candidates_evaluated: evaluated,
        }
    }
}

fn score_assignment(
    idx: usize,
    assignment: &Assignment,
    jets: &[LorentzVector],
    lepton: &LorentzVector,
    neutrinos: &[(f64, LorentzVector)],
) -> Option<Scored> {
    let hadronic: Vec<LorentzVector> = assignment.hadronic.iter().map(|&j| jets[j]).collect();
    let hadronic_mass = invariant_mass(&hadronic);
    if !hadronic_mass.is_finite() {
        return None;
    }

    let lep_b = lepton + jets[assignment.leptonic];
    let mut best: Option<Scored> = None;
    for &(pz, nu) in neutrinos {
        let leptonic_mass = mass_of(&(lep_b + nu));
        let diff = (hadronic_mass - leptonic_mass).abs();
        if !diff.is_finite() {
            continue;
        }
        // Strict `<` keeps the first root on ties.
        if best.as_ref().is_none_or(|b| diff < b.diff) {
            best = Some(Scored {
                idx,
                hadronic_mass,
                leptonic_mass,
                diff,
                pz,
            });
        }
    }
    best
}

fn pick_better(a: Scored, b: Scored) -> Scored {
    if b.diff < a.diff || (b.diff == a.diff && b.idx < a.idx) {
        b
    } else {
        a
    }
}
