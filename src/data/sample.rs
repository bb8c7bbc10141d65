//! Toy event generator.
//!
//! Produces `RawEvent`s for three processes with a crude parton-level model
//! and a simple detector response (Gaussian jet smearing, acceptance cuts,
//! b-tag efficiency, MET resolution, muon trigger). It is only meant to give
//! the selection and reconstruction realistic-looking input; it is not a
//! detector simulation.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use clap::ValueEnum;
use nalgebra::Vector3;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::{FourMomentum, Jet, MissingEt, Muon, RawEvent};
use crate::error::AppError;
use crate::math::{LorentzVector, boost, lorentz, mass_of, two_body_decay, velocity};

const GEN_TOP_MASS: f64 = 172.5;
const GEN_TOP_WIDTH: f64 = 1.4;
const GEN_W_MASS: f64 = 80.4;
const GEN_W_WIDTH: f64 = 2.1;
/// Probability that a W decays to a muon and a neutrino in the toy.
const W_TO_MUON: f64 = 1.0 / 3.0;
const TRIGGER: &str = "IsoMu24";

/// Toy physics process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    Ttbar,
    Wjets,
    Qcd,
}

impl Process {
    pub const ALL: [Process; 3] = [Process::Ttbar, Process::Wjets, Process::Qcd];

    pub fn name(self) -> &'static str {
        match self {
            Process::Ttbar => "ttbar",
            Process::Wjets => "wjets",
            Process::Qcd => "qcd",
        }
    }

    /// Cross-section (pb) of the process after the toy's generator-level filter.
    pub fn cross_section(self) -> f64 {
        match self {
            Process::Ttbar => 173.0,
            Process::Wjets => 600.0,
            Process::Qcd => 1000.0,
        }
    }
}

/// Detector response of the toy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detector {
    /// Relative jet energy resolution.
    pub jet_resolution: f64,
    /// MET resolution per transverse component (GeV).
    pub met_resolution: f64,
    pub jet_pt_min: f64,
    pub jet_eta_max: f64,
    pub muon_pt_min: f64,
    pub muon_eta_max: f64,
    pub b_tag_efficiency: f64,
    pub mistag_rate: f64,
    /// Fractional jet-energy-scale uncertainty stored with every jet.
    pub jec_uncertainty: f64,
    pub trigger_pt: f64,
    pub trigger_isolation: f64,
    pub trigger_efficiency: f64,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            jet_resolution: 0.10,
            met_resolution: 8.0,
            jet_pt_min: 20.0,
            jet_eta_max: 2.5,
            muon_pt_min: 10.0,
            muon_eta_max: 2.4,
            b_tag_efficiency: 0.7,
            mistag_rate: 0.02,
            jec_uncertainty: 0.03,
            trigger_pt: 24.0,
            trigger_isolation: 0.15,
            trigger_efficiency: 0.95,
        }
    }
}

/// Generate `n` events of `process`, each carrying `weight`.
pub fn generate_events(process: Process, n: usize, seed: u64, weight: f64) -> Result<Vec<RawEvent>, AppError> {
    if !weight.is_finite() {
        return Err(AppError::new(2, "Event weight must be finite."));
    }
    let mut generator = Generator::new(seed, Detector::default())?;
    Ok((0..n).map(|_| generator.event(process, weight)).collect())
}

/// A Monte-Carlo sample normalized to `lumi` (pb⁻¹): `n` events of weight `σ L / n`.
pub fn generate_mc_sample(process: Process, n: usize, lumi: f64, seed: u64) -> Result<Vec<RawEvent>, AppError> {
    if n == 0 {
        return Err(AppError::new(2, "Sample size must be > 0."));
    }
    let weight = process.cross_section() * lumi / n as f64;
    generate_events(process, n, seed, weight)
}

/// Unit-weight pseudo-data: every process at its expected yield `σ L`.
pub fn generate_pseudo_data(lumi: f64, seed: u64) -> Result<Vec<RawEvent>, AppError> {
    if !(lumi.is_finite() && lumi > 0.0) {
        return Err(AppError::new(2, "Luminosity must be finite and > 0."));
    }
    let mut out = Vec::new();
    for (i, process) in Process::ALL.into_iter().enumerate() {
        let n = (process.cross_section() * lumi).round() as usize;
        out.extend(generate_events(process, n, seed.wrapping_add(1000 + i as u64), 1.0)?);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    out.shuffle(&mut rng);
    Ok(out)
}

/// Parton-level object before the detector response.
#[derive(Debug, Clone, Copy)]
enum Truth {
    Quark { p4: LorentzVector, bottom: bool },
    Muon { p4: LorentzVector, charge: i8, prompt: bool },
    Neutrino(LorentzVector),
}

struct Generator {
    rng: StdRng,
    det: Detector,
    unit: Normal<f64>,
}

impl Generator {
    fn new(seed: u64, det: Detector) -> Result<Self, AppError> {
        let unit = Normal::new(0.0, 1.0)
            .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            det,
            unit,
        })
    }

    fn event(&mut self, process: Process, weight: f64) -> RawEvent {
        let truth = match process {
            Process::Ttbar => self.ttbar(),
            Process::Wjets => self.wjets(),
            Process::Qcd => self.qcd(),
        };
        self.detector(&truth, weight)
    }

    fn gauss(&mut self, mean: f64, sigma: f64) -> f64 {
        mean + sigma * self.unit.sample(&mut self.rng)
    }

    fn exp(&mut self, mean: f64) -> f64 {
        // Exp::new only fails for a negative rate.
        match Exp::new(1.0 / mean) {
            Ok(d) => d.sample(&mut self.rng),
            Err(_) => 0.0,
        }
    }

    fn direction(&mut self) -> Vector3<f64> {
        let cos_t: f64 = self.rng.gen_range(-1.0..1.0);
        let sin_t = (1.0 - cos_t * cos_t).sqrt();
        let phi: f64 = self.rng.gen_range(-PI..PI);
        Vector3::new(sin_t * phi.cos(), sin_t * phi.sin(), cos_t)
    }

    /// Massless or massive object from collider coordinates.
    fn object(&self, pt: f64, eta: f64, phi: f64, mass: f64) -> LorentzVector {
        let (px, py, pz) = (pt * phi.cos(), pt * phi.sin(), pt * eta.sinh());
        lorentz(px, py, pz, (px * px + py * py + pz * pz + mass * mass).sqrt())
    }

    /// Isotropic two-body decay of `parent` in its rest frame, boosted to the lab.
    fn decay(&mut self, parent: &LorentzVector, m1: f64, m2: f64) -> (LorentzVector, LorentzVector) {
        let m = mass_of(parent);
        let dir = self.direction();
        let beta = velocity(parent);
        match two_body_decay(m, m1, m2, &dir) {
            Some((a, b)) => (boost(&a, &beta), boost(&b, &beta)),
            // Below threshold: share the parent evenly.
            None => (parent * 0.5, parent * 0.5),
        }
    }

    fn w_mass(&mut self, ceiling: f64) -> f64 {
        self.gauss(GEN_W_MASS, GEN_W_WIDTH).clamp(60.0, ceiling - 1.0)
    }

    /// W decay products: a muon and a neutrino, or two light quarks.
    fn w_decay(&mut self, w: &LorentzVector, charge: i8, out: &mut Vec<Truth>) {
        let (a, b) = self.decay(w, 0.0, 0.0);
        if self.rng.gen_bool(W_TO_MUON) {
            out.push(Truth::Muon { p4: a, charge, prompt: true });
            out.push(Truth::Neutrino(b));
        } else {
            out.push(Truth::Quark { p4: a, bottom: false });
            out.push(Truth::Quark { p4: b, bottom: false });
        }
    }

    fn radiation(&mut self, p_more: f64, max: usize, pt_mean: f64, out: &mut Vec<Truth>) {
        for _ in 0..max {
            if !self.rng.gen_bool(p_more) {
                break;
            }
            let pt = 15.0 + self.exp(pt_mean);
            let eta = self.gauss(0.0, 1.5);
            let phi = self.rng.gen_range(-PI..PI);
            let bottom = self.rng.gen_bool(0.05);
            out.push(Truth::Quark { p4: self.object(pt, eta, phi, 0.0), bottom });
        }
    }

    fn ttbar(&mut self) -> Vec<Truth> {
        let mut out = Vec::with_capacity(8);
        let m_t1 = self.gauss(GEN_TOP_MASS, GEN_TOP_WIDTH);
        let m_t2 = self.gauss(GEN_TOP_MASS, GEN_TOP_WIDTH);

        // ttbar system: mass above threshold, longitudinal boost.
        let m_tt = m_t1 + m_t2 + self.exp(80.0);
        let beta_z = self.gauss(0.0, 0.4).clamp(-0.9, 0.9);
        let e_tt = m_tt / (1.0 - beta_z * beta_z).sqrt();
        let system = lorentz(0.0, 0.0, beta_z * e_tt, e_tt);
        let (t1, t2) = self.decay(&system, m_t1, m_t2);

        for (top, charge) in [(t1, 1i8), (t2, -1i8)] {
            let m_w = self.w_mass(mass_of(&top));
            let (w, b) = self.decay(&top, m_w, 0.0);
            out.push(Truth::Quark { p4: b, bottom: true });
            self.w_decay(&w, charge, &mut out);
        }
        self.radiation(0.35, 3, 25.0, &mut out);
        out
    }

    fn wjets(&mut self) -> Vec<Truth> {
        let mut out = Vec::with_capacity(6);
        let m_w = self.w_mass(f64::INFINITY);
        let pt = self.exp(25.0);
        let y = self.gauss(0.0, 1.5);
        let phi = self.rng.gen_range(-PI..PI);
        let mt = (m_w * m_w + pt * pt).sqrt();
        let w = lorentz(pt * phi.cos(), pt * phi.sin(), mt * y.sinh(), mt * y.cosh());

        let charge = if self.rng.gen_bool(0.5) { 1 } else { -1 };
        let (mu, nu) = self.decay(&w, 0.0, 0.0);
        out.push(Truth::Muon { p4: mu, charge, prompt: true });
        out.push(Truth::Neutrino(nu));

        // At least one jet, then a falling multiplicity.
        out.push(Truth::Quark {
            p4: {
                let pt = 20.0 + self.exp(30.0);
                let eta = self.gauss(0.0, 1.6);
                let phi = self.rng.gen_range(-PI..PI);
                self.object(pt, eta, phi, 0.0)
            },
            bottom: self.rng.gen_bool(0.05),
        });
        self.radiation(0.5, 5, 30.0, &mut out);
        out
    }

    fn qcd(&mut self) -> Vec<Truth> {
        let n_jets = self.rng.gen_range(2..=6);
        let mut out = Vec::with_capacity(n_jets + 1);
        for _ in 0..n_jets {
            let pt = 25.0 + self.exp(40.0);
            let eta = self.gauss(0.0, 1.6);
            let phi = self.rng.gen_range(-PI..PI);
            let bottom = self.rng.gen_bool(0.1);
            out.push(Truth::Quark { p4: self.object(pt, eta, phi, 0.0), bottom });
        }

        // Non-prompt muon inside the leading parton's cone.
        if self.rng.gen_bool(0.5) {
            if let Some(&Truth::Quark { p4, .. }) = out.first() {
                let parent = FourMomentum::from_cartesian(p4[0], p4[1], p4[2], p4[3]);
                let pt = 5.0 + self.exp(12.0);
                let eta = parent.eta + self.gauss(0.0, 0.1);
                let phi = parent.phi + self.gauss(0.0, 0.1);
                let charge = if self.rng.gen_bool(0.5) { 1 } else { -1 };
                out.push(Truth::Muon {
                    p4: self.object(pt, eta, phi, 0.0),
                    charge,
                    prompt: false,
                });
            }
        }
        out
    }

    fn detector(&mut self, truth: &[Truth], weight: f64) -> RawEvent {
        let det = self.det;
        let mut jets = Vec::new();
        let mut muons = Vec::new();
        let (mut met_x, mut met_y) = (0.0, 0.0);

        for obj in truth {
            match *obj {
                Truth::Quark { p4, bottom } => {
                    let scale = self.gauss(1.0, det.jet_resolution).max(0.0);
                    let measured = p4 * scale;
                    // Mismeasurement shows up as fake MET.
                    met_x -= measured[0] - p4[0];
                    met_y -= measured[1] - p4[1];

                    let p = FourMomentum::from_cartesian(measured[0], measured[1], measured[2], measured[3]);
                    if p.pt < det.jet_pt_min || p.eta.abs() > det.jet_eta_max {
                        continue;
                    }
                    let tag_prob = if bottom { det.b_tag_efficiency } else { det.mistag_rate };
                    let mut jet = Jet::new(p, self.rng.gen_bool(tag_prob));
                    jet.jec_uncertainty = det.jec_uncertainty;
                    jets.push(jet);
                }
                Truth::Muon { p4, charge, prompt } => {
                    let p = FourMomentum::from_cartesian(p4[0], p4[1], p4[2], p4[3]);
                    if p.pt < det.muon_pt_min || p.eta.abs() > det.muon_eta_max {
                        continue;
                    }
                    let isolation = if prompt {
                        self.rng.gen_range(0.0..0.06)
                    } else {
                        self.rng.gen_range(0.05..1.0)
                    };
                    muons.push(Muon::new(p, charge, isolation));
                }
                Truth::Neutrino(p4) => {
                    met_x += p4[0];
                    met_y += p4[1];
                }
            }
        }
        met_x += self.gauss(0.0, det.met_resolution);
        met_y += self.gauss(0.0, det.met_resolution);

        jets.sort_by(|a, b| b.p4.pt.total_cmp(&a.p4.pt));
        muons.sort_by(|a, b| b.p4.pt.total_cmp(&a.p4.pt));

        let fired = muons
            .iter()
            .any(|m| m.p4.pt > det.trigger_pt && m.isolation < det.trigger_isolation)
            && self.rng.gen_bool(det.trigger_efficiency);

        RawEvent {
            weight,
            jets,
            muons,
            met: MissingEt::new(met_x, met_y),
            triggers: BTreeMap::from([(TRIGGER.to_string(), fired)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fraction(events: &[RawEvent], pred: impl Fn(&RawEvent) -> bool) -> f64 {
        events.iter().filter(|e| pred(e)).count() as f64 / events.len() as f64
    }

    #[test]
    fn same_seed_same_events() {
        let a = generate_events(Process::Ttbar, 50, 7, 1.0).unwrap();
        let b = generate_events(Process::Ttbar, 50, 7, 1.0).unwrap();
        let c = generate_events(Process::Ttbar, 50, 8, 1.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn mc_sample_is_normalized_to_luminosity() {
        let events = generate_mc_sample(Process::Wjets, 200, 50.0, 1).unwrap();
        let total: f64 = events.iter().map(|e| e.weight).sum();
        assert!((total - 600.0 * 50.0).abs() < 1e-6);
    }

    #[test]
    fn ttbar_is_jet_and_b_rich() {
        let events = generate_events(Process::Ttbar, 500, 3, 1.0).unwrap();
        assert!(fraction(&events, |e| e.jets.len() >= 4) > 0.3);
        assert!(fraction(&events, |e| e.jets.iter().any(|j| j.b_tag)) > 0.5);
        assert!(events.iter().all(|e| e.jets.windows(2).all(|w| w[0].p4.pt >= w[1].p4.pt)));
    }

    #[test]
    fn qcd_rarely_fires_isolated_muon_trigger() {
        let events = generate_events(Process::Qcd, 500, 5, 1.0).unwrap();
        assert!(fraction(&events, |e| e.triggers.get(TRIGGER).copied().unwrap_or(false)) < 0.1);
    }

    #[test]
    fn pseudo_data_has_expected_size() {
        let events = generate_pseudo_data(0.5, 11).unwrap();
        let expected: usize = Process::ALL
            .iter()
            .map(|p| (p.cross_section() * 0.5).round() as usize)
            .sum();
        assert_eq!(events.len(), expected);
        assert!(events.iter().all(|e| e.weight == 1.0));
    }
}
