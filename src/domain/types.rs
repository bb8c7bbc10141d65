//! Physics object model.
//!
//! Per-event value types. They carry no behavior beyond derived kinematic
//! quantities; everything that *decides* something (cuts, reconstruction)
//! lives in `selection` and `reco`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{LorentzVector, lorentz};

/// Four-momentum in collider coordinates: `(pT, η, φ, E)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FourMomentum {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub e: f64,
}

impl FourMomentum {
    pub fn new(pt: f64, eta: f64, phi: f64, e: f64) -> Self {
        Self { pt, eta, phi, e }
    }

    /// Build from Cartesian components.
    ///
    /// A purely longitudinal vector has no defined η; we store it with `pt = 0`
    /// and a large signed η so that `pz` is still recovered approximately.
    pub fn from_cartesian(px: f64, py: f64, pz: f64, e: f64) -> Self {
        let pt = px.hypot(py);
        let phi = if pt > 0.0 { py.atan2(px) } else { 0.0 };
        let eta = if pt > 0.0 {
            (pz / pt).asinh()
        } else if pz == 0.0 {
            0.0
        } else {
            pz.signum() * 1e3
        };
        Self { pt, eta, phi, e }
    }

    pub fn px(&self) -> f64 {
        self.pt * self.phi.cos()
    }

    pub fn py(&self) -> f64 {
        self.pt * self.phi.sin()
    }

    pub fn pz(&self) -> f64 {
        self.pt * self.eta.sinh()
    }

    pub fn mass(&self) -> f64 {
        crate::math::mass_of(&self.to_lorentz())
    }

    pub fn to_lorentz(&self) -> LorentzVector {
        lorentz(self.px(), self.py(), self.pz(), self.e)
    }

    /// Scale the momentum and energy by a common factor (direction unchanged).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            pt: self.pt * factor,
            eta: self.eta,
            phi: self.phi,
            e: self.e * factor,
        }
    }
}

/// A reconstructed jet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    #[serde(flatten)]
    pub p4: FourMomentum,
    #[serde(default)]
    pub b_tag: bool,
    /// Fractional jet-energy-scale uncertainty (used for up/down variations).
    #[serde(default)]
    pub jec_uncertainty: f64,
}

impl Jet {
    pub fn new(p4: FourMomentum, b_tag: bool) -> Self {
        Self {
            p4,
            b_tag,
            jec_uncertainty: 0.0,
        }
    }
}

/// A reconstructed muon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Muon {
    #[serde(flatten)]
    pub p4: FourMomentum,
    #[serde(default)]
    pub charge: i8,
    /// Relative isolation (smaller is more isolated).
    #[serde(default)]
    pub isolation: f64,
}

impl Muon {
    pub fn new(p4: FourMomentum, charge: i8, isolation: f64) -> Self {
        Self { p4, charge, isolation }
    }
}

/// Missing transverse momentum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MissingEt {
    pub px: f64,
    pub py: f64,
}

impl MissingEt {
    pub fn new(px: f64, py: f64) -> Self {
        Self { px, py }
    }

    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }
}

/// One input record as read from an event source (before event options apply).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default = "unit_weight")]
    pub weight: f64,
    #[serde(default)]
    pub jets: Vec<Jet>,
    #[serde(default)]
    pub muons: Vec<Muon>,
    #[serde(default)]
    pub met: MissingEt,
    #[serde(default)]
    pub triggers: BTreeMap<String, bool>,
}

fn unit_weight() -> f64 {
    1.0
}

/// A fully built event, ready for the selection cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsEvent {
    pub weight: f64,
    /// Jets in descending pT order (sorted by `EventOptions::build`).
    pub jets: Vec<Jet>,
    pub muons: Vec<Muon>,
    pub met: MissingEt,
    pub triggers: BTreeMap<String, bool>,
    /// Reconstructed top mass; `None` until a reconstruction succeeds.
    pub top_mass: Option<f64>,
}

impl PhysicsEvent {
    pub fn n_jets(&self) -> usize {
        self.jets.len()
    }

    pub fn n_muons(&self) -> usize {
        self.muons.len()
    }

    /// The b-tagged subset, in jet order.
    pub fn b_jets(&self) -> impl Iterator<Item = &Jet> {
        self.jets.iter().filter(|j| j.b_tag)
    }

    pub fn n_b_jets(&self) -> usize {
        self.b_jets().count()
    }

    /// Trigger decision by name; absent triggers count as not fired.
    pub fn trigger(&self, name: &str) -> bool {
        self.triggers.get(name).copied().unwrap_or(false)
    }
}

/// Role of a dataset in the cross-section measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetRole {
    /// The simulated signal process (tt̄).
    Signal,
    /// Any simulated background process.
    Background,
    /// Recorded collision data.
    Data,
}

impl DatasetRole {
    /// Simulated samples (signal and backgrounds).
    pub fn is_mc(self) -> bool {
        matches!(self, DatasetRole::Signal | DatasetRole::Background)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DatasetRole::Signal => "signal",
            DatasetRole::Background => "background",
            DatasetRole::Data => "data",
        }
    }
}

impl std::fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
