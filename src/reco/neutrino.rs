//! Neutrino longitudinal momentum from the W-mass constraint.
//!
//! The neutrino transverse momentum is taken from the missing transverse
//! momentum. Requiring `m(ℓ, ν) = m_W` for a massless neutrino gives a
//! quadratic in `pz_ν`:
//!
//! ```text
//! A  = (m_W² - m_ℓ²) / 2 + pxℓ·pxν + pyℓ·pyν
//! a  = Eℓ² - pzℓ²
//! pz = (A·pzℓ ± Eℓ·sqrt(A² - a·pTν²)) / a
//! ```

use crate::domain::{ComplexRootPolicy, FourMomentum, MissingEt, NeutrinoRootPolicy};
use crate::math::{LorentzVector, lorentz};

const DISC_REL_TOL: f64 = 1e-12;

/// Solutions of the W-mass constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PzRoots {
    /// Two real roots (equal when the discriminant is zero).
    Real(f64, f64),
    /// Negative discriminant; carries the real part of the complex pair.
    Complex { real: f64 },
    /// The lepton has no transverse mass; the constraint is not a quadratic.
    Degenerate,
}

/// Solve the W-mass constraint for the neutrino `pz`.
pub fn solve_neutrino_pz(lepton: &FourMomentum, met: &MissingEt, w_mass: f64) -> PzRoots {
    let lep = lepton.to_lorentz();
    let (px_l, py_l, pz_l, e_l) = (lep[0], lep[1], lep[2], lep[3]);
    let m_l2 = crate::math::mass_squared(&lep).max(0.0);

    let a = e_l * e_l - pz_l * pz_l;
    if !(a > 1e-12) {
        return PzRoots::Degenerate;
    }

    let big_a = 0.5 * (w_mass * w_mass - m_l2) + px_l * met.px + py_l * met.py;
    let pt_nu2 = met.px * met.px + met.py * met.py;
    let mut disc = big_a * big_a - a * pt_nu2;
    // A vanishing discriminant is a double root; do not let rounding split it.
    if disc.abs() <= DISC_REL_TOL * (big_a * big_a).max(1.0) {
        disc = 0.0;
    }

    let center = big_a * pz_l / a;
    if disc < 0.0 {
        return PzRoots::Complex { real: center };
    }
    let half_width = e_l * disc.sqrt() / a;
    PzRoots::Real(center + half_width, center - half_width)
}

/// The `pz` values to try, after applying the configured root policies.
pub fn candidate_pz(roots: PzRoots, root_policy: NeutrinoRootPolicy, complex_policy: ComplexRootPolicy) -> Vec<f64> {
    match roots {
        PzRoots::Degenerate => Vec::new(),
        PzRoots::Complex { real } => match complex_policy {
            ComplexRootPolicy::Reject => Vec::new(),
            ComplexRootPolicy::RealPart => vec![real],
        },
        PzRoots::Real(r1, r2) => {
            if r1 == r2 {
                return vec![r1];
            }
            match root_policy {
                NeutrinoRootPolicy::BestMassMatch => vec![r1, r2],
                NeutrinoRootPolicy::SmallerMagnitude => {
                    if r2.abs() < r1.abs() {
                        vec![r2]
                    } else {
                        vec![r1]
                    }
                }
            }
        }
    }
}

/// Massless neutrino four-vector with transverse momentum from `met`.
pub fn neutrino_vector(met: &MissingEt, pz: f64) -> LorentzVector {
    let e = (met.px * met.px + met.py * met.py + pz * pz).sqrt();
    lorentz(met.px, met.py, pz, e)
}
