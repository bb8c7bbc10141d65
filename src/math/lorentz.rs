//! Lorentz-vector helpers.
//!
//! Four-vectors are stored as `nalgebra::Vector4<f64>` in `(px, py, pz, E)`
//! order. Combinations are plain vector sums; the invariant mass is the
//! Minkowski norm with metric `(-, -, -, +)`.

use nalgebra::{Vector3, Vector4};

pub type LorentzVector = Vector4<f64>;

/// Index of the energy component.
pub const E: usize = 3;

/// Build a Lorentz vector from Cartesian components.
pub fn lorentz(px: f64, py: f64, pz: f64, e: f64) -> LorentzVector {
    Vector4::new(px, py, pz, e)
}

/// Squared invariant mass `E² - |p|²` (may be slightly negative from rounding).
pub fn mass_squared(v: &LorentzVector) -> f64 {
    v[E] * v[E] - (v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
}

/// Invariant mass, clamped at zero for space-like rounding noise.
pub fn mass_of(v: &LorentzVector) -> f64 {
    mass_squared(v).max(0.0).sqrt()
}

/// Invariant mass of the summed four-momenta.
pub fn invariant_mass(parts: &[LorentzVector]) -> f64 {
    let total = parts.iter().fold(LorentzVector::zeros(), |acc, v| acc + v);
    mass_of(&total)
}

/// Velocity `p / E` of a time-like vector.
pub fn velocity(v: &LorentzVector) -> Vector3<f64> {
    Vector3::new(v[0], v[1], v[2]) / v[E]
}

/// Boost `v` by velocity `beta` (`|beta| < 1`).
pub fn boost(v: &LorentzVector, beta: &Vector3<f64>) -> LorentzVector {
    let b2 = beta.norm_squared();
    if b2 <= 0.0 {
        return *v;
    }
    let gamma = 1.0 / (1.0 - b2).sqrt();
    let p = Vector3::new(v[0], v[1], v[2]);
    let bp = beta.dot(&p);
    let coef = (gamma - 1.0) * bp / b2 + gamma * v[E];
    let p_out = p + beta * coef;
    lorentz(p_out.x, p_out.y, p_out.z, gamma * (v[E] + bp))
}

/// Two-body decay of a parent of mass `m` at rest into masses `m1`, `m2`,
/// along unit direction `dir`. Returns `None` below threshold.
pub fn two_body_decay(m: f64, m1: f64, m2: f64, dir: &Vector3<f64>) -> Option<(LorentzVector, LorentzVector)> {
    if m < m1 + m2 {
        return None;
    }
    let p = ((m * m - (m1 + m2).powi(2)) * (m * m - (m1 - m2).powi(2))).sqrt() / (2.0 * m);
    let d = dir.normalize() * p;
    let a = lorentz(d.x, d.y, d.z, (p * p + m1 * m1).sqrt());
    let b = lorentz(-d.x, -d.y, -d.z, (p * p + m2 * m2).sqrt());
    Some((a, b))
}
