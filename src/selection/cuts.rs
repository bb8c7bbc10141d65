//! Stage predicates.
//!
//! Each predicate reads only the event fields its stage is about. The muon
//! predicate hands back the leading muon itself, so later code never indexes
//! into the muon list.

use crate::domain::{Muon, PhysicsEvent, SelectionConfig};

pub fn passes_trigger(cfg: &SelectionConfig, event: &PhysicsEvent) -> bool {
    event.trigger(&cfg.trigger_name)
}

pub fn passes_jet_count(cfg: &SelectionConfig, event: &PhysicsEvent) -> bool {
    cfg.jet_count.contains(event.n_jets())
}

/// The leading muon, if the muon multiplicity is accepted.
pub fn leading_muon(cfg: &SelectionConfig, event: &PhysicsEvent) -> Option<Muon> {
    if !cfg.muon_count.contains(event.n_muons()) {
        return None;
    }
    event.muons.first().copied()
}

pub fn passes_b_jet_count(cfg: &SelectionConfig, event: &PhysicsEvent) -> bool {
    cfg.b_jet_count.contains(event.n_b_jets())
}

pub fn passes_met(cfg: &SelectionConfig, event: &PhysicsEvent) -> bool {
    event.met.pt() >= cfg.met_threshold
}
