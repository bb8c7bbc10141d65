//! Standard per-stage observables.

use crate::domain::{FourMomentum, PhysicsEvent};
use crate::hist::{HistSlot, HistogramSink};
use crate::selection::Stage;

const MUON_VARS: [[&str; 3]; 1] = [["muon1_pt", "muon1_eta", "muon1_phi"]];
const JET_VARS: [[&str; 3]; 3] = [
    ["jet1_pt", "jet1_eta", "jet1_phi"],
    ["jet2_pt", "jet2_eta", "jet2_phi"],
    ["jet3_pt", "jet3_eta", "jet3_phi"],
];
const BJET_VARS: [[&str; 3]; 2] = [
    ["bjet1_pt", "bjet1_eta", "bjet1_phi"],
    ["bjet2_pt", "bjet2_eta", "bjet2_phi"],
];

/// Fill the standard observable set for an event that reached `stage`.
///
/// Leading-object variables are only filled for objects that exist, so this is
/// safe on events with empty collections.
pub fn fill_observables<S: HistogramSink + ?Sized>(stage: Stage, event: &PhysicsEvent, sink: &mut S) {
    let w = event.weight;

    sink.fill(&HistSlot::at(stage, "muons_number"), event.n_muons() as f64, w);
    fill_leading(stage, event.muons.iter().map(|m| &m.p4), &MUON_VARS, w, sink);

    sink.fill(&HistSlot::at(stage, "jets_number"), event.n_jets() as f64, w);
    fill_leading(stage, event.jets.iter().map(|j| &j.p4), &JET_VARS, w, sink);

    sink.fill(&HistSlot::at(stage, "met_pt"), event.met.pt(), w);
    sink.fill(&HistSlot::at(stage, "met_phi"), event.met.phi(), w);

    sink.fill(&HistSlot::at(stage, "bjets_number"), event.n_b_jets() as f64, w);
    fill_leading(stage, event.b_jets().map(|j| &j.p4), &BJET_VARS, w, sink);
}

fn fill_leading<'a, S: HistogramSink + ?Sized>(
    stage: Stage,
    objects: impl Iterator<Item = &'a FourMomentum>,
    vars: &[[&'static str; 3]],
    weight: f64,
    sink: &mut S,
) {
    for (p4, [pt, eta, phi]) in objects.zip(vars.iter().copied()) {
        sink.fill(&HistSlot::at(stage, pt), p4.pt, weight);
        sink.fill(&HistSlot::at(stage, eta), p4.eta, weight);
        sink.fill(&HistSlot::at(stage, phi), p4.phi, weight);
    }
}
