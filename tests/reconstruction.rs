use std::f64::consts::PI;

use proptest::prelude::*;
use ttbar_xs::domain::{FourMomentum, Jet, MissingEt, Muon, ReconstructionConfig};
use ttbar_xs::reco::{RecoFailure, RecoOutcome, TopReconstructor};

const MW: f64 = 80.4;

fn massless_jet(e: f64, phi: f64) -> Jet {
    Jet::new(FourMomentum::new(e, 0.0, phi, e), false)
}

/// W at rest decaying along x; a b-jet completing m(l nu b) = `m_lep`; three
/// jets at 120° spacing with invariant mass `m_had`.
fn event(m_had: f64, m_lep: f64) -> (Vec<Jet>, MissingEt, Muon) {
    let lepton = Muon::new(FourMomentum::new(MW / 2.0, 0.0, 0.0, MW / 2.0), 1, 0.0);
    let met = MissingEt::new(-MW / 2.0, 0.0);
    let e_b = (m_lep * m_lep - MW * MW) / (2.0 * MW);
    let jets = vec![
        massless_jet(e_b, 1.0),
        massless_jet(m_had / 3.0, 0.0),
        massless_jet(m_had / 3.0, 2.0 * PI / 3.0),
        massless_jet(m_had / 3.0, -2.0 * PI / 3.0),
    ];
    (jets, met, lepton)
}

proptest! {
    #[test]
    fn returned_mass_never_exceeds_threshold(
        m_had in 120.0f64..220.0,
        m_lep in 120.0f64..220.0,
        max_diff in 0.0f64..40.0,
    ) {
        let (jets, met, lepton) = event(m_had, m_lep);
        let reco = TopReconstructor::new(ReconstructionConfig::new(max_diff, 4, 4)).unwrap();
        let out = reco.reconstruct(&jets, &met, &lepton);

        match &out.outcome {
            RecoOutcome::Reconstructed(c) => {
                prop_assert!(c.mass_difference <= max_diff);
                prop_assert!(((c.hadronic_mass - c.leptonic_mass).abs() - c.mass_difference).abs() < 1e-9);
                prop_assert!((c.mass - 0.5 * (c.hadronic_mass + c.leptonic_mass)).abs() < 1e-9);
            }
            RecoOutcome::NotReconstructed(RecoFailure::MassDifferenceTooLarge { best }) => {
                prop_assert!(*best > max_diff);
                // The true assignment alone would have qualified otherwise.
                prop_assert!((m_had - m_lep).abs() > max_diff - 1e-6);
            }
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn balanced_event_returns_true_mass(m in 140.0f64..210.0, max_diff in 0.5f64..20.0) {
        let (jets, met, lepton) = event(m, m);
        let reco = TopReconstructor::new(ReconstructionConfig::new(max_diff, 4, 4)).unwrap();
        let out = reco.reconstruct(&jets, &met, &lepton);
        let mass = out.mass();
        prop_assert!(mass.is_some());
        prop_assert!((mass.unwrap_or_default() - m).abs() < 1e-6);
    }

    #[test]
    fn too_few_jets_never_evaluates(n in 0usize..4, max_diff in 0.0f64..50.0) {
        let (jets, met, lepton) = event(170.0, 172.0);
        let reco = TopReconstructor::new(ReconstructionConfig::new(max_diff, 4, 4)).unwrap();
        let out = reco.reconstruct(&jets[..n], &met, &lepton);
        prop_assert_eq!(out.candidates_evaluated, 0);
        let too_few = matches!(out.outcome, RecoOutcome::NotReconstructed(RecoFailure::TooFewJets { .. }));
        prop_assert!(too_few);
    }
}

#[test]
fn wider_jet_window_evaluates_more_candidates() {
    let (mut jets, met, lepton) = event(170.0, 172.0);
    jets.push(massless_jet(25.0, 2.5));
    let narrow = TopReconstructor::new(ReconstructionConfig::new(10.0, 4, 4)).unwrap();
    let wide = TopReconstructor::new(ReconstructionConfig::new(10.0, 3, 5)).unwrap();

    let a = narrow.reconstruct(&jets, &met, &lepton);
    let b = wide.reconstruct(&jets, &met, &lepton);
    assert!(b.candidates_evaluated > a.candidates_evaluated);
    // A larger search can only find an equal or smaller mass difference.
    let diff = |r: &ttbar_xs::reco::Reconstruction| match &r.outcome {
        RecoOutcome::Reconstructed(c) => c.mass_difference,
        _ => f64::INFINITY,
    };
    assert!(diff(&b) <= diff(&a));
}
