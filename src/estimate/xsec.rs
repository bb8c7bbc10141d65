//! Efficiency, purity and cross-section with error propagation.
//!
//! For one stage:
//!
//! - `e  = N_sel / N_tot`, `δe = sqrt(N_sel / N_tot² + N_sel² / N_tot³)`
//! - `p  = N_sel / N_mc`, same form for `δp`
//! - `xs = (N_data - N_bkg) / (L e)`
//! - `δxs² = (√N_data / eL)² + (√N_bkg / eL)² + ((N_bkg - N_data) δe / (L e²))² + ((N_bkg - N_data) δL / (L² e))²`
//!
//! Every denominator is checked before dividing; a zero yields
//! `EstimateError::ZeroDenominator` instead of an infinity or NaN.

use serde::{Deserialize, Serialize};

use crate::domain::LuminosityConfig;
use crate::error::EstimateError;
use crate::selection::Stage;

/// Integrated luminosity with its absolute uncertainty (pb⁻¹).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Luminosity {
    pub value: f64,
    pub uncertainty: f64,
}

impl Luminosity {
    pub fn new(value: f64, uncertainty: f64) -> Result<Self, EstimateError> {
        if !(value.is_finite() && value > 0.0 && uncertainty.is_finite() && uncertainty >= 0.0) {
            return Err(EstimateError::InvalidLuminosity { value, uncertainty });
        }
        Ok(Self { value, uncertainty })
    }

    pub fn from_config(cfg: &LuminosityConfig) -> Result<Self, EstimateError> {
        Self::new(cfg.value, cfg.value * cfg.rel_uncertainty)
    }
}

/// Weighted yields entering the estimate of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XsInputs {
    pub stage: Stage,
    /// Selected data.
    pub n_data: f64,
    /// Selected background Monte Carlo.
    pub n_bkg: f64,
    /// Selected signal Monte Carlo.
    pub n_sig_sel: f64,
    /// Total (uncut) signal Monte Carlo.
    pub n_sig_tot: f64,
    /// Selected Monte Carlo of all processes.
    pub n_mc_sel: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionResult {
    pub efficiency: f64,
    pub efficiency_err: f64,
    pub purity: f64,
    pub purity_err: f64,
    /// Cross-section in pb.
    pub xs: f64,
    pub xs_err: f64,
    /// `xs_err / xs` as a fraction.
    pub rel_err: f64,
}

impl CrossSectionResult {
    pub fn rel_err_percent(&self) -> f64 {
        self.rel_err * 100.0
    }
}

/// Distance of a measurement to a reference value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceComparison {
    pub reference: f64,
    /// `xs - reference` in pb.
    pub difference: f64,
    /// `|difference / xs_err|`.
    pub significance: f64,
}

/// Ratio `sel / tot` with the binomial-like uncertainty used for both
/// efficiency and purity.
pub fn ratio_with_error(
    selected: f64,
    total: f64,
    quantity: &'static str,
    stage: Stage,
) -> Result<(f64, f64), EstimateError> {
    if total == 0.0 {
        return Err(EstimateError::ZeroDenominator { quantity, stage });
    }
    if !(selected.is_finite() && total.is_finite()) || selected < 0.0 || total < 0.0 || selected > total {
        return Err(EstimateError::MalformedCounters { stage, selected, total });
    }
    let value = selected / total;
    let err = (selected / total.powi(2) + selected.powi(2) / total.powi(3)).sqrt();
    Ok((value, err))
}

/// Efficiency, purity and cross-section for one stage.
pub fn eff_pur_xs(inputs: &XsInputs, lumi: &Luminosity) -> Result<CrossSectionResult, EstimateError> {
    let XsInputs {
        stage,
        n_data,
        n_bkg,
        n_sig_sel,
        n_sig_tot,
        n_mc_sel,
    } = *inputs;

    // Poisson terms need non-negative yields.
    for (selected, total) in [(n_data, n_data), (n_bkg, n_bkg)] {
        if !selected.is_finite() || selected < 0.0 {
            return Err(EstimateError::MalformedCounters { stage, selected, total });
        }
    }
    if !(lumi.value.is_finite() && lumi.value > 0.0) {
        return Err(EstimateError::InvalidLuminosity {
            value: lumi.value,
            uncertainty: lumi.uncertainty,
        });
    }

    let (e, del_e) = ratio_with_error(n_sig_sel, n_sig_tot, "efficiency", stage)?;
    let (p, del_p) = ratio_with_error(n_sig_sel, n_mc_sel, "purity", stage)?;

    let l = lumi.value;
    let el = e * l;
    if el == 0.0 {
        return Err(EstimateError::ZeroDenominator {
            quantity: "luminosity x efficiency",
            stage,
        });
    }

    let xs = (n_data - n_bkg) / el;
    let excess = n_bkg - n_data;
    let del_xs = ((n_data.sqrt() / el).powi(2)
        + (n_bkg.sqrt() / el).powi(2)
        + (excess * del_e / (l * e.powi(2))).powi(2)
        + (excess * lumi.uncertainty / (l.powi(2) * e)).powi(2))
    .sqrt();

    if xs == 0.0 {
        return Err(EstimateError::ZeroDenominator {
            quantity: "relative cross-section uncertainty",
            stage,
        });
    }

    Ok(CrossSectionResult {
        efficiency: e,
        efficiency_err: del_e,
        purity: p,
        purity_err: del_p,
        xs,
        xs_err: del_xs,
        rel_err: del_xs / xs,
    })
}

/// Compare a measured cross-section to a reference value.
///
/// `xs_err` of any successful `eff_pur_xs` result is strictly positive.
pub fn compare_to_reference(result: &CrossSectionResult, reference: f64) -> ReferenceComparison {
    let difference = result.xs - reference;
    ReferenceComparison {
        reference,
        difference,
        significance: (difference / result.xs_err).abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn reference_inputs() -> XsInputs {
        XsInputs {
            stage: Stage::Met,
            n_data: 120.0,
            n_bkg: 20.0,
            n_sig_sel: 60.0,
            n_sig_tot: 1000.0,
            n_mc_sel: 80.0,
        }
    }

    #[test]
    fn matches_hand_computed_reference() {
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        let r = eff_pur_xs(&reference_inputs(), &lumi).unwrap();

        assert_abs_diff_eq!(r.efficiency, 0.06, epsilon = 1e-12);
        assert_abs_diff_eq!(r.efficiency_err, 6.36e-5_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(r.purity, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(r.purity_err, 0.01640625_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(r.xs, 100.0 / 3.0, epsilon = 1e-9);

        // 120/9 + 20/9 + 0.636/0.0324 + 25/9
        let expected_sq: f64 = 120.0 / 9.0 + 20.0 / 9.0 + 0.636 / 0.0324 + 25.0 / 9.0;
        assert_abs_diff_eq!(r.xs_err, expected_sq.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(r.xs_err, 6.161409, epsilon = 1e-4);
        assert_abs_diff_eq!(r.rel_err, r.xs_err / r.xs, epsilon = 1e-15);
        assert_abs_diff_eq!(r.rel_err_percent(), 18.4842, epsilon = 1e-3);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        let a = eff_pur_xs(&reference_inputs(), &lumi).unwrap();
        let b = eff_pur_xs(&reference_inputs(), &lumi).unwrap();
        assert_eq!(a.xs.to_bits(), b.xs.to_bits());
        assert_eq!(a.xs_err.to_bits(), b.xs_err.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn zero_signal_total_is_a_typed_error() {
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        let inputs = XsInputs {
            n_sig_sel: 0.0,
            n_sig_tot: 0.0,
            ..reference_inputs()
        };
        assert_eq!(
            eff_pur_xs(&inputs, &lumi),
            Err(EstimateError::ZeroDenominator {
                quantity: "efficiency",
                stage: Stage::Met
            })
        );
    }

    #[test]
    fn zero_selected_signal_is_a_typed_error() {
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        let inputs = XsInputs {
            n_sig_sel: 0.0,
            ..reference_inputs()
        };
        let err = eff_pur_xs(&inputs, &lumi).unwrap_err();
        assert!(matches!(err, EstimateError::ZeroDenominator { quantity: "luminosity x efficiency", .. }));
    }

    #[test]
    fn zero_mc_denominator_is_a_typed_error() {
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        let inputs = XsInputs {
            n_mc_sel: 0.0,
            ..reference_inputs()
        };
        let err = eff_pur_xs(&inputs, &lumi).unwrap_err();
        assert!(matches!(err, EstimateError::ZeroDenominator { quantity: "purity", .. }));
    }

    #[test]
    fn invalid_luminosity_rejected() {
        assert!(Luminosity::new(0.0, 1.0).is_err());
        assert!(Luminosity::new(50.0, -1.0).is_err());
        let lumi = Luminosity::from_config(&LuminosityConfig::default()).unwrap();
        assert_abs_diff_eq!(lumi.uncertainty, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn comparison_reports_absolute_significance() {
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        let r = eff_pur_xs(&reference_inputs(), &lumi).unwrap();
        let c = compare_to_reference(&r, 173.0);
        assert_abs_diff_eq!(c.difference, 100.0 / 3.0 - 173.0, epsilon = 1e-9);
        assert!(c.significance > 0.0);
        assert_abs_diff_eq!(c.significance, -c.difference / r.xs_err, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn efficiency_is_bounded_for_consistent_counters(tot in 1.0f64..1e6, frac in 0.0f64..=1.0) {
            let sel = tot * frac;
            let (e, de) = ratio_with_error(sel, tot, "efficiency", Stage::Trigger).unwrap();
            prop_assert!((0.0..=1.0).contains(&e));
            prop_assert!(de >= 0.0);
        }

        #[test]
        fn selected_above_total_is_malformed(tot in 1.0f64..1e6, extra in 1e-3f64..1e3) {
            let err = ratio_with_error(tot + extra, tot, "efficiency", Stage::Trigger).unwrap_err();
            let is_malformed = matches!(err, EstimateError::MalformedCounters { .. });
            prop_assert!(is_malformed);
        }
    }
}
