//! Terminal formatting of counters, tables and diagnostics.
//!
//! Everything here returns a `String`; printing is the caller's job.

use crate::estimate::{StageTable, compare_to_reference};
use crate::hist::WindowSummary;
use crate::selection::{DatasetSummary, Stage};

const RULE: &str = "________________________________________________________";

/// Weighted (and raw) counts per stage, one column per dataset.
pub fn format_counters(datasets: &[DatasetSummary]) -> String {
    let mut out = String::new();
    out.push_str("Selection counters (weighted / raw):\n");

    let mut header = format!("{:<18}", "stage");
    for ds in datasets {
        header.push_str(&format!(" {:>24}", truncate(&format!("{} ({})", ds.name, ds.role), 24)));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for stage in Stage::ALL {
        let mut line = format!("{:<18}", stage.label());
        for ds in datasets {
            let cell = format!(
                "{:.2} / {}",
                ds.counters.weight(stage),
                ds.counters.events(stage)
            );
            line.push_str(&format!(" {cell:>24}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Efficiency and purity per stage.
pub fn format_eff_pur(table: &StageTable) -> String {
    let mut out = String::new();
    out.push_str(RULE);
    out.push_str("\nEfficiency and purity of the selection:\n");
    out.push_str(RULE);
    out.push('\n');
    for row in &table.rows {
        match &row.result {
            Ok(r) => out.push_str(&format!(
                "{}: {:.3} +- {:.3}, {:.3} +- {:.3}\n",
                row.stage.label(),
                r.efficiency,
                r.efficiency_err,
                r.purity,
                r.purity_err
            )),
            Err(err) => out.push_str(&format!("{}: n/a ({err})\n", row.stage.label())),
        }
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

/// Cross-section per stage with relative uncertainty in percent.
pub fn format_cross_sections(table: &StageTable) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Cross section of ttbar production after each selection step (L = {:.2} +- {:.2} pb^-1):\n",
        table.luminosity.value, table.luminosity.uncertainty
    ));
    out.push_str(RULE);
    out.push('\n');
    for row in &table.rows {
        match &row.result {
            Ok(r) => out.push_str(&format!(
                "{}: {:.3} +- {:.3} pb, ({:.3}%)\n",
                row.stage.label(),
                r.xs,
                r.xs_err,
                r.rel_err_percent()
            )),
            Err(err) => out.push_str(&format!("{}: n/a ({err})\n", row.stage.label())),
        }
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

/// Difference to a reference cross-section and its significance, per stage.
pub fn format_reference_comparison(table: &StageTable, reference: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Difference to reference value ({reference:.1} pb) and significance:\n"
    ));
    out.push_str(RULE);
    out.push('\n');
    for row in &table.rows {
        if let Ok(r) = &row.result {
            let c = compare_to_reference(r, reference);
            out.push_str(&format!(
                "{}: {:+.3} pb ({:.2} sigma)\n",
                row.stage.label(),
                c.difference,
                c.significance
            ));
        }
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

/// Reconstruction outcome counts per dataset.
pub fn format_reco_diagnostics(datasets: &[DatasetSummary]) -> String {
    let mut out = String::new();
    out.push_str("Top reconstruction:\n");
    out.push_str(&format!(
        "{:<20} {:>10} {:>10} {:>10} {:>10} {:>10} {:>12}\n",
        "dataset", "attempted", "reco", "few_jets", "no_nu", "dm_large", "candidates"
    ));
    for ds in datasets {
        let r = &ds.reco;
        out.push_str(&format!(
            "{:<20} {:>10} {:>10} {:>10} {:>10} {:>10} {:>12}\n",
            truncate(&ds.name, 20),
            r.attempted,
            r.reconstructed,
            r.too_few_jets,
            r.no_neutrino_solution,
            r.mass_difference_too_large,
            r.candidates_evaluated
        ));
    }
    out
}

/// Weighted top-mass summary inside the peak window.
pub fn format_top_mass_window(label: &str, summary: Option<&WindowSummary>) -> String {
    match summary {
        Some(s) => format!(
            "Top mass [{}] in [{:.0}, {:.0}] GeV: sum_w={:.2} mean={:.2} GeV rms={:.2} GeV\n",
            label, s.lo, s.hi, s.sum_weights, s.mean, s.rms
        ),
        None => format!("Top mass [{label}]: no reconstructed events in window\n"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetRole;
    use crate::estimate::{Luminosity, RoleCounters};
    use crate::selection::{SelectionCounters, StageCount};

    fn summary(name: &str, role: DatasetRole, weights: [f64; 6]) -> DatasetSummary {
        let rows: Vec<StageCount> = Stage::ALL
            .into_iter()
            .zip(weights)
            .map(|(stage, weight)| StageCount { stage, weight, events: weight as u64 })
            .collect();
        DatasetSummary {
            name: name.to_string(),
            role,
            counters: SelectionCounters::from_rows(&rows),
            reco: Default::default(),
        }
    }

    fn table(datasets: &[DatasetSummary]) -> StageTable {
        let rc: Vec<RoleCounters> = datasets.iter().map(RoleCounters::from).collect();
        StageTable::build(&rc, &Luminosity::new(50.0, 2.5).unwrap()).unwrap()
    }

    #[test]
    fn cross_section_lines_use_stage_labels() {
        let ds = vec![
            summary("ttbar", DatasetRole::Signal, [1000.0, 800.0, 400.0, 200.0, 100.0, 60.0]),
            summary("wjets", DatasetRole::Background, [5000.0, 900.0, 300.0, 120.0, 40.0, 20.0]),
            summary("data", DatasetRole::Data, [7000.0, 2000.0, 900.0, 400.0, 200.0, 120.0]),
        ];
        let text = format_cross_sections(&table(&ds));
        assert!(text.contains("MET: 33.333 +- 6.161 pb, (18.484%)"), "{text}");
        assert!(text.contains("Total: "));
    }

    #[test]
    fn failed_rows_are_marked() {
        let ds = vec![
            summary("ttbar", DatasetRole::Signal, [100.0, 50.0, 20.0, 10.0, 5.0, 0.0]),
            summary("data", DatasetRole::Data, [300.0, 150.0, 60.0, 30.0, 15.0, 0.0]),
        ];
        let text = format_eff_pur(&table(&ds));
        assert!(text.contains("MET: n/a (zero denominator"), "{text}");
    }

    #[test]
    fn counters_table_has_a_line_per_stage() {
        let ds = vec![summary("ttbar", DatasetRole::Signal, [10.0, 9.0, 8.0, 7.0, 6.0, 5.0])];
        let text = format_counters(&ds);
        assert_eq!(text.lines().count(), 2 + Stage::COUNT);
        assert!(text.contains("10.00 / 10"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
