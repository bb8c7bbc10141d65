//! Per-stage yields and cross-section table across all datasets.

use serde::Serialize;

use crate::domain::DatasetRole;
use crate::error::EstimateError;
use crate::estimate::{CrossSectionResult, Luminosity, XsInputs, eff_pur_xs};
use crate::selection::{DatasetSummary, SelectionCounters, Stage};

/// Frozen counters of one dataset, tagged with its role.
#[derive(Debug, Clone, Copy)]
pub struct RoleCounters<'a> {
    pub role: DatasetRole,
    pub counters: &'a SelectionCounters,
}

impl<'a> From<&'a DatasetSummary> for RoleCounters<'a> {
    fn from(summary: &'a DatasetSummary) -> Self {
        Self {
            role: summary.role,
            counters: &summary.counters,
        }
    }
}

/// Summed weights of every dataset group at one stage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GroupYields {
    pub signal: f64,
    pub background: f64,
    /// Signal + background.
    pub mc: f64,
    pub data: f64,
    /// Every dataset, data included.
    pub all: f64,
}

impl GroupYields {
    pub fn at(stage: Stage, datasets: &[RoleCounters<'_>]) -> Self {
        let mut y = GroupYields::default();
        for ds in datasets {
            let w = ds.counters.weight(stage);
            match ds.role {
                DatasetRole::Signal => y.signal += w,
                DatasetRole::Background => y.background += w,
                DatasetRole::Data => y.data += w,
            }
            if ds.role.is_mc() {
                y.mc += w;
            }
            y.all += w;
        }
        y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageRow {
    pub stage: Stage,
    pub yields: GroupYields,
    pub result: Result<CrossSectionResult, EstimateError>,
}

/// The efficiency / purity / cross-section table, one row per stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTable {
    pub luminosity: Luminosity,
    pub rows: Vec<StageRow>,
}

impl StageTable {
    /// Build the table from frozen counters.
    ///
    /// Fails as a whole when no signal or no data dataset is present; a
    /// degenerate stage only fails its own row.
    pub fn build(datasets: &[RoleCounters<'_>], lumi: &Luminosity) -> Result<Self, EstimateError> {
        for role in [DatasetRole::Signal, DatasetRole::Data] {
            if !datasets.iter().any(|d| d.role == role) {
                return Err(EstimateError::MissingRole(role));
            }
        }

        let n_sig_tot = GroupYields::at(Stage::NoCuts, datasets).signal;
        let rows = Stage::ALL
            .into_iter()
            .map(|stage| {
                let yields = GroupYields::at(stage, datasets);
                let inputs = XsInputs {
                    stage,
                    n_data: yields.data,
                    n_bkg: yields.background,
                    n_sig_sel: yields.signal,
                    n_sig_tot,
                    n_mc_sel: yields.mc,
                };
                StageRow {
                    stage,
                    yields,
                    result: eff_pur_xs(&inputs, lumi),
                }
            })
            .collect();

        Ok(Self {
            luminosity: *lumi,
            rows,
        })
    }

    pub fn row(&self, stage: Stage) -> Option<&StageRow> {
        self.rows.iter().find(|r| r.stage == stage)
    }

    /// The result after the full cascade.
    pub fn final_result(&self) -> Option<&CrossSectionResult> {
        self.row(Stage::Met).and_then(|r| r.result.as_ref().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::StageCount;
    use approx::assert_abs_diff_eq;

    fn counters(weights: [f64; 6]) -> SelectionCounters {
        let rows: Vec<StageCount> = Stage::ALL
            .into_iter()
            .zip(weights)
            .map(|(stage, weight)| StageCount {
                stage,
                weight,
                events: weight.round() as u64,
            })
            .collect();
        SelectionCounters::from_rows(&rows)
    }

    #[test]
    fn final_row_reproduces_reference_scenario() {
        let sig = counters([1000.0, 800.0, 400.0, 200.0, 100.0, 60.0]);
        let bkg = counters([5000.0, 900.0, 300.0, 120.0, 40.0, 20.0]);
        let data = counters([7000.0, 2000.0, 900.0, 400.0, 200.0, 120.0]);
        let datasets = [
            RoleCounters { role: DatasetRole::Signal, counters: &sig },
            RoleCounters { role: DatasetRole::Background, counters: &bkg },
            RoleCounters { role: DatasetRole::Data, counters: &data },
        ];
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        let table = StageTable::build(&datasets, &lumi).unwrap();

        assert_eq!(table.rows.len(), Stage::COUNT);
        let met = table.row(Stage::Met).unwrap();
        assert_eq!(met.yields.mc, 80.0);
        assert_eq!(met.yields.all, 200.0);
        let r = table.final_result().unwrap();
        assert_abs_diff_eq!(r.xs, 100.0 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.xs_err, 6.161409, epsilon = 1e-4);

        let total = table.row(Stage::NoCuts).unwrap().result.as_ref().unwrap();
        assert_eq!(total.efficiency, 1.0);
    }

    #[test]
    fn backgrounds_are_summed_by_role() {
        let sig = counters([10.0; 6]);
        let b1 = counters([3.0; 6]);
        let b2 = counters([4.0; 6]);
        let data = counters([20.0; 6]);
        let datasets = [
            RoleCounters { role: DatasetRole::Background, counters: &b1 },
            RoleCounters { role: DatasetRole::Signal, counters: &sig },
            RoleCounters { role: DatasetRole::Background, counters: &b2 },
            RoleCounters { role: DatasetRole::Data, counters: &data },
        ];
        let y = GroupYields::at(Stage::Trigger, &datasets);
        assert_eq!(y.background, 7.0);
        assert_eq!(y.mc, 17.0);
        assert_eq!(y.all, 37.0);
    }

    #[test]
    fn missing_data_fails_whole_table() {
        let sig = counters([10.0; 6]);
        let datasets = [RoleCounters { role: DatasetRole::Signal, counters: &sig }];
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        assert_eq!(
            StageTable::build(&datasets, &lumi),
            Err(EstimateError::MissingRole(DatasetRole::Data))
        );
    }

    #[test]
    fn empty_stage_fails_only_its_row() {
        let sig = counters([100.0, 50.0, 20.0, 10.0, 5.0, 0.0]);
        let data = counters([300.0, 150.0, 60.0, 30.0, 15.0, 0.0]);
        let datasets = [
            RoleCounters { role: DatasetRole::Signal, counters: &sig },
            RoleCounters { role: DatasetRole::Data, counters: &data },
        ];
        let lumi = Luminosity::new(50.0, 2.5).unwrap();
        let table = StageTable::build(&datasets, &lumi).unwrap();

        assert!(table.row(Stage::BJetCount).unwrap().result.is_ok());
        assert!(matches!(
            table.row(Stage::Met).unwrap().result,
            Err(EstimateError::ZeroDenominator { stage: Stage::Met, .. })
        ));
        assert!(table.final_result().is_none());
    }
}
