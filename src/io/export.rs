//! CSV exports of the stage table and the histogram book.
//!
//! Both are meant for spreadsheets or downstream plotting scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::AppError;
use crate::estimate::StageTable;
use crate::hist::HistogramBook;

/// Write one row per stage: group yields, then efficiency / purity / cross-section.
///
/// Stages whose estimate failed keep their yields and leave the result columns
/// empty; the `error` column names the failure.
pub fn write_table_csv(path: &Path, table: &StageTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    let io_err = |e: std::io::Error| AppError::new(2, format!("Failed to write export CSV: {e}"));

    writeln!(
        out,
        "stage,signal,background,mc,data,all,efficiency,efficiency_err,purity,purity_err,xs_pb,xs_err_pb,rel_err,error"
    )
    .map_err(io_err)?;

    for row in &table.rows {
        let y = &row.yields;
        write!(
            out,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},",
            row.stage.name(),
            y.signal,
            y.background,
            y.mc,
            y.data,
            y.all
        )
        .map_err(io_err)?;
        let written = match &row.result {
            Ok(r) => writeln!(
                out,
                "{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},",
                r.efficiency, r.efficiency_err, r.purity, r.purity_err, r.xs, r.xs_err, r.rel_err
            ),
            Err(err) => writeln!(out, ",,,,,,,\"{err}\""),
        };
        written.map_err(io_err)?;
    }

    out.flush().map_err(io_err)?;
    Ok(())
}

/// Write every booked histogram in long format: `slot,bin,lo,hi,content`.
///
/// Underflow and overflow rows use bin labels `underflow` and `overflow`.
pub fn write_histograms_csv(path: &Path, book: &HistogramBook) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create histogram CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    let io_err = |e: std::io::Error| AppError::new(2, format!("Failed to write histogram CSV: {e}"));

    writeln!(out, "slot,bin,lo,hi,content").map_err(io_err)?;
    for (slot, h) in book.iter() {
        let key = slot.key();
        writeln!(out, "{key},underflow,,{},{}", h.lo, h.underflow).map_err(io_err)?;
        let width = h.bin_width();
        for (idx, content) in h.bins.iter().enumerate() {
            let lo = h.lo + idx as f64 * width;
            writeln!(out, "{key},{idx},{lo},{},{content}", lo + width).map_err(io_err)?;
        }
        writeln!(out, "{key},overflow,{},,{}", h.hi, h.overflow).map_err(io_err)?;
    }

    out.flush().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetRole;
    use crate::estimate::{Luminosity, RoleCounters};
    use crate::hist::{HistSlot, HistogramSink};
    use crate::selection::{SelectionCounters, Stage, StageCount};

    fn counters(weights: [f64; 6]) -> SelectionCounters {
        let rows: Vec<StageCount> = Stage::ALL
            .into_iter()
            .zip(weights)
            .map(|(stage, weight)| StageCount { stage, weight, events: weight as u64 })
            .collect();
        SelectionCounters::from_rows(&rows)
    }

    #[test]
    fn table_csv_has_one_row_per_stage() {
        let sig = counters([100.0, 50.0, 20.0, 10.0, 5.0, 0.0]);
        let data = counters([300.0, 150.0, 60.0, 30.0, 15.0, 0.0]);
        let datasets = [
            RoleCounters { role: DatasetRole::Signal, counters: &sig },
            RoleCounters { role: DatasetRole::Data, counters: &data },
        ];
        let table = StageTable::build(&datasets, &Luminosity::new(50.0, 2.5).unwrap()).unwrap();

        let path = std::env::temp_dir().join(format!("ttx-table-{}.csv", std::process::id()));
        write_table_csv(&path, &table).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + Stage::COUNT);
        assert!(lines[1].starts_with("no_cuts,100.000000,"));
        assert!(lines[6].starts_with("met,"));
        assert!(lines[6].contains("zero denominator"));
    }

    #[test]
    fn histogram_csv_lists_every_bin() {
        let mut book = HistogramBook::new();
        book.fill(&HistSlot::top_mass(), 171.0, 1.0);
        let path = std::env::temp_dir().join(format!("ttx-hist-{}.csv", std::process::id()));
        write_histograms_csv(&path, &book).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        // header + underflow + 120 bins + overflow
        assert_eq!(text.lines().count(), 1 + 1 + 120 + 1);
        assert!(text.contains("top_mass,68,"));
    }
}
