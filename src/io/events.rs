//! Event sources.
//!
//! The pipeline only needs a sequential producer of events with a defined end
//! of data. `JsonLinesSource` reads one `RawEvent` JSON object per line;
//! `VecSource` serves events already in memory.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::domain::RawEvent;
use crate::error::AppError;

/// A sequential producer of raw events. `None` marks the end of data.
pub trait EventSource {
    fn next_event(&mut self) -> Option<Result<RawEvent, AppError>>;

    /// Drain up to `max` events into `buf`. Returns the number of events read.
    fn fill_batch(&mut self, buf: &mut Vec<RawEvent>, max: usize) -> Result<usize, AppError> {
        let mut n = 0;
        while n < max {
            match self.next_event() {
                Some(ev) => {
                    buf.push(ev?);
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

/// JSON-lines reader. Blank lines are skipped; errors carry the 1-based line number.
pub struct JsonLinesSource<R> {
    reader: R,
    label: String,
    line_no: usize,
    buf: String,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open events file '{}': {e}", path.display())))?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    fn next_event(&mut self) -> Option<Result<RawEvent, AppError>> {
        loop {
            self.buf.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    return Some(Err(AppError::new(
                        2,
                        format!("{}:{}: read error: {e}", self.label, self.line_no),
                    )));
                }
            }
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            return Some(serde_json::from_str(line).map_err(|e| {
                AppError::new(2, format!("{}:{}: invalid event: {e}", self.label, self.line_no))
            }));
        }
    }
}

/// In-memory events, served in order.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    events: std::vec::IntoIter<RawEvent>,
}

impl VecSource {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events: events.into_iter(),
        }
    }
}

impl EventSource for VecSource {
    fn next_event(&mut self) -> Option<Result<RawEvent, AppError>> {
        self.events.next().map(Ok)
    }
}

/// Write events as JSON lines (used by `ttx demo` to materialize toy datasets).
pub fn write_events_jsonl(path: &Path, events: &[RawEvent]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create events file '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    for ev in events {
        serde_json::to_writer(&mut out, ev)
            .map_err(|e| AppError::new(2, format!("Failed to encode event: {e}")))?;
        writeln!(out).map_err(|e| AppError::new(2, format!("Failed to write events file: {e}")))?;
    }
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write events file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const EVENT: &str = r#"{"weight":0.5,"jets":[{"pt":50.0,"eta":0.1,"phi":0.2,"e":51.0,"b_tag":true}],"muons":[],"met":{"px":10.0,"py":-5.0},"triggers":{"IsoMu24":true}}"#;

    #[test]
    fn reads_events_and_skips_blank_lines() {
        let text = format!("{EVENT}\n\n{EVENT}\n");
        let mut src = JsonLinesSource::new(Cursor::new(text), "mem");
        let a = src.next_event().unwrap().unwrap();
        assert_eq!(a.weight, 0.5);
        assert!(a.jets[0].b_tag);
        assert!(src.next_event().unwrap().is_ok());
        assert!(src.next_event().is_none());
    }

    #[test]
    fn parse_errors_carry_line_number() {
        let text = format!("{EVENT}\n\n{{not json\n");
        let mut src = JsonLinesSource::new(Cursor::new(text), "mem");
        assert!(src.next_event().unwrap().is_ok());
        let err = src.next_event().unwrap().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().starts_with("mem:3:"), "{}", err.message());
    }

    #[test]
    fn missing_weight_defaults_to_one() {
        let mut src = JsonLinesSource::new(Cursor::new(r#"{"jets":[],"muons":[],"met":{"px":0.0,"py":0.0}}"#), "mem");
        let ev = src.next_event().unwrap().unwrap();
        assert_eq!(ev.weight, 1.0);
        assert!(ev.triggers.is_empty());
    }

    #[test]
    fn fill_batch_stops_at_end_of_data() {
        let raw: RawEvent = serde_json::from_str(EVENT).unwrap();
        let mut src = VecSource::new(vec![raw.clone(), raw.clone(), raw]);
        let mut buf = Vec::new();
        assert_eq!(src.fill_batch(&mut buf, 2).unwrap(), 2);
        assert_eq!(src.fill_batch(&mut buf, 2).unwrap(), 1);
        assert_eq!(src.fill_batch(&mut buf, 2).unwrap(), 0);
        assert_eq!(buf.len(), 3);
    }
}
