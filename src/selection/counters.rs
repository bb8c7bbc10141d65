//! Weighted per-stage event counters.

use serde::{Deserialize, Serialize};

use crate::selection::Stage;

/// Running sums for one dataset: summed event weight and raw event count per stage.
///
/// Invariant: both sequences are non-increasing in stage order, because an
/// event only reaches stage `k` after passing stages `1..k`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionCounters {
    weights: [f64; Stage::COUNT],
    events: [u64; Stage::COUNT],
}

/// One serialized counter row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: Stage,
    pub weight: f64,
    pub events: u64,
}

impl SelectionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment(&mut self, stage: Stage, weight: f64) {
        self.weights[stage.index()] += weight;
        self.events[stage.index()] += 1;
    }

    /// Summed event weight at `stage`.
    pub fn weight(&self, stage: Stage) -> f64 {
        self.weights[stage.index()]
    }

    /// Number of events (unweighted) at `stage`.
    pub fn events(&self, stage: Stage) -> u64 {
        self.events[stage.index()]
    }

    /// Add another accumulator's counts (batch-parallel runs).
    pub fn merge(&mut self, other: &SelectionCounters) {
        for i in 0..Stage::COUNT {
            self.weights[i] += other.weights[i];
            self.events[i] += other.events[i];
        }
    }

    /// Whether raw counts are non-increasing along the cascade.
    ///
    /// Weighted sums need not be monotone when negative event weights occur,
    /// so only the event counts are checked here.
    pub fn is_monotone(&self) -> bool {
        self.events.windows(2).all(|w| w[0] >= w[1])
    }

    pub fn iter(&self) -> impl Iterator<Item = StageCount> + '_ {
        Stage::ALL.into_iter().map(|stage| StageCount {
            stage,
            weight: self.weight(stage),
            events: self.events(stage),
        })
    }

    pub fn to_rows(&self) -> Vec<StageCount> {
        self.iter().collect()
    }

    /// Rebuild counters from serialized rows. Stages missing from `rows` stay at zero.
    pub fn from_rows(rows: &[StageCount]) -> Self {
        let mut out = Self::default();
        for row in rows {
            out.weights[row.stage.index()] = row.weight;
            out.events[row.stage.index()] = row.events;
        }
        out
    }
}

impl Serialize for SelectionCounters {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SelectionCounters {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<StageCount>::deserialize(deserializer)?;
        Ok(Self::from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_both_weights_and_counts() {
        let mut a = SelectionCounters::new();
        a.increment(Stage::NoCuts, 0.5);
        a.increment(Stage::Trigger, 0.5);
        let mut b = SelectionCounters::new();
        b.increment(Stage::NoCuts, 2.0);

        a.merge(&b);
        assert_eq!(a.weight(Stage::NoCuts), 2.5);
        assert_eq!(a.events(Stage::NoCuts), 2);
        assert_eq!(a.events(Stage::Trigger), 1);
        assert!(a.is_monotone());
    }

    #[test]
    fn serializes_as_ordered_rows() {
        let mut c = SelectionCounters::new();
        c.increment(Stage::NoCuts, 1.25);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.starts_with(r#"[{"stage":"no_cuts","weight":1.25,"events":1}"#));

        let back: SelectionCounters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn detects_non_monotone_counts() {
        let c = SelectionCounters::from_rows(&[
            StageCount { stage: Stage::NoCuts, weight: 1.0, events: 1 },
            StageCount { stage: Stage::Trigger, weight: 2.0, events: 2 },
        ]);
        assert!(!c.is_monotone());
    }
}
