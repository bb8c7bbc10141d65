//! Selection stages in cascade order.

use serde::{Deserialize, Serialize};

/// One step of the cut cascade.
///
/// The declaration order is the evaluation order and must not change: the
/// muon stage is what guarantees a leading muon exists for the reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    NoCuts,
    Trigger,
    #[serde(rename = "n_jets")]
    JetCount,
    #[serde(rename = "n_muon")]
    MuonCount,
    #[serde(rename = "n_b_jets")]
    BJetCount,
    Met,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::NoCuts,
        Stage::Trigger,
        Stage::JetCount,
        Stage::MuonCount,
        Stage::BJetCount,
        Stage::Met,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position in the cascade (0 = no cuts).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short machine name (histogram slots, exports).
    pub fn name(self) -> &'static str {
        match self {
            Stage::NoCuts => "no_cuts",
            Stage::Trigger => "trigger",
            Stage::JetCount => "n_jets",
            Stage::MuonCount => "n_muon",
            Stage::BJetCount => "n_b_jets",
            Stage::Met => "met",
        }
    }

    /// Human-readable label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Stage::NoCuts => "Total",
            Stage::Trigger => "Trigger",
            Stage::JetCount => "Number of jets",
            Stage::MuonCount => "Number of muons",
            Stage::BJetCount => "Number of b jets",
            Stage::Met => "MET",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_cascade_order() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn serde_uses_short_names() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.name()));
        }
    }
}
