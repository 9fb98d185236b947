//! Scoring policy: per-kind weights and thresholds

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use violation_model::ViolationKind;

/// Weight applied to kinds missing from the table
pub const UNLISTED_WEIGHT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Trust debit added per reported kind. Configured entries override the
    /// default table; kinds not mentioned keep their default weight.
    #[serde(deserialize_with = "weights_over_defaults")]
    pub weights: HashMap<ViolationKind, u32>,
    /// Total at or above which the session escalates (default: 10)
    pub escalation_threshold: u32,
    /// Violations weighing at least this much land in the severe log (default: 5)
    pub severe_weight: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        use ViolationKind::*;

        let weights = [
            (FullscreenExit, 20),
            (WindowMinimized, 20),
            (NoFaceDetected, 15),
            (SuspiciousObject, 15),
            (MultipleFaces, 10),
            (TabSwitch, 10),
            (WindowLostFocus, 8),
            (MouseLeft, 5),
            (ExcessiveMovement, 4),
            (EyesClosed, 4),
            (LookingAway, 3),
            (BlockedKey, 3),
            (RightClick, 2),
        ]
        .into_iter()
        .collect();

        Self {
            weights,
            escalation_threshold: 10,
            severe_weight: 5,
        }
    }
}

fn weights_over_defaults<'de, D>(deserializer: D) -> Result<HashMap<ViolationKind, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = HashMap::<String, u32>::deserialize(deserializer)?;
    let mut weights = ScoringPolicy::default().weights;
    for (name, weight) in overrides {
        let kind = name.parse::<ViolationKind>().map_err(serde::de::Error::custom)?;
        weights.insert(kind, weight);
    }
    Ok(weights)
}

impl ScoringPolicy {
    pub fn weight(&self, kind: ViolationKind) -> u32 {
        self.weights.get(&kind).copied().unwrap_or(UNLISTED_WEIGHT)
    }

    pub fn is_severe(&self, kind: ViolationKind) -> bool {
        self.weight(kind) >= self.severe_weight
    }

    /// Kinds that fall back to the unlisted weight
    pub fn unweighted_kinds(&self) -> Vec<ViolationKind> {
        ViolationKind::ALL
            .into_iter()
            .filter(|kind| !self.weights.contains_key(kind))
            .collect()
    }
}
