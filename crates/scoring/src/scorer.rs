//! Cumulative trust debit

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use violation_model::{DetectionEvent, Severity, ViolationKind};

use crate::policy::ScoringPolicy;

/// Trust debit for one session. Never decremented.
#[derive(Debug, Clone, Default)]
pub struct RunningScore {
    total: u32,
    severe_log: Vec<DetectionEvent>,
}

impl RunningScore {
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Violations at or above the severe weight, in report order
    pub fn severe_log(&self) -> &[DetectionEvent] {
        &self.severe_log
    }
}

/// Counts per severity and per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub total: u32,
    pub violations: u32,
    pub by_severity: BTreeMap<Severity, u32>,
    pub by_kind: BTreeMap<ViolationKind, u32>,
}

pub struct ViolationScorer {
    policy: ScoringPolicy,
    score: RunningScore,
    summary: ScoreSummary,
}

impl ViolationScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            policy,
            score: RunningScore::default(),
            summary: ScoreSummary::default(),
        }
    }

    /// Add the event's weight to the total. Returns the weight applied.
    pub fn record(&mut self, event: &DetectionEvent) -> u32 {
        let weight = self.policy.weight(event.kind());
        self.score.total = self.score.total.saturating_add(weight);
        if self.policy.is_severe(event.kind()) {
            self.score.severe_log.push(event.clone());
        }

        self.summary.total = self.score.total;
        self.summary.violations += 1;
        *self.summary.by_severity.entry(event.severity()).or_default() += 1;
        *self.summary.by_kind.entry(event.kind()).or_default() += 1;

        info!(
            "Violation: {} (+{} points) | Total: {}",
            event.kind(),
            weight,
            self.score.total
        );
        weight
    }

    pub fn score(&self) -> &RunningScore {
        &self.score
    }

    pub fn total(&self) -> u32 {
        self.score.total
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn summary(&self) -> ScoreSummary {
        self.summary.clone()
    }
}

impl Default for ViolationScorer {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}
