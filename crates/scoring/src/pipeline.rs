//! Scorer plus escalation, producing sink events

use chrono::Utc;
use uuid::Uuid;
use violation_model::{
    DetectionEvent, EscalationAction, EscalationEvent, Severity, SinkEvent, ViolationSink,
};

use crate::escalation::EscalationController;
use crate::policy::ScoringPolicy;
use crate::scorer::{ScoreSummary, ViolationScorer};

pub struct ScoringPipeline {
    session_id: Uuid,
    scorer: ViolationScorer,
    escalation: EscalationController,
}

impl ScoringPipeline {
    pub fn new(session_id: Uuid, policy: ScoringPolicy) -> Self {
        let escalation = EscalationController::new(policy.escalation_threshold);
        Self {
            session_id,
            scorer: ViolationScorer::new(policy),
            escalation,
        }
    }

    /// Score one reported violation.
    ///
    /// The violation itself is always forwarded first. On the crossing
    /// update an aggregated escalation follows it; never again after that.
    pub fn record(&mut self, event: DetectionEvent) -> Vec<SinkEvent> {
        let weight = self.scorer.record(&event);
        metrics::counter!("proctor_violations_total", "kind" => event.kind().as_str()).increment(1);
        metrics::gauge!("proctor_trust_debit").set(f64::from(self.scorer.total()));
        tracing::debug!("Scored {} at weight {}", event.kind(), weight);

        let mut out = vec![SinkEvent::Violation {
            session_id: self.session_id,
            detection: event,
        }];

        if self.escalation.evaluate(self.scorer.total()) {
            metrics::counter!("proctor_escalations_total").increment(1);
            out.push(SinkEvent::Escalation(self.aggregate()));
        }
        out
    }

    /// Score and deliver to the sink in order
    pub fn deliver(&mut self, event: DetectionEvent, sink: &mut dyn ViolationSink) {
        for out in self.record(event) {
            sink.on_violation(out);
        }
    }

    fn aggregate(&self) -> EscalationEvent {
        let total = self.scorer.total();
        EscalationEvent {
            session_id: self.session_id,
            severity: Severity::Critical,
            details: format!("Multiple violations detected (Score: {})", total),
            action: EscalationAction::EscalateToReview,
            reasons: self
                .scorer
                .score()
                .severe_log()
                .iter()
                .map(DetectionEvent::reason)
                .collect(),
            total,
            observed_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn total(&self) -> u32 {
        self.scorer.total()
    }

    pub fn is_escalated(&self) -> bool {
        self.escalation.is_escalated()
    }

    pub fn scorer(&self) -> &ViolationScorer {
        &self.scorer
    }

    pub fn summary(&self) -> ScoreSummary {
        self.scorer.summary()
    }
}
