//! Detection and escalation events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::{Severity, ViolationKind};

/// A confirmed or candidate violation produced by an adapter or the environment monitor.
///
/// Fields are private; an event never changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    #[serde(rename = "type")]
    kind: ViolationKind,
    severity: Severity,
    details: String,
    observed_at: DateTime<Utc>,
}

impl DetectionEvent {
    /// Create an event with the kind's default severity, stamped now
    pub fn new(kind: ViolationKind, details: impl Into<String>) -> Self {
        Self::with_severity(kind, kind.default_severity(), details)
    }

    pub fn with_severity(kind: ViolationKind, severity: Severity, details: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            details: details.into(),
            observed_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Human-readable reason line, e.g. `TAB SWITCH: Student switched tabs (Total: 1)`
    pub fn reason(&self) -> String {
        format!("{}: {}", self.kind.label(), self.details)
    }
}

/// What the host should do with an escalated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationAction {
    /// Route the candidate to a human-reviewed holding state
    EscalateToReview,
}

/// The single aggregated event emitted when the trust debit crosses the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationEvent {
    pub session_id: Uuid,
    pub severity: Severity,
    pub details: String,
    pub action: EscalationAction,
    /// One line per severe violation recorded so far
    pub reasons: Vec<String>,
    /// Trust debit at the moment of crossing
    pub total: u32,
    pub observed_at: DateTime<Utc>,
}

/// Everything delivered to a [`ViolationSink`](crate::ViolationSink)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    Violation {
        session_id: Uuid,
        #[serde(flatten)]
        detection: DetectionEvent,
    },
    Escalation(EscalationEvent),
}

impl SinkEvent {
    pub fn is_escalation(&self) -> bool {
        matches!(self, SinkEvent::Escalation(_))
    }

    /// The detection carried by a violation event
    pub fn detection(&self) -> Option<&DetectionEvent> {
        match self {
            SinkEvent::Violation { detection, .. } => Some(detection),
            SinkEvent::Escalation(_) => None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            SinkEvent::Violation { session_id, .. } => *session_id,
            SinkEvent::Escalation(escalation) => escalation.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity_applied() {
        let event = DetectionEvent::new(ViolationKind::RightClick, "Right-click attempted");
        assert_eq!(event.severity(), Severity::Low);
        assert_eq!(event.reason(), "RIGHT CLICK: Right-click attempted");
    }

    #[test]
    fn test_violation_json_shape() {
        let event = SinkEvent::Violation {
            session_id: Uuid::nil(),
            detection: DetectionEvent::new(ViolationKind::TabSwitch, "switched"),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "violation");
        assert_eq!(value["type"], "tab_switch");
        assert_eq!(value["severity"], "critical");
    }

    #[test]
    fn test_escalation_json_shape() {
        let event = SinkEvent::Escalation(EscalationEvent {
            session_id: Uuid::nil(),
            severity: Severity::Critical,
            details: "Multiple violations detected (Score: 20)".into(),
            action: EscalationAction::EscalateToReview,
            reasons: vec!["FULLSCREEN EXIT: Exited fullscreen mode".into()],
            total: 20,
            observed_at: Utc::now(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "escalation");
        assert_eq!(value["action"], "escalate_to_review");
        assert!(event.is_escalation());
    }
}
