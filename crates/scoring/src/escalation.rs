//! One-way escalation state machine

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    #[default]
    Normal,
    /// Terminal for the session
    Escalated,
}

#[derive(Debug, Default)]
pub struct EscalationController {
    threshold: u32,
    state: EscalationState,
}

impl EscalationController {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            state: EscalationState::Normal,
        }
    }

    /// Returns true only on the transition into `Escalated`
    pub fn evaluate(&mut self, total: u32) -> bool {
        if self.state == EscalationState::Normal && total >= self.threshold {
            warn!("Trust debit {} reached threshold {}, escalating", total, self.threshold);
            self.state = EscalationState::Escalated;
            return true;
        }
        false
    }

    pub fn state(&self) -> EscalationState {
        self.state
    }

    pub fn is_escalated(&self) -> bool {
        self.state == EscalationState::Escalated
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
