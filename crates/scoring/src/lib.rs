//! Violation Scoring
//!
//! Turns reported violations into a cumulative trust debit and decides,
//! exactly once per session, when the session must go to human review.

mod escalation;
mod pipeline;
mod policy;
mod scorer;

pub use escalation::{EscalationController, EscalationState};
pub use pipeline::ScoringPipeline;
pub use policy::ScoringPolicy;
pub use scorer::{RunningScore, ScoreSummary, ViolationScorer};
