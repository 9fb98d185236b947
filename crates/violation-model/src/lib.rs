//! Violation Model
//!
//! Shared vocabulary for the proctoring pipeline:
//! - Violation kinds and their default severities
//! - Detection events produced by signal adapters and the environment monitor
//! - Aggregated escalation events
//! - The sink that receives everything the core reports

pub mod event;
pub mod kind;
pub mod sink;

pub use event::{DetectionEvent, EscalationAction, EscalationEvent, SinkEvent};
pub use kind::{Severity, UnknownKind, ViolationKind};
pub use sink::{CollectingSink, ViolationSink};
