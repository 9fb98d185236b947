//! Rule-Based Fallback System
//!
//! Provides a brightness heuristic when no ML capability is live, or when a
//! detection tick fails. It leans towards "face present" so a degraded
//! heuristic does not push the session into escalation.

mod rules;

pub use rules::{BrightnessHeuristic, FallbackConfig, FallbackReason};
