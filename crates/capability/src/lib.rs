//! Capability Registry
//!
//! Tracks which detection capabilities are live and derives the overall
//! detection mode from them. A capability that fails to initialize is
//! retried a bounded number of times and then excluded; it never takes the
//! session down.

mod registry;

pub use registry::{CapabilityConfig, CapabilityRegistry, CapabilityStatus};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while bringing a capability up
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("{capability} initialization failed: {reason}")]
    InitFailed {
        capability: CapabilityKind,
        reason: String,
    },

    #[error("{0} exhausted its retry budget")]
    RetryBudgetExhausted(CapabilityKind),
}

/// Independently loadable detection function
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Face counting / bounding boxes
    Presence,
    /// Dense facial landmarks (head pose, eye closure)
    Landmarks,
    /// General object detection
    Objects,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Presence,
        CapabilityKind::Landmarks,
        CapabilityKind::Objects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Presence => "presence",
            CapabilityKind::Landmarks => "landmarks",
            CapabilityKind::Objects => "objects",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse degradation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Three or more capabilities live
    Full,
    /// One or two capabilities live
    Basic,
    /// No ML capability; brightness heuristic and environment monitoring only
    Manual,
}

impl DetectionMode {
    /// Mode for a given number of loaded capabilities
    pub fn from_loaded_count(loaded: usize) -> Self {
        match loaded {
            0 => DetectionMode::Manual,
            1 | 2 => DetectionMode::Basic,
            _ => DetectionMode::Full,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, DetectionMode::Full)
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetectionMode::Full => "full",
            DetectionMode::Basic => "basic",
            DetectionMode::Manual => "manual",
        })
    }
}
