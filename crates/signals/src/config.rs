//! Signal adapter configuration

use serde::{Deserialize, Serialize};

/// Thresholds for the signal adapters and the consecutive-count filter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Consecutive zero-face ticks before `no_face_detected`
    pub no_face_consecutive: u32,

    /// Consecutive looking-away ticks before `looking_away`
    pub looking_away_consecutive: u32,

    /// Consecutive low-EAR ticks before `eyes_closed`
    pub eyes_closed_consecutive: u32,

    /// Normalized yaw / pitch displacement treated as looking away
    pub head_pose_threshold: f32,

    /// Eye aspect ratio below which eyes count as closed
    pub ear_threshold: f32,

    /// Face top-left displacement between ticks (pixels) treated as excessive movement
    pub movement_threshold_px: f32,

    /// Prohibited object classes, matched as case-insensitive substrings
    pub prohibited_objects: Vec<String>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            no_face_consecutive: 2,
            looking_away_consecutive: 2,
            eyes_closed_consecutive: 3,
            head_pose_threshold: 0.20,
            ear_threshold: 0.20,
            movement_threshold_px: 100.0,
            prohibited_objects: [
                "phone", "book", "laptop", "tablet", "tv", "television", "monitor", "keyboard", "mouse",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl SignalConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            no_face_consecutive: 1,
            looking_away_consecutive: 1,
            eyes_closed_consecutive: 2,
            head_pose_threshold: 0.15,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            no_face_consecutive: 3,
            looking_away_consecutive: 3,
            eyes_closed_consecutive: 5,
            head_pose_threshold: 0.30,
            ear_threshold: 0.15,
            movement_threshold_px: 150.0,
            ..Default::default()
        }
    }
}
