//! Violation kinds and severity levels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Closed set of reportable violations.
///
/// Every kind must have an entry in the scoring weight table; a kind missing
/// from a custom table scores the fallback weight of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    NoFaceDetected,
    MultipleFaces,
    LookingAway,
    EyesClosed,
    ExcessiveMovement,
    SuspiciousObject,
    TabSwitch,
    MouseLeft,
    WindowLostFocus,
    FullscreenExit,
    WindowMinimized,
    BlockedKey,
    RightClick,
}

impl ViolationKind {
    /// All kinds, in declaration order
    pub const ALL: [ViolationKind; 13] = [
        ViolationKind::NoFaceDetected,
        ViolationKind::MultipleFaces,
        ViolationKind::LookingAway,
        ViolationKind::EyesClosed,
        ViolationKind::ExcessiveMovement,
        ViolationKind::SuspiciousObject,
        ViolationKind::TabSwitch,
        ViolationKind::MouseLeft,
        ViolationKind::WindowLostFocus,
        ViolationKind::FullscreenExit,
        ViolationKind::WindowMinimized,
        ViolationKind::BlockedKey,
        ViolationKind::RightClick,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::NoFaceDetected => "no_face_detected",
            ViolationKind::MultipleFaces => "multiple_faces",
            ViolationKind::LookingAway => "looking_away",
            ViolationKind::EyesClosed => "eyes_closed",
            ViolationKind::ExcessiveMovement => "excessive_movement",
            ViolationKind::SuspiciousObject => "suspicious_object",
            ViolationKind::TabSwitch => "tab_switch",
            ViolationKind::MouseLeft => "mouse_left",
            ViolationKind::WindowLostFocus => "window_lost_focus",
            ViolationKind::FullscreenExit => "fullscreen_exit",
            ViolationKind::WindowMinimized => "window_minimized",
            ViolationKind::BlockedKey => "blocked_key",
            ViolationKind::RightClick => "right_click",
        }
    }

    /// Upper-case label with spaces, e.g. `FULLSCREEN EXIT`
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }

    /// Severity attached when a producer has no better estimate
    pub fn default_severity(&self) -> Severity {
        match self {
            ViolationKind::MultipleFaces
            | ViolationKind::SuspiciousObject
            | ViolationKind::TabSwitch
            | ViolationKind::FullscreenExit
            | ViolationKind::WindowMinimized => Severity::Critical,
            ViolationKind::NoFaceDetected | ViolationKind::LookingAway => Severity::High,
            ViolationKind::EyesClosed
            | ViolationKind::ExcessiveMovement
            | ViolationKind::MouseLeft
            | ViolationKind::BlockedKey => Severity::Medium,
            ViolationKind::WindowLostFocus | ViolationKind::RightClick => Severity::Low,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name that matches no [`ViolationKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown violation kind: {}", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for ViolationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ViolationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
