//! Brightness heuristic

use frame_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use signals::{Candidate, NoisySignal};
use tracing::debug;
use violation_model::{DetectionEvent, ViolationKind};

/// Luma band inside which a face is assumed present
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Exclusive lower bound on mean brightness (0-255)
    pub min_brightness: f64,
    /// Exclusive upper bound on mean brightness (0-255)
    pub max_brightness: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            min_brightness: 20.0,
            max_brightness: 250.0,
        }
    }
}

/// Why the heuristic ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No ML capability is loaded
    ManualMode,
    /// The ML tick failed
    TickError,
}

impl FallbackReason {
    fn details(&self) -> &'static str {
        match self {
            FallbackReason::ManualMode => "No face visible (fallback detection)",
            FallbackReason::TickError => "No face visible (error fallback)",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrightnessHeuristic {
    config: FallbackConfig,
}

impl BrightnessHeuristic {
    pub fn new(config: FallbackConfig) -> Self {
        Self { config }
    }

    /// Whether a face is plausibly in frame. A missing or empty frame counts as present.
    pub fn face_likely_present(&self, frame: Option<&VideoFrame>) -> bool {
        let Some(brightness) = frame.and_then(VideoFrame::mean_brightness) else {
            return true;
        };
        let present = brightness > self.config.min_brightness && brightness < self.config.max_brightness;
        debug!("Fallback brightness {:.1} -> face present: {}", brightness, present);
        present
    }

    /// No-face candidate for the consecutive filter
    pub fn assess(&self, frame: Option<&VideoFrame>, reason: FallbackReason) -> Candidate {
        if self.face_likely_present(frame) {
            Candidate::Contrary(NoisySignal::NoFace)
        } else {
            Candidate::Confirming(
                NoisySignal::NoFace,
                DetectionEvent::new(ViolationKind::NoFaceDetected, reason.details()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn heuristic() -> BrightnessHeuristic {
        BrightnessHeuristic::default()
    }

    #[test]
    fn test_dark_frame_flags_absence() {
        let dark = VideoFrame::solid(8, 8, [5, 5, 5]);
        assert!(!heuristic().face_likely_present(Some(&dark)));
        assert!(matches!(
            heuristic().assess(Some(&dark), FallbackReason::ManualMode),
            Candidate::Confirming(NoisySignal::NoFace, e) if e.details() == "No face visible (fallback detection)"
        ));
    }

    #[test]
    fn test_saturated_frame_flags_absence() {
        let white = VideoFrame::solid(8, 8, [255, 255, 255]);
        assert!(!heuristic().face_likely_present(Some(&white)));
    }

    #[test]
    fn test_bounds_are_exclusive() {
        assert!(!heuristic().face_likely_present(Some(&VideoFrame::solid(2, 2, [20, 20, 20]))));
        assert!(!heuristic().face_likely_present(Some(&VideoFrame::solid(2, 2, [250, 250, 250]))));
        assert!(heuristic().face_likely_present(Some(&VideoFrame::solid(2, 2, [21, 21, 21]))));
    }

    #[test]
    fn test_missing_frame_assumes_present() {
        assert!(heuristic().face_likely_present(None));
        assert!(heuristic().face_likely_present(Some(&VideoFrame::solid(0, 0, [0, 0, 0]))));
        assert_eq!(
            heuristic().assess(None, FallbackReason::TickError),
            Candidate::Contrary(NoisySignal::NoFace)
        );
    }

    proptest! {
        #[test]
        fn mid_gray_always_present(level in 21u8..250) {
            let frame = VideoFrame::solid(4, 4, [level, level, level]);
            prop_assert!(heuristic().face_likely_present(Some(&frame)));
        }
    }
}
