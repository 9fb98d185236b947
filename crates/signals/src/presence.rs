//! Face presence adapter

use async_trait::async_trait;
use capability::CapabilityKind;
use frame_capture::VideoFrame;
use tracing::debug;
use violation_model::{DetectionEvent, ViolationKind};

use crate::debounce::{Candidate, NoisySignal};
use crate::detector::PresenceDetector;
use crate::{SignalAdapter, SignalConfig, SignalError, SignalReading};

/// Counts faces and tracks face movement between ticks
pub struct PresenceAdapter {
    detector: Option<PresenceDetector>,
    movement_threshold_px: f32,
    last_position: Option<(f32, f32)>,
}

impl PresenceAdapter {
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            detector: None,
            movement_threshold_px: config.movement_threshold_px,
            last_position: None,
        }
    }

    pub fn attach(&mut self, detector: PresenceDetector) {
        self.detector = Some(detector);
    }
}

#[async_trait]
impl SignalAdapter for PresenceAdapter {
    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Presence
    }

    fn is_attached(&self) -> bool {
        self.detector.is_some()
    }

    async fn detect(&mut self, frame: &VideoFrame) -> Result<SignalReading, SignalError> {
        let Some(detector) = self.detector.as_mut() else {
            return Ok(SignalReading::default());
        };
        let faces = detector.detect(frame).await?;
        let mut reading = SignalReading::default();

        match faces.len() {
            0 => {
                reading.candidates.push(Candidate::Confirming(
                    NoisySignal::NoFace,
                    DetectionEvent::new(ViolationKind::NoFaceDetected, "No face visible in camera"),
                ));
                return Ok(reading);
            }
            1 => reading.candidates.push(Candidate::Contrary(NoisySignal::NoFace)),
            n => {
                reading.candidates.push(Candidate::Contrary(NoisySignal::NoFace));
                reading.candidates.push(Candidate::Immediate(DetectionEvent::new(
                    ViolationKind::MultipleFaces,
                    format!("{} faces detected", n),
                )));
            }
        }

        let face = &faces[0];
        if let Some((last_x, last_y)) = self.last_position {
            let displacement = (face.x - last_x).hypot(face.y - last_y);
            if displacement > self.movement_threshold_px {
                debug!("Face moved {:.0}px since last tick", displacement);
                reading.candidates.push(Candidate::Immediate(DetectionEvent::new(
                    ViolationKind::ExcessiveMovement,
                    "Significant face movement detected",
                )));
            }
        }
        self.last_position = Some((face.x, face.y));

        reading.face_seen = true;
        reading.face_box = Some(face.clone());
        Ok(reading)
    }

    fn release(&mut self) {
        if let Some(mut detector) = self.detector.take() {
            detector.release();
        }
        self.last_position = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::detector::{Detector, FaceBox};
    use std::collections::VecDeque;

    /// Detector replaying a scripted list of per-frame outputs
    pub(crate) struct Scripted<T> {
        pub outputs: VecDeque<Result<T, SignalError>>,
    }

    #[async_trait]
    impl<T: Send + Clone + Default> Detector for Scripted<T> {
        type Output = T;

        async fn detect(&mut self, _frame: &VideoFrame) -> Result<T, SignalError> {
            self.outputs.pop_front().unwrap_or_else(|| Ok(T::default()))
        }
    }

    pub(crate) fn scripted<T: Send + Clone + Default + 'static>(
        outputs: Vec<Result<T, SignalError>>,
    ) -> Box<dyn Detector<Output = T>> {
        Box::new(Scripted {
            outputs: outputs.into(),
        })
    }

    fn face(x: f32, y: f32) -> FaceBox {
        FaceBox {
            x,
            y,
            width: 100.0,
            height: 120.0,
            confidence: 0.9,
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::solid(4, 4, [128, 128, 128])
    }

    #[tokio::test]
    async fn test_unattached_is_empty() {
        let mut adapter = PresenceAdapter::new(&SignalConfig::default());
        let reading = adapter.detect(&frame()).await.unwrap();
        assert!(reading.candidates.is_empty());
        assert!(!reading.face_seen);
    }

    #[tokio::test]
    async fn test_face_counts() {
        let mut adapter = PresenceAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![
            Ok(vec![]),
            Ok(vec![face(10.0, 10.0)]),
            Ok(vec![face(10.0, 10.0), face(300.0, 10.0)]),
        ]));

        let zero = adapter.detect(&frame()).await.unwrap();
        assert!(matches!(zero.candidates[0], Candidate::Confirming(NoisySignal::NoFace, _)));

        let one = adapter.detect(&frame()).await.unwrap();
        assert_eq!(one.candidates, vec![Candidate::Contrary(NoisySignal::NoFace)]);
        assert!(one.face_seen);

        let two = adapter.detect(&frame()).await.unwrap();
        assert!(two.candidates.iter().any(|c| matches!(
            c,
            Candidate::Immediate(e) if e.kind() == ViolationKind::MultipleFaces && e.details() == "2 faces detected"
        )));
    }

    #[tokio::test]
    async fn test_excessive_movement() {
        let mut adapter = PresenceAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![
            Ok(vec![face(10.0, 10.0)]),
            Ok(vec![face(50.0, 10.0)]),
            Ok(vec![face(250.0, 10.0)]),
        ]));
        adapter.detect(&frame()).await.unwrap();
        let small = adapter.detect(&frame()).await.unwrap();
        assert_eq!(small.candidates.len(), 1);
        let large = adapter.detect(&frame()).await.unwrap();
        assert!(large.candidates.iter().any(|c| matches!(
            c,
            Candidate::Immediate(e) if e.kind() == ViolationKind::ExcessiveMovement
        )));
    }

    #[tokio::test]
    async fn test_detector_error_propagates() {
        let mut adapter = PresenceAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![Err(SignalError::Inference("gpu lost".into()))]));
        assert!(adapter.detect(&frame()).await.is_err());
    }
}
