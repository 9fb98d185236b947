//! Landmark adapter: head pose and eye closure

use async_trait::async_trait;
use capability::CapabilityKind;
use frame_capture::VideoFrame;
use tracing::debug;
use violation_model::{DetectionEvent, ViolationKind};

use crate::debounce::{Candidate, NoisySignal};
use crate::detector::LandmarkDetector;
use crate::geometry::{average_ear, head_pose};
use crate::{SignalAdapter, SignalConfig, SignalError, SignalReading};

pub struct LandmarkAdapter {
    detector: Option<LandmarkDetector>,
    head_pose_threshold: f32,
    ear_threshold: f32,
}

impl LandmarkAdapter {
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            detector: None,
            head_pose_threshold: config.head_pose_threshold,
            ear_threshold: config.ear_threshold,
        }
    }

    pub fn attach(&mut self, detector: LandmarkDetector) {
        self.detector = Some(detector);
    }
}

#[async_trait]
impl SignalAdapter for LandmarkAdapter {
    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Landmarks
    }

    fn is_attached(&self) -> bool {
        self.detector.is_some()
    }

    async fn detect(&mut self, frame: &VideoFrame) -> Result<SignalReading, SignalError> {
        let Some(detector) = self.detector.as_mut() else {
            return Ok(SignalReading::default());
        };
        let meshes = detector.detect(frame).await?;
        let mut reading = SignalReading::default();
        let Some(mesh) = meshes.first() else {
            return Ok(reading);
        };
        reading.face_seen = true;

        match head_pose(mesh) {
            Some(pose) if pose.exceeds(self.head_pose_threshold) => {
                reading.looking_at_screen = Some(false);
                reading.candidates.push(Candidate::Confirming(
                    NoisySignal::LookingAway,
                    DetectionEvent::new(
                        ViolationKind::LookingAway,
                        format!(
                            "Head turned away (yaw: {:.0}%, pitch: {:.0}%)",
                            pose.yaw * 100.0,
                            pose.pitch * 100.0
                        ),
                    ),
                ));
            }
            Some(_) => {
                reading.looking_at_screen = Some(true);
                reading.candidates.push(Candidate::Contrary(NoisySignal::LookingAway));
            }
            None => debug!("Head pose anchors missing, no signal"),
        }

        match average_ear(mesh) {
            Some(ear) if ear < self.ear_threshold => {
                reading.eyes_open = Some(false);
                reading.candidates.push(Candidate::Confirming(
                    NoisySignal::EyesClosed,
                    DetectionEvent::new(ViolationKind::EyesClosed, "Eyes closed for extended period"),
                ));
            }
            Some(_) => {
                reading.eyes_open = Some(true);
                reading.candidates.push(Candidate::Contrary(NoisySignal::EyesClosed));
            }
            None => debug!("Eye contour incomplete, no signal"),
        }

        Ok(reading)
    }

    fn release(&mut self) {
        if let Some(mut detector) = self.detector.take() {
            detector.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::LandmarkMesh;
    use crate::geometry::tests::frontal_mesh;
    use crate::presence::tests::scripted;

    fn frame() -> VideoFrame {
        VideoFrame::solid(4, 4, [128, 128, 128])
    }

    #[tokio::test]
    async fn test_attentive_face() {
        let mut adapter = LandmarkAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![Ok(vec![frontal_mesh(0.0, 6.0)])]));
        let reading = adapter.detect(&frame()).await.unwrap();
        assert_eq!(
            reading.candidates,
            vec![
                Candidate::Contrary(NoisySignal::LookingAway),
                Candidate::Contrary(NoisySignal::EyesClosed)
            ]
        );
        assert_eq!(reading.looking_at_screen, Some(true));
        assert_eq!(reading.eyes_open, Some(true));
    }

    #[tokio::test]
    async fn test_looking_away_and_eyes_closed() {
        let mut adapter = LandmarkAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![Ok(vec![frontal_mesh(-40.0, 1.0)])]));
        let reading = adapter.detect(&frame()).await.unwrap();
        assert!(matches!(
            &reading.candidates[0],
            Candidate::Confirming(NoisySignal::LookingAway, e) if e.details().contains("yaw: -40%")
        ));
        assert!(matches!(&reading.candidates[1], Candidate::Confirming(NoisySignal::EyesClosed, _)));
    }

    #[tokio::test]
    async fn test_truncated_mesh_is_no_signal() {
        let mut adapter = LandmarkAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![Ok(vec![LandmarkMesh {
            keypoints: vec![crate::Point::new(1.0, 1.0); 10],
        }])]));
        let reading = adapter.detect(&frame()).await.unwrap();
        assert!(reading.candidates.is_empty());
        assert!(reading.face_seen);
    }

    #[tokio::test]
    async fn test_no_mesh_no_face() {
        let mut adapter = LandmarkAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![Ok(Vec::<LandmarkMesh>::new())]));
        let reading = adapter.detect(&frame()).await.unwrap();
        assert!(!reading.face_seen);
    }
}
