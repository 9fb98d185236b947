//! Prohibited object adapter

use async_trait::async_trait;
use capability::CapabilityKind;
use frame_capture::VideoFrame;
use std::collections::BTreeSet;
use tracing::debug;
use violation_model::{DetectionEvent, ViolationKind};

use crate::debounce::Candidate;
use crate::detector::{ObjectDetector, ObjectPrediction};
use crate::{SignalAdapter, SignalConfig, SignalError, SignalReading};

/// Filters general object detections down to prohibited classes.
///
/// Reports only when the set of prohibited classes in view differs from
/// the last reported set, so a phone that stays on the desk is reported once.
pub struct ObjectAdapter {
    detector: Option<ObjectDetector>,
    prohibited: Vec<String>,
    last_reported: BTreeSet<String>,
}

impl ObjectAdapter {
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            detector: None,
            prohibited: config.prohibited_objects.iter().map(|c| c.to_lowercase()).collect(),
            last_reported: BTreeSet::new(),
        }
    }

    pub fn attach(&mut self, detector: ObjectDetector) {
        self.detector = Some(detector);
    }

    fn is_prohibited(&self, prediction: &ObjectPrediction) -> bool {
        let class = prediction.class.to_lowercase();
        self.prohibited.iter().any(|p| class.contains(p.as_str()))
    }
}

#[async_trait]
impl SignalAdapter for ObjectAdapter {
    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Objects
    }

    fn is_attached(&self) -> bool {
        self.detector.is_some()
    }

    async fn detect(&mut self, frame: &VideoFrame) -> Result<SignalReading, SignalError> {
        let Some(detector) = self.detector.as_mut() else {
            return Ok(SignalReading::default());
        };
        let predictions = detector.detect(frame).await?;
        let mut reading = SignalReading::default();

        let detected: BTreeSet<String> = predictions
            .iter()
            .filter(|p| self.is_prohibited(p))
            .map(|p| p.class.clone())
            .collect();

        if detected.is_empty() {
            self.last_reported.clear();
            return Ok(reading);
        }
        if detected == self.last_reported {
            debug!("Prohibited objects unchanged since last report");
            return Ok(reading);
        }

        let objects = detected.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        reading.candidates.push(Candidate::Immediate(DetectionEvent::new(
            ViolationKind::SuspiciousObject,
            format!("Detected: {} - IMMEDIATE REVIEW REQUIRED", objects),
        )));
        self.last_reported = detected;
        Ok(reading)
    }

    fn release(&mut self) {
        if let Some(mut detector) = self.detector.take() {
            detector.release();
        }
        self.last_reported.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::tests::scripted;

    fn prediction(class: &str) -> ObjectPrediction {
        ObjectPrediction {
            class: class.to_string(),
            score: 0.8,
            bbox: [0.0, 0.0, 10.0, 10.0],
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::solid(4, 4, [128, 128, 128])
    }

    async fn reports(adapter: &mut ObjectAdapter) -> usize {
        adapter.detect(&frame()).await.unwrap().candidates.len()
    }

    #[tokio::test]
    async fn test_label_casing_changes_class_set() {
        let mut adapter = ObjectAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![
            Ok(vec![prediction("cell phone"), prediction("person")]),
            Ok(vec![prediction("Cell Phone"), prediction("person")]),
            Ok(vec![prediction("cell phone"), prediction("person")]),
        ]));
        assert_eq!(reports(&mut adapter).await, 1);
        // Different casing is a different class label
        assert_eq!(reports(&mut adapter).await, 1);
        assert_eq!(reports(&mut adapter).await, 1);
    }

    #[tokio::test]
    async fn test_identical_sets_suppressed() {
        let mut adapter = ObjectAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![
            Ok(vec![prediction("book")]),
            Ok(vec![prediction("book")]),
            Ok(vec![prediction("book"), prediction("laptop")]),
        ]));
        assert_eq!(reports(&mut adapter).await, 1);
        assert_eq!(reports(&mut adapter).await, 0);
        assert_eq!(reports(&mut adapter).await, 1);
    }

    #[tokio::test]
    async fn test_object_leaving_view_rearms() {
        let mut adapter = ObjectAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![
            Ok(vec![prediction("book")]),
            Ok(vec![prediction("person")]),
            Ok(vec![prediction("book")]),
        ]));
        assert_eq!(reports(&mut adapter).await, 1);
        assert_eq!(reports(&mut adapter).await, 0);
        assert_eq!(reports(&mut adapter).await, 1);
    }

    #[tokio::test]
    async fn test_allowed_objects_ignored() {
        let mut adapter = ObjectAdapter::new(&SignalConfig::default());
        adapter.attach(scripted(vec![Ok(vec![prediction("cup"), prediction("person")])]));
        assert_eq!(reports(&mut adapter).await, 0);
    }
}
