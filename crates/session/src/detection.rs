//! One detection tick: frame, adapters, debounce

use capability::DetectionMode;
use fallback::{BrightnessHeuristic, FallbackConfig, FallbackReason};
use frame_capture::{CaptureError, FrameSource, VideoFrame};
use signals::{
    ConsecutiveCounters, ConsecutiveFilter, LandmarkAdapter, LandmarkDetector, ObjectAdapter, ObjectDetector,
    PresenceAdapter, PresenceDetector, SignalAdapter, SignalConfig, SignalError, SignalReading,
};
use tracing::{debug, warn};
use violation_model::DetectionEvent;

use crate::status::DetectionStatus;

/// Adapters, the consecutive-count filter, and the fallback heuristic
pub struct DetectionLoop {
    presence: PresenceAdapter,
    landmarks: LandmarkAdapter,
    objects: ObjectAdapter,
    filter: ConsecutiveFilter,
    heuristic: BrightnessHeuristic,
    status: DetectionStatus,
    ticks: u64,
}

impl DetectionLoop {
    pub fn new(signals: &SignalConfig, fallback: FallbackConfig) -> Self {
        Self {
            presence: PresenceAdapter::new(signals),
            landmarks: LandmarkAdapter::new(signals),
            objects: ObjectAdapter::new(signals),
            filter: ConsecutiveFilter::new(signals),
            heuristic: BrightnessHeuristic::new(fallback),
            status: DetectionStatus::default(),
            ticks: 0,
        }
    }

    pub fn attach_presence(&mut self, detector: PresenceDetector) {
        self.presence.attach(detector);
    }

    pub fn attach_landmarks(&mut self, detector: LandmarkDetector) {
        self.landmarks.attach(detector);
    }

    pub fn attach_objects(&mut self, detector: ObjectDetector) {
        self.objects.attach(detector);
    }

    fn adapters_mut(&mut self) -> [&mut dyn SignalAdapter; 3] {
        [&mut self.presence, &mut self.landmarks, &mut self.objects]
    }

    pub fn attached_count(&self) -> usize {
        [
            self.presence.is_attached(),
            self.landmarks.is_attached(),
            self.objects.is_attached(),
        ]
        .into_iter()
        .filter(|attached| *attached)
        .count()
    }

    /// Run one tick and return the violations confirmed by it.
    ///
    /// Skipped entirely while the source has no frame.
    pub async fn tick<S>(&mut self, frames: &mut S, mode: DetectionMode) -> Vec<DetectionEvent>
    where
        S: FrameSource + ?Sized,
    {
        if !frames.is_ready() {
            debug!("Frame source not ready, skipping tick");
            return Vec::new();
        }
        self.ticks += 1;

        let frame = match frames.current_frame() {
            Ok(frame) => frame,
            Err(CaptureError::NotReady) => return Vec::new(),
            Err(e) => {
                warn!("Frame capture failed on tick {}: {}", self.ticks, e);
                return self.fallback(None, FallbackReason::TickError);
            }
        };

        if mode == DetectionMode::Manual || self.attached_count() == 0 {
            return self.fallback(Some(&frame), FallbackReason::ManualMode);
        }

        match self.observe(&frame).await {
            Ok(readings) => self.apply(readings),
            Err(e) => {
                warn!("Detection tick {} failed, using brightness fallback: {}", self.ticks, e);
                self.fallback(Some(&frame), FallbackReason::TickError)
            }
        }
    }

    async fn observe(&mut self, frame: &VideoFrame) -> Result<Vec<SignalReading>, SignalError> {
        let mut readings = Vec::with_capacity(3);
        for adapter in self.adapters_mut() {
            if !adapter.is_attached() {
                continue;
            }
            match adapter.detect(frame).await {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    debug!("{} adapter failed: {}", adapter.capability(), e);
                    return Err(e);
                }
            }
        }
        Ok(readings)
    }

    fn apply(&mut self, readings: Vec<SignalReading>) -> Vec<DetectionEvent> {
        self.status = DetectionStatus {
            face_detected: readings.iter().any(|r| r.face_seen),
            eyes_open: readings.iter().find_map(|r| r.eyes_open),
            looking_at_screen: readings.iter().find_map(|r| r.looking_at_screen),
            face_box: readings.iter().find_map(|r| r.face_box.clone()),
        };

        readings
            .into_iter()
            .flat_map(|reading| reading.candidates)
            .filter_map(|candidate| self.filter.admit(candidate))
            .collect()
    }

    fn fallback(&mut self, frame: Option<&VideoFrame>, reason: FallbackReason) -> Vec<DetectionEvent> {
        let candidate = self.heuristic.assess(frame, reason);
        self.status = DetectionStatus {
            face_detected: self.heuristic.face_likely_present(frame),
            ..Default::default()
        };
        self.filter.admit(candidate).into_iter().collect()
    }

    pub fn status(&self) -> &DetectionStatus {
        &self.status
    }

    pub fn counters(&self) -> ConsecutiveCounters {
        self.filter.counters()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Release every detector
    pub fn release(&mut self) {
        for adapter in self.adapters_mut() {
            adapter.release();
        }
        self.filter.reset();
    }
}
