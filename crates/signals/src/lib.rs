//! Signal Adapters
//!
//! Per-capability wrappers that turn raw detector output into candidate
//! violations:
//! - Face presence (no face, multiple faces, excessive movement)
//! - Landmarks (head pose, eye aspect ratio)
//! - Prohibited objects
//!
//! Noisy candidates pass through the [`ConsecutiveFilter`] before they are
//! reported.

pub mod config;
pub mod debounce;
pub mod detector;
pub mod geometry;
pub mod landmarks;
pub mod object;
pub mod presence;

pub use config::SignalConfig;
pub use debounce::{Candidate, ConsecutiveCounters, ConsecutiveFilter, NoisySignal};
pub use detector::{
    CapabilityProvider, Detector, FaceBox, LandmarkDetector, LandmarkMesh, ObjectDetector, ObjectPrediction, Point,
    PresenceDetector,
};
pub use geometry::HeadPose;
pub use landmarks::LandmarkAdapter;
pub use object::ObjectAdapter;
pub use presence::PresenceAdapter;

use async_trait::async_trait;
use capability::CapabilityKind;
use frame_capture::VideoFrame;
use thiserror::Error;

/// Signal error types
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Detector returned malformed output: {0}")]
    InvalidOutput(String),
}

/// What one adapter observed on one frame
#[derive(Debug, Clone, Default)]
pub struct SignalReading {
    /// Raw candidates, not yet debounced
    pub candidates: Vec<Candidate>,
    /// At least one face was seen by this adapter
    pub face_seen: bool,
    pub face_box: Option<FaceBox>,
    pub looking_at_screen: Option<bool>,
    pub eyes_open: Option<bool>,
}

/// Common surface of the three adapters
#[async_trait]
pub trait SignalAdapter: Send {
    fn capability(&self) -> CapabilityKind;

    /// Whether a detector is attached
    fn is_attached(&self) -> bool;

    /// Run the detector on one frame. Returns an empty reading when no
    /// detector is attached.
    async fn detect(&mut self, frame: &VideoFrame) -> Result<SignalReading, SignalError>;

    /// Drop the detector and its resources
    fn release(&mut self);
}
