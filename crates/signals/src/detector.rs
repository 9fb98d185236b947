//! Raw detector contracts
//!
//! The concrete models are opaque. Each provider builds a [`Detector`]
//! whose output shape depends on the capability; adapters normalize it.

use async_trait::async_trait;
use frame_capture::VideoFrame;
use serde::{Deserialize, Serialize};

use crate::SignalError;

/// Face bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// 2D landmark in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Dense face mesh in the 468-point face-mesh index layout.
///
/// A detector may return a truncated mesh; indices past the end are missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkMesh {
    pub keypoints: Vec<Point>,
}

impl LandmarkMesh {
    pub fn point(&self, index: usize) -> Option<Point> {
        self.keypoints.get(index).copied()
    }
}

/// One object detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPrediction {
    /// Class label as reported by the model, e.g. "cell phone"
    pub class: String,
    pub score: f32,
    /// [x, y, width, height]
    pub bbox: [f32; 4],
}

/// A loaded detection model
#[async_trait]
pub trait Detector: Send {
    type Output;

    async fn detect(&mut self, frame: &VideoFrame) -> Result<Self::Output, SignalError>;

    /// Free model resources. Called once at teardown.
    fn release(&mut self) {}
}

/// Async factory for a detector
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    type Output;

    async fn init(&self) -> Result<Box<dyn Detector<Output = Self::Output>>, SignalError>;
}

pub type PresenceDetector = Box<dyn Detector<Output = Vec<FaceBox>>>;
pub type LandmarkDetector = Box<dyn Detector<Output = Vec<LandmarkMesh>>>;
pub type ObjectDetector = Box<dyn Detector<Output = Vec<ObjectPrediction>>>;
