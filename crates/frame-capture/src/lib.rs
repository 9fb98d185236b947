//! Frame Capture
//!
//! The detection loop never touches the camera directly. It asks a
//! [`FrameSource`] for the current frame, and only after the source reports
//! that a frame is available.

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameSource, QueuedFrameSource};

use thiserror::Error;

/// Capture error types
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Invalid format: {0}")]
    Format(String),

    #[error("No frame available yet")]
    NotReady,
}
