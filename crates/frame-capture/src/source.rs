//! Frame source contract

use std::collections::VecDeque;
use tracing::debug;

use crate::{CaptureError, VideoFrame};

/// Anything that can hand the detection loop the current frame.
///
/// Callers must check [`FrameSource::is_ready`] before asking for a frame.
pub trait FrameSource {
    /// Whether a decoded frame is available
    fn is_ready(&self) -> bool;

    /// Current frame
    fn current_frame(&mut self) -> Result<VideoFrame, CaptureError>;
}

/// Source that plays back a queue of frames and then keeps returning the last one
#[derive(Debug, Default)]
pub struct QueuedFrameSource {
    queue: VecDeque<VideoFrame>,
    last: Option<VideoFrame>,
    sequence: u32,
}

impl QueuedFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: VideoFrame) {
        self.queue.push_back(frame);
    }
}

impl FromIterator<VideoFrame> for QueuedFrameSource {
    fn from_iter<I: IntoIterator<Item = VideoFrame>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
            last: None,
            sequence: 0,
        }
    }
}

impl FrameSource for QueuedFrameSource {
    fn is_ready(&self) -> bool {
        !self.queue.is_empty() || self.last.is_some()
    }

    fn current_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        if let Some(mut frame) = self.queue.pop_front() {
            self.sequence += 1;
            frame.sequence = self.sequence;
            debug!("Frame {} dequeued ({}x{})", frame.sequence, frame.width, frame.height);
            self.last = Some(frame.clone());
            return Ok(frame);
        }
        self.last.clone().ok_or(CaptureError::NotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_until_first_frame() {
        let mut source = QueuedFrameSource::new();
        assert!(!source.is_ready());
        assert!(matches!(source.current_frame(), Err(CaptureError::NotReady)));

        source.push(VideoFrame::solid(2, 2, [0, 0, 0]));
        assert!(source.is_ready());
        assert_eq!(source.current_frame().unwrap().sequence, 1);
    }

    #[test]
    fn test_repeats_last_frame() {
        let mut source: QueuedFrameSource = vec![VideoFrame::solid(2, 2, [9, 9, 9])].into_iter().collect();
        source.current_frame().unwrap();
        let again = source.current_frame().unwrap();
        assert_eq!(again.get_pixel(0, 0), Some([9, 9, 9]));
        assert!(source.is_ready());
    }
}
