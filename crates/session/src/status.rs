//! Per-tick detection status for the host UI

use serde::Serialize;
use signals::FaceBox;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionStatus {
    pub face_detected: bool,
    /// `None` while no landmark reading is available
    pub eyes_open: Option<bool>,
    pub looking_at_screen: Option<bool>,
    pub face_box: Option<FaceBox>,
}
