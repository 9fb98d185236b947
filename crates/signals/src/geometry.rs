//! Head pose and eye aspect ratio from face-mesh landmarks

use serde::{Deserialize, Serialize};

use crate::detector::{LandmarkMesh, Point};

const NOSE_TIP: usize = 4;
const CHIN: usize = 152;
const LEFT_EYE: usize = 33;
const RIGHT_EYE: usize = 263;

/// Outer corner, two upper lid points, inner corner, two lower lid points
const LEFT_EYE_CONTOUR: [usize; 6] = [33, 160, 158, 133, 153, 144];
const RIGHT_EYE_CONTOUR: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Head pose as normalized displacement ratios (roll in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Nose offset from the eye midpoint, in eye-distance units
    pub yaw: f32,
    /// Nose drop below the eye line, in nose-to-chin units
    pub pitch: f32,
    /// Eye-line tilt
    pub roll: f32,
}

impl HeadPose {
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.yaw.abs() > threshold || self.pitch.abs() > threshold
    }
}

/// Estimate head pose. `None` when an anchor is missing or degenerate.
pub fn head_pose(mesh: &LandmarkMesh) -> Option<HeadPose> {
    let nose = mesh.point(NOSE_TIP)?;
    let chin = mesh.point(CHIN)?;
    let left = mesh.point(LEFT_EYE)?;
    let right = mesh.point(RIGHT_EYE)?;

    let face_width = (left.x - right.x).abs();
    let face_height = (nose.y - chin.y).abs();
    if face_width <= f32::EPSILON || face_height <= f32::EPSILON {
        return None;
    }

    let eyes_mid_x = (left.x + right.x) / 2.0;
    let eyes_mid_y = (left.y + right.y) / 2.0;

    Some(HeadPose {
        yaw: (nose.x - eyes_mid_x) / face_width,
        pitch: (nose.y - eyes_mid_y) / face_height,
        roll: (right.y - left.y).atan2(right.x - left.x),
    })
}

/// EAR for one six-point eye contour
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> Option<f32> {
    let v1 = eye[1].distance(&eye[5]);
    let v2 = eye[2].distance(&eye[4]);
    let h = eye[0].distance(&eye[3]);
    if h <= f32::EPSILON {
        return None;
    }
    Some((v1 + v2) / (2.0 * h))
}

fn contour(mesh: &LandmarkMesh, indices: &[usize; 6]) -> Option<[Point; 6]> {
    let mut points = [Point::new(0.0, 0.0); 6];
    for (slot, &index) in points.iter_mut().zip(indices) {
        *slot = mesh.point(index)?;
    }
    Some(points)
}

/// EAR averaged over both eyes
pub fn average_ear(mesh: &LandmarkMesh) -> Option<f32> {
    let left = eye_aspect_ratio(&contour(mesh, &LEFT_EYE_CONTOUR)?)?;
    let right = eye_aspect_ratio(&contour(mesh, &RIGHT_EYE_CONTOUR)?)?;
    Some((left + right) / 2.0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Mesh with a frontal face: eyes at y=100, nose slightly below, chin at y=200.
    /// `eye_open` is the lid half-height in pixels.
    pub(crate) fn frontal_mesh(nose_dx: f32, eye_open: f32) -> LandmarkMesh {
        let mut keypoints = vec![Point::new(0.0, 0.0); 468];
        keypoints[LEFT_EYE] = Point::new(100.0, 100.0);
        keypoints[RIGHT_EYE] = Point::new(200.0, 100.0);
        keypoints[NOSE_TIP] = Point::new(150.0 + nose_dx, 110.0);
        keypoints[CHIN] = Point::new(150.0, 200.0);

        let mut eye = |indices: [usize; 6], x0: f32| {
            keypoints[indices[0]] = Point::new(x0, 100.0);
            keypoints[indices[1]] = Point::new(x0 + 10.0, 100.0 - eye_open);
            keypoints[indices[2]] = Point::new(x0 + 20.0, 100.0 - eye_open);
            keypoints[indices[3]] = Point::new(x0 + 30.0, 100.0);
            keypoints[indices[4]] = Point::new(x0 + 20.0, 100.0 + eye_open);
            keypoints[indices[5]] = Point::new(x0 + 10.0, 100.0 + eye_open);
        };
        eye(LEFT_EYE_CONTOUR, 100.0);
        eye(RIGHT_EYE_CONTOUR, 170.0);
        // Contours share corners with the pose anchors; restore them
        keypoints[LEFT_EYE] = Point::new(100.0, 100.0);
        keypoints[RIGHT_EYE] = Point::new(200.0, 100.0);
        LandmarkMesh { keypoints }
    }

    #[test]
    fn test_frontal_pose() {
        let pose = head_pose(&frontal_mesh(0.0, 5.0)).unwrap();
        assert!(pose.yaw.abs() < 1e-6);
        assert!((pose.pitch - 10.0 / 90.0).abs() < 1e-6);
        assert!(!pose.exceeds(0.20));
    }

    #[test]
    fn test_turned_head() {
        let pose = head_pose(&frontal_mesh(30.0, 5.0)).unwrap();
        assert!((pose.yaw - 0.30).abs() < 1e-6);
        assert!(pose.exceeds(0.20));
    }

    #[test]
    fn test_missing_anchor_is_no_signal() {
        let mesh = LandmarkMesh {
            keypoints: vec![Point::new(1.0, 1.0); 100],
        };
        assert!(head_pose(&mesh).is_none());
        assert!(average_ear(&mesh).is_none());
    }

    #[test]
    fn test_ear_open_vs_closed() {
        let open = average_ear(&frontal_mesh(0.0, 6.0)).unwrap();
        let closed = average_ear(&frontal_mesh(0.0, 1.5)).unwrap();
        assert!(open > 0.20, "open EAR {open}");
        assert!(closed < 0.20, "closed EAR {closed}");
    }

    #[test]
    fn test_degenerate_eye_width() {
        let eye = [Point::new(5.0, 5.0); 6];
        assert!(eye_aspect_ratio(&eye).is_none());
    }
}
