//! Video frame type

use std::path::Path;

use crate::CaptureError;

/// Decoded RGB video frame
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a frame from raw RGB data, checking the buffer length
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u32) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CaptureError::Format(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            sequence,
        })
    }

    /// Frame filled with one color
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            data,
            width,
            height,
            sequence: 0,
        }
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        let pixel = self.data.get(idx..idx + 3)?;
        Some([pixel[0], pixel[1], pixel[2]])
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Mean of the per-pixel channel average on a 0-255 scale.
    ///
    /// Returns `None` for an empty frame.
    pub fn mean_brightness(&self) -> Option<f64> {
        let pixels = self.data.len() / 3;
        if pixels == 0 {
            return None;
        }
        let total: u64 = self
            .data
            .chunks_exact(3)
            .map(|p| p[0] as u64 + p[1] as u64 + p[2] as u64)
            .sum();
        Some(total as f64 / 3.0 / pixels as f64)
    }
}

impl VideoFrame {
    /// Decode an image file into a frame
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| CaptureError::Format(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from(img.to_rgb8()))
    }
}

impl From<image::RgbImage> for VideoFrame {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
            sequence: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_open_missing_file() {
        let result = VideoFrame::open("/nonexistent/frame.png");
        assert!(matches!(result, Err(CaptureError::Format(_))));
    }

    #[test]
    fn test_get_pixel_on_truncated_data() {
        let frame = VideoFrame {
            data: vec![1, 2, 3, 4, 5, 6],
            width: 70_000,
            height: 70_000,
            sequence: 0,
        };
        assert_eq!(frame.get_pixel(1, 0), Some([4, 5, 6]));
        assert_eq!(frame.get_pixel(2, 0), None);
        assert_eq!(frame.get_pixel(69_999, 69_999), None);
    }

    #[test]
    fn test_rejects_short_buffer() {
        let result = VideoFrame::new(vec![0; 10], 2, 2, 0);
        assert!(matches!(result, Err(CaptureError::Format(_))));
    }

    #[test]
    fn test_get_pixel_bounds() {
        let frame = VideoFrame::solid(4, 3, [10, 20, 30]);
        assert_eq!(frame.get_pixel(3, 2), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(4, 0), None);
    }

    #[test]
    fn test_mean_brightness() {
        let frame = VideoFrame::solid(8, 8, [30, 60, 90]);
        assert_eq!(frame.mean_brightness(), Some(60.0));
        assert_eq!(VideoFrame::solid(0, 0, [1, 2, 3]).mean_brightness(), None);
    }

    #[test]
    fn test_from_image() {
        let img = image::RgbImage::from_pixel(5, 4, image::Rgb([200, 200, 200]));
        let frame = VideoFrame::from(img);
        assert_eq!((frame.width, frame.height), (5, 4));
        assert_eq!(frame.mean_brightness(), Some(200.0));
    }

    proptest! {
        #[test]
        fn brightness_stays_in_byte_range(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let frame = VideoFrame::solid(3, 3, [r, g, b]);
            let mean = frame.mean_brightness().unwrap();
            prop_assert!((0.0..=255.0).contains(&mean));
        }
    }
}
