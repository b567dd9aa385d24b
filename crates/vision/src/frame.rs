//! Video frame type and thumbnail encoding

use serde::{Deserialize, Serialize};

/// JPEG quality used for alert thumbnails.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 70;

/// Frames wider than this are downscaled before inference.
pub const MAX_INFERENCE_WIDTH: u32 = 480;

/// Frame resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Source timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Frame sequence number
    pub sequence: u64,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ms: u64, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ms,
            sequence,
        }
    }

    /// Frame resolution
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    /// Source timestamp in seconds
    pub fn timestamp_sec(&self) -> f64 {
        self.timestamp_ms as f64 / 1000.0
    }

    /// Downscale proportionally so the width does not exceed
    /// `max_width`. Returns the frame unchanged if already narrow
    /// enough. Nearest-neighbor is adequate for inference input.
    pub fn downscale_to_width(&self, max_width: u32) -> VideoFrame {
        if self.width <= max_width || self.width == 0 {
            return self.clone();
        }
        let scale = max_width as f32 / self.width as f32;
        let new_width = max_width;
        let new_height = ((self.height as f32 * scale) as u32).max(1);

        let mut data = Vec::with_capacity((new_width * new_height * 3) as usize);
        let x_ratio = self.width as f32 / new_width as f32;
        let y_ratio = self.height as f32 / new_height as f32;
        for y in 0..new_height {
            let src_y = ((y as f32 * y_ratio) as u32).min(self.height - 1);
            for x in 0..new_width {
                let src_x = ((x as f32 * x_ratio) as u32).min(self.width - 1);
                let idx = ((src_y * self.width + src_x) * 3) as usize;
                data.extend_from_slice(&self.data[idx..idx + 3]);
            }
        }

        VideoFrame {
            data,
            width: new_width,
            height: new_height,
            timestamp_ms: self.timestamp_ms,
            sequence: self.sequence,
        }
    }

    /// Encode the frame as a JPEG thumbnail. Returns `None` if
    /// encoding fails (malformed buffer dimensions).
    pub fn encode_thumbnail(&self) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buf,
            THUMBNAIL_JPEG_QUALITY,
        );
        let img: image::RgbImage =
            image::ImageBuffer::from_raw(self.width, self.height, self.data.clone())?;
        img.write_with_encoder(encoder).ok()?;
        Some(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame::new(vec![128; (width * height * 3) as usize], width, height, 0, 0)
    }

    #[test]
    fn test_downscale_preserves_aspect() {
        let frame = solid_frame(960, 540);
        let small = frame.downscale_to_width(480);
        assert_eq!(small.width, 480);
        assert_eq!(small.height, 270);
        assert_eq!(small.data.len(), (480 * 270 * 3) as usize);
    }

    #[test]
    fn test_downscale_noop_when_narrow() {
        let frame = solid_frame(320, 240);
        let same = frame.downscale_to_width(480);
        assert_eq!(same.width, 320);
        assert_eq!(same.height, 240);
    }

    #[test]
    fn test_thumbnail_encodes_jpeg() {
        let frame = solid_frame(64, 48);
        let jpeg = frame.encode_thumbnail().unwrap();
        // JPEG SOI marker
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
