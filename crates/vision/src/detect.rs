//! Detection records and inference collaborator traits

use crate::frame::VideoFrame;
use geometry::Point2;
use serde::{Deserialize, Serialize};

/// COCO class id for "cell phone".
pub const PHONE_CLASS_ID: u32 = 67;

/// Object detection result for a single detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box as [x1, y1, x2, y2], normalized to [0, 1] when
    /// requested via [`DetectOptions::normalize`].
    pub bbox: [f32; 4],
    /// Detection confidence (0-1)
    pub confidence: f32,
    /// Model class id
    pub class_id: u32,
}

/// Options for an object detection call
#[derive(Debug, Clone, Copy)]
pub struct DetectOptions {
    /// Normalize bounding boxes to [0, 1]
    pub normalize: bool,
    /// Minimum confidence to report
    pub confidence_threshold: f32,
    /// IoU threshold for non-max suppression
    pub iou_threshold: f32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            confidence_threshold: 0.3,
            iou_threshold: 0.5,
        }
    }
}

/// Face landmark provider.
///
/// Implementations may assume sequential invocation for successive
/// frames of the same session (video running mode), but correctness
/// must not depend on it. Implementations are NOT assumed thread-safe;
/// callers sharing one instance across sessions must serialize access.
pub trait FaceLandmarker {
    /// Detect face landmarks. Returns an empty vector when no face is
    /// found; coordinates are normalized to [0, 1].
    fn detect(&mut self, frame: &VideoFrame) -> Vec<Point2>;
}

/// Object detector collaborator (YOLO-class model behind a narrow seam).
pub trait ObjectDetector {
    /// Detect objects in a frame.
    fn detect(&mut self, frame: &VideoFrame, options: DetectOptions) -> Vec<Detection>;
}
