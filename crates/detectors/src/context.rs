//! Per-frame input bundle

use geometry::Point2;
use vision::Detection;

/// Everything the detectors see for one frame. Created fresh per
/// frame and owned by the update call; detectors keep only derived
/// scalar state, never the context itself.
#[derive(Debug, Clone, Default)]
pub struct FrameContext {
    /// Face landmarks, absent when no face was found.
    pub landmarks: Option<Vec<Point2>>,
    /// Object detections for the frame.
    pub detections: Vec<Detection>,
}

impl FrameContext {
    /// Context with landmarks only.
    pub fn with_landmarks(landmarks: Vec<Point2>) -> Self {
        Self {
            landmarks: Some(landmarks),
            detections: Vec::new(),
        }
    }

    /// Context with no face and no detections.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(landmarks: Option<Vec<Point2>>, detections: Vec<Detection>) -> Self {
        Self {
            landmarks,
            detections,
        }
    }
}
