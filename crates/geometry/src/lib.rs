//! 2D facial landmark geometry
//!
//! Pure functions over normalized (x, y) landmark sets:
//! - Eye aspect ratio (EAR) for eye-closure detection
//! - Mouth aspect ratio (MAR) for yawn detection
//! - Per-eye gaze ratios from iris position
//! - Head pose angles (yaw, pitch, roll) without 3D calibration
//!
//! Landmark indices follow the MediaPipe face mesh layout
//! (468 mesh points plus 10 iris points).

pub mod ear;
pub mod gaze;
pub mod head_pose;
pub mod mar;
pub mod point;

pub use ear::{average_ear, compute_ear, LEFT_EYE_INDICES, RIGHT_EYE_INDICES};
pub use gaze::{left_eye_gaze_ratio, right_eye_gaze_ratio};
pub use head_pose::head_pose_angles;
pub use mar::compute_mar;
pub use point::{average_point, euclidean_dist, in_range, Point2};

/// Landmark indices that carry the signal the detectors consume:
/// both eyes, the mouth corners and inner lips, the pose anchor
/// points, and the iris rings. Per-frame output flattens this subset
/// instead of shipping the full mesh.
pub const ESSENTIAL_LANDMARKS: &[usize] = &[
    // Pose anchors: nose tip, nose bridge, forehead, chin, cheeks
    4, 6, 10, 175, 234, 454,
    // Mouth: inner lips + corners
    13, 14, 61, 291,
    // Left eye ring + lids
    33, 133, 144, 145, 153, 158, 159, 160,
    // Right eye ring + lids
    362, 263, 373, 374, 380, 385, 386, 387,
    // Iris points
    468, 469, 470, 471, 472, 473, 474, 475, 476, 477,
];

/// Flatten the essential landmark subset into `[x0, y0, x1, y1, ...]`.
/// Returns `None` when the landmark set is too short to index.
pub fn flatten_essential(landmarks: &[Point2]) -> Option<Vec<f32>> {
    let max_idx = *ESSENTIAL_LANDMARKS.iter().max().unwrap_or(&0);
    if landmarks.len() <= max_idx {
        return None;
    }
    let mut flat = Vec::with_capacity(ESSENTIAL_LANDMARKS.len() * 2);
    for &idx in ESSENTIAL_LANDMARKS {
        let (x, y) = landmarks[idx];
        flat.push(x);
        flat.push(y);
    }
    Some(flat)
}
