//! Per-eye gaze ratios
//!
//! The iris centroid is located relative to the eye corners (x) and
//! eyelids (y), yielding a normalized (0-1, 0-1) gaze coordinate per
//! eye where (0.5, 0.5) is a centered gaze. The right eye's x ratio
//! is mirrored so both eyes share the same coordinate system.

use crate::point::{average_point, Point2};

const LEFT_EYE_CORNERS: (usize, usize) = (33, 133);
const RIGHT_EYE_CORNERS: (usize, usize) = (362, 263);
const LEFT_EYE_LIDS: (usize, usize) = (159, 145);
const RIGHT_EYE_LIDS: (usize, usize) = (386, 374);
const LEFT_IRIS: [usize; 5] = [468, 469, 470, 471, 472];
const RIGHT_IRIS: [usize; 5] = [473, 474, 475, 476, 477];

fn eye_gaze_ratio(
    landmarks: &[Point2],
    corners: (usize, usize),
    lids: (usize, usize),
    iris: &[usize],
    mirror_x: bool,
) -> Option<(f32, f32)> {
    let max_idx = iris
        .iter()
        .copied()
        .chain([corners.0, corners.1, lids.0, lids.1])
        .max()?;
    if landmarks.len() <= max_idx {
        return None;
    }

    let iris_center = average_point(landmarks, iris)?;
    let width = landmarks[corners.1].0 - landmarks[corners.0].0;
    let height = landmarks[lids.1].1 - landmarks[lids.0].1;
    if width == 0.0 || height == 0.0 {
        return None;
    }

    let mut gaze_x = (iris_center.0 - landmarks[corners.0].0) / width;
    let gaze_y = (iris_center.1 - landmarks[lids.0].1) / height;
    if mirror_x {
        gaze_x = 1.0 - gaze_x;
    }
    Some((gaze_x, gaze_y))
}

/// Gaze ratio for the left eye, `None` when not computable
/// (occlusion, closed eye, insufficient landmarks).
pub fn left_eye_gaze_ratio(landmarks: &[Point2]) -> Option<(f32, f32)> {
    eye_gaze_ratio(landmarks, LEFT_EYE_CORNERS, LEFT_EYE_LIDS, &LEFT_IRIS, false)
}

/// Gaze ratio for the right eye, x mirrored for symmetry with the left.
pub fn right_eye_gaze_ratio(landmarks: &[Point2]) -> Option<(f32, f32)> {
    eye_gaze_ratio(
        landmarks,
        RIGHT_EYE_CORNERS,
        RIGHT_EYE_LIDS,
        &RIGHT_IRIS,
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Both irises at a horizontal fraction `fx` and vertical
    /// fraction `fy` of their eye spans.
    fn face_with_gaze(fx: f32, fy: f32) -> Vec<Point2> {
        let mut landmarks = vec![(0.5, 0.5); 478];

        landmarks[LEFT_EYE_CORNERS.0] = (0.30, 0.50);
        landmarks[LEFT_EYE_CORNERS.1] = (0.40, 0.50);
        landmarks[LEFT_EYE_LIDS.0] = (0.35, 0.48);
        landmarks[LEFT_EYE_LIDS.1] = (0.35, 0.52);
        for &idx in &LEFT_IRIS {
            landmarks[idx] = (0.30 + fx * 0.10, 0.48 + fy * 0.04);
        }

        landmarks[RIGHT_EYE_CORNERS.0] = (0.60, 0.50);
        landmarks[RIGHT_EYE_CORNERS.1] = (0.70, 0.50);
        landmarks[RIGHT_EYE_LIDS.0] = (0.65, 0.48);
        landmarks[RIGHT_EYE_LIDS.1] = (0.65, 0.52);
        for &idx in &RIGHT_IRIS {
            // Mirrored placement so both eyes agree after mirroring.
            landmarks[idx] = (0.70 - fx * 0.10, 0.48 + fy * 0.04);
        }
        landmarks
    }

    #[test]
    fn test_centered_gaze() {
        let landmarks = face_with_gaze(0.5, 0.5);
        let (lx, ly) = left_eye_gaze_ratio(&landmarks).unwrap();
        let (rx, ry) = right_eye_gaze_ratio(&landmarks).unwrap();
        assert!((lx - 0.5).abs() < 1e-3);
        assert!((ly - 0.5).abs() < 1e-3);
        assert!((rx - 0.5).abs() < 1e-3);
        assert!((ry - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_mirrored_right_eye() {
        let landmarks = face_with_gaze(0.2, 0.5);
        let (lx, _) = left_eye_gaze_ratio(&landmarks).unwrap();
        let (rx, _) = right_eye_gaze_ratio(&landmarks).unwrap();
        // Physical iris placement is mirrored, so ratios agree.
        assert!((lx - rx).abs() < 1e-3);
        assert!((lx - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_eye_span() {
        let landmarks = vec![(0.5, 0.5); 478];
        assert!(left_eye_gaze_ratio(&landmarks).is_none());
        assert!(right_eye_gaze_ratio(&landmarks).is_none());
    }

    #[test]
    fn test_insufficient_landmarks() {
        // No iris points in a 468-point mesh.
        let landmarks = vec![(0.5, 0.5); 468];
        assert!(left_eye_gaze_ratio(&landmarks).is_none());
    }
}
