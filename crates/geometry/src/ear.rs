//! Eye aspect ratio (EAR)
//!
//! EAR = (|p2-p6| + |p3-p5|) / (2 * |p1-p4|) over six landmarks per
//! eye: the horizontal corners (p1, p4) and two upper/lower lid pairs.
//! Low values indicate a closed eye.

use crate::point::{euclidean_dist, Point2};

/// Six-landmark ring for the left eye.
pub const LEFT_EYE_INDICES: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Six-landmark ring for the right eye.
pub const RIGHT_EYE_INDICES: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Compute EAR for one eye. `None` when the landmark set is too short
/// or the horizontal eye span is degenerate.
pub fn compute_ear(landmarks: &[Point2], indices: &[usize; 6]) -> Option<f32> {
    let max_idx = *indices.iter().max().unwrap_or(&0);
    if landmarks.len() <= max_idx {
        return None;
    }
    let p1 = landmarks[indices[0]];
    let p2 = landmarks[indices[1]];
    let p3 = landmarks[indices[2]];
    let p4 = landmarks[indices[3]];
    let p5 = landmarks[indices[4]];
    let p6 = landmarks[indices[5]];

    let a = euclidean_dist(p2, p6);
    let b = euclidean_dist(p3, p5);
    let c = euclidean_dist(p1, p4);
    if c <= 0.0 {
        return None;
    }
    Some((a + b) / (2.0 * c))
}

/// Average EAR across both eyes.
pub fn average_ear(landmarks: &[Point2]) -> Option<f32> {
    let left = compute_ear(landmarks, &LEFT_EYE_INDICES)?;
    let right = compute_ear(landmarks, &RIGHT_EYE_INDICES)?;
    Some((left + right) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_with_ear(openness: f32) -> Vec<Point2> {
        // Eye corners 0.1 apart horizontally, lids `openness` apart
        // vertically, mirrored for both eyes.
        let mut landmarks = vec![(0.5, 0.5); 478];
        for indices in [&LEFT_EYE_INDICES, &RIGHT_EYE_INDICES] {
            landmarks[indices[0]] = (0.4, 0.5);
            landmarks[indices[3]] = (0.5, 0.5);
            landmarks[indices[1]] = (0.43, 0.5 - openness / 2.0);
            landmarks[indices[5]] = (0.43, 0.5 + openness / 2.0);
            landmarks[indices[2]] = (0.47, 0.5 - openness / 2.0);
            landmarks[indices[4]] = (0.47, 0.5 + openness / 2.0);
        }
        landmarks
    }

    #[test]
    fn test_open_eye_has_higher_ear() {
        let open = average_ear(&face_with_ear(0.04)).unwrap();
        let closed = average_ear(&face_with_ear(0.005)).unwrap();
        assert!(open > closed);
        assert!(closed < 0.1);
    }

    #[test]
    fn test_expected_ratio() {
        // Vertical spans of 0.03 against a horizontal span of 0.1:
        // EAR = (0.03 + 0.03) / (2 * 0.1) = 0.3
        let ear = average_ear(&face_with_ear(0.03)).unwrap();
        assert!((ear - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_insufficient_landmarks() {
        let landmarks = vec![(0.5, 0.5); 10];
        assert!(average_ear(&landmarks).is_none());
    }

    #[test]
    fn test_degenerate_span() {
        // All points collapsed: zero horizontal span.
        let landmarks = vec![(0.5, 0.5); 478];
        assert!(average_ear(&landmarks).is_none());
    }
}
