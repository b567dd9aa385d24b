//! Mouth aspect ratio (MAR)
//!
//! Vertical inner-lip distance over horizontal mouth-corner distance.
//! High values indicate an open mouth.

use crate::point::{euclidean_dist, Point2};

const UPPER_LIP: usize = 13;
const LOWER_LIP: usize = 14;
const LEFT_CORNER: usize = 61;
const RIGHT_CORNER: usize = 291;

const MIN_MOUTH_SPAN: f32 = 1e-9;

/// Compute MAR. `None` when the landmark set is too short or the
/// mouth span is degenerate.
pub fn compute_mar(landmarks: &[Point2]) -> Option<f32> {
    if landmarks.len() <= RIGHT_CORNER {
        return None;
    }
    let top = landmarks[UPPER_LIP];
    let bottom = landmarks[LOWER_LIP];
    let left = landmarks[LEFT_CORNER];
    let right = landmarks[RIGHT_CORNER];

    let horizontal = euclidean_dist(left, right);
    if horizontal <= MIN_MOUTH_SPAN {
        return None;
    }
    Some(euclidean_dist(top, bottom) / horizontal)
}
