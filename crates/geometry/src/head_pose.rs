//! Head pose angles from 2D landmarks
//!
//! Yaw, pitch, and roll in degrees estimated from geometric
//! relationships between landmark positions. No 3D coordinates or
//! camera calibration involved; the ratio-to-degree scale factors are
//! empirical and configurable.
//!
//! Conventions:
//! - yaw: positive = turning right, negative = turning left
//! - pitch: positive = looking up, negative = looking down
//! - roll: positive = clockwise tilt

use crate::point::{euclidean_dist, Point2};

const NOSE_TIP: usize = 4;
const CHIN: usize = 175;
const FOREHEAD: usize = 10;
const LEFT_EYE_OUTER: usize = 33;
const RIGHT_EYE_OUTER: usize = 263;
const LEFT_CHEEK: usize = 234;
const RIGHT_CHEEK: usize = 454;

/// Roll: angle of the line between outer eye corners.
fn compute_roll(landmarks: &[Point2]) -> Option<f32> {
    if landmarks.len() <= RIGHT_EYE_OUTER {
        return None;
    }
    let left = landmarks[LEFT_EYE_OUTER];
    let right = landmarks[RIGHT_EYE_OUTER];
    let dx = right.0 - left.0;
    let dy = right.1 - left.1;
    Some(dy.atan2(dx).to_degrees())
}

/// Yaw: normalized difference of nose-to-cheek distances. Turning the
/// head exposes more of one side of the face, skewing the ratio.
fn compute_yaw(landmarks: &[Point2], yaw_scale: f32) -> Option<f32> {
    if landmarks.len() <= RIGHT_CHEEK {
        return None;
    }
    let nose = landmarks[NOSE_TIP];
    let dist_left = euclidean_dist(nose, landmarks[LEFT_CHEEK]);
    let dist_right = euclidean_dist(nose, landmarks[RIGHT_CHEEK]);

    let total = dist_left + dist_right;
    if total == 0.0 {
        return None;
    }
    let ratio = (dist_right - dist_left) / total;
    Some(ratio * yaw_scale)
}

/// Pitch: vertical offset of the nose tip from the forehead-chin
/// midpoint, normalized by face height.
fn compute_pitch(landmarks: &[Point2], pitch_scale: f32) -> Option<f32> {
    if landmarks.len() <= CHIN {
        return None;
    }
    let nose = landmarks[NOSE_TIP];
    let chin = landmarks[CHIN];
    let forehead = landmarks[FOREHEAD];

    let face_center_y = (chin.1 + forehead.1) / 2.0;
    let face_height = (chin.1 - forehead.1).abs();
    if face_height == 0.0 {
        return None;
    }
    let offset = (nose.1 - face_center_y) / face_height;
    Some(-offset * pitch_scale)
}

/// Compute (yaw, pitch, roll) in degrees. `None` when the landmark
/// set is too short or the face geometry is degenerate.
pub fn head_pose_angles(
    landmarks: &[Point2],
    yaw_scale: f32,
    pitch_scale: f32,
) -> Option<(f32, f32, f32)> {
    let yaw = compute_yaw(landmarks, yaw_scale)?;
    let pitch = compute_pitch(landmarks, pitch_scale)?;
    let roll = compute_roll(landmarks)?;
    Some((yaw, pitch, roll))
}
