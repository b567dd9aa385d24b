//! Gaze deviation detection
//!
//! Each eye's iris ratio is smoothed independently; the frame counts
//! as on-road only when every eye that produced a ratio sits inside
//! both the horizontal and vertical acceptance ranges. With a face in
//! frame but no usable iris in either eye, the gaze is treated as
//! off-range. With no face at all the detector holds its state.

use geometry::{in_range, left_eye_gaze_ratio, right_eye_gaze_ratio};
use smoothing::VecSmoother;

use crate::config::{sec_to_frames, validate_fps, ConfigError, GazeConfig};
use crate::context::FrameContext;
use crate::metric::{Metric, MetricError};
use crate::value::{MetricRecord, MetricValue};

pub struct Gaze {
    horizontal_range: (f32, f32),
    vertical_range: (f32, f32),
    min_sustained_frames: u32,
    left: VecSmoother,
    right: VecSmoother,
    off_frames: u32,
    alert: bool,
}

impl Gaze {
    pub fn new(config: GazeConfig, fps: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_fps(fps)?;
        Ok(Self {
            horizontal_range: config.horizontal_range,
            vertical_range: config.vertical_range,
            min_sustained_frames: sec_to_frames(config.min_sustained_sec, fps),
            left: VecSmoother::new(config.smoothing_alpha, config.max_missing)?,
            right: VecSmoother::new(config.smoothing_alpha, config.max_missing)?,
            off_frames: 0,
            alert: false,
        })
    }

    fn eye_on_range(&self, ratio: &[f32]) -> bool {
        in_range(Some(ratio[0]), self.horizontal_range).unwrap_or(false)
            && in_range(Some(ratio[1]), self.vertical_range).unwrap_or(false)
    }

    fn output(&self, gaze: Option<(f32, f32)>) -> MetricRecord {
        let sustained =
            (self.off_frames as f64 / self.min_sustained_frames as f64).min(1.0);
        let mut record = MetricRecord::new();
        record.insert(
            "gaze_x".into(),
            MetricValue::from_opt_f32(gaze.map(|g| g.0)),
        );
        record.insert(
            "gaze_y".into(),
            MetricValue::from_opt_f32(gaze.map(|g| g.1)),
        );
        record.insert("gaze_alert".into(), MetricValue::Bool(self.alert));
        record.insert("gaze_sustained".into(), MetricValue::Float(sustained));
        record
    }
}

impl Metric for Gaze {
    fn name(&self) -> &'static str {
        "gaze"
    }

    fn update(&mut self, context: &FrameContext) -> Result<MetricRecord, MetricError> {
        let Some(landmarks) = context.landmarks.as_deref() else {
            // No face: feed the gap so holds expire, keep state.
            self.left.update(None);
            self.right.update(None);
            return Ok(self.output(None));
        };

        let left_raw = left_eye_gaze_ratio(landmarks).map(|(x, y)| [x, y]);
        let right_raw = right_eye_gaze_ratio(landmarks).map(|(x, y)| [x, y]);
        let left = self.left.update(left_raw.as_ref().map(|r| r.as_slice()));
        let right = self.right.update(right_raw.as_ref().map(|r| r.as_slice()));

        // Face present but neither iris usable counts as off-range.
        let eyes: Vec<&Vec<f32>> = [left.as_ref(), right.as_ref()]
            .into_iter()
            .flatten()
            .collect();
        let on_range = !eyes.is_empty() && eyes.iter().all(|r| self.eye_on_range(r));

        if on_range {
            self.off_frames = 0;
            self.alert = false;
        } else {
            self.off_frames += 1;
            if self.off_frames >= self.min_sustained_frames {
                self.alert = true;
            }
        }

        let gaze = if eyes.is_empty() {
            None
        } else {
            let n = eyes.len() as f32;
            Some((
                eyes.iter().map(|r| r[0]).sum::<f32>() / n,
                eyes.iter().map(|r| r[1]).sum::<f32>() / n,
            ))
        };
        Ok(self.output(gaze))
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.off_frames = 0;
        self.alert = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT_IRIS: [usize; 5] = [468, 469, 470, 471, 472];
    const RIGHT_IRIS: [usize; 5] = [473, 474, 475, 476, 477];

    /// Both eyes gazing at horizontal fraction `fx`, vertical `fy`.
    fn face_with_gaze(fx: f32, fy: f32) -> FrameContext {
        let mut landmarks = vec![(0.5, 0.5); 478];
        landmarks[33] = (0.30, 0.50);
        landmarks[133] = (0.40, 0.50);
        landmarks[159] = (0.35, 0.48);
        landmarks[145] = (0.35, 0.52);
        for &idx in &LEFT_IRIS {
            landmarks[idx] = (0.30 + fx * 0.10, 0.48 + fy * 0.04);
        }
        landmarks[362] = (0.60, 0.50);
        landmarks[263] = (0.70, 0.50);
        landmarks[386] = (0.65, 0.48);
        landmarks[374] = (0.65, 0.52);
        for &idx in &RIGHT_IRIS {
            landmarks[idx] = (0.70 - fx * 0.10, 0.48 + fy * 0.04);
        }
        FrameContext::with_landmarks(landmarks)
    }

    fn detector() -> Gaze {
        let config = GazeConfig {
            smoothing_alpha: 1.0,
            ..Default::default()
        };
        // 10 fps, min_sustained_sec 0.5 -> 5 frames
        Gaze::new(config, 10).unwrap()
    }

    fn alert_of(record: &MetricRecord) -> bool {
        record["gaze_alert"].as_bool().unwrap()
    }

    #[test]
    fn test_centered_gaze_never_alerts() {
        let mut det = detector();
        for _ in 0..20 {
            let out = det.update(&face_with_gaze(0.5, 0.5)).unwrap();
            assert!(!alert_of(&out));
            assert!((out["gaze_x"].as_f64().unwrap() - 0.5).abs() < 1e-3);
        }
    }

    #[test]
    fn test_sustained_off_range_alerts() {
        let mut det = detector();
        for _ in 0..4 {
            let out = det.update(&face_with_gaze(0.1, 0.5)).unwrap();
            assert!(!alert_of(&out));
        }
        let out = det.update(&face_with_gaze(0.1, 0.5)).unwrap();
        assert!(alert_of(&out));
        assert_eq!(out["gaze_sustained"].as_f64().unwrap(), 1.0);
    }

    #[test]
    fn test_return_to_range_clears() {
        let mut det = detector();
        for _ in 0..6 {
            det.update(&face_with_gaze(0.9, 0.5)).unwrap();
        }
        let out = det.update(&face_with_gaze(0.5, 0.5)).unwrap();
        assert!(!alert_of(&out));
        assert_eq!(out["gaze_sustained"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn test_face_without_iris_is_off_range() {
        let mut det = detector();
        // Flat 478-point face: degenerate eye spans, no ratio.
        let flat = FrameContext::with_landmarks(vec![(0.5, 0.5); 478]);
        for _ in 0..5 {
            det.update(&flat).unwrap();
        }
        let out = det.update(&flat).unwrap();
        assert!(alert_of(&out));
        assert!(out["gaze_x"].is_null());
    }

    #[test]
    fn test_no_face_holds_state() {
        let mut det = detector();
        for _ in 0..6 {
            det.update(&face_with_gaze(0.1, 0.5)).unwrap();
        }
        let out = det.update(&FrameContext::empty()).unwrap();
        assert!(alert_of(&out));
        assert!(out["gaze_x"].is_null());
    }

    #[test]
    fn test_reset_equals_fresh() {
        let mut warmed = detector();
        for _ in 0..8 {
            warmed.update(&face_with_gaze(0.1, 0.5)).unwrap();
        }
        warmed.update(&FrameContext::empty()).unwrap();
        warmed.reset();

        let mut fresh = detector();
        let replay = [
            face_with_gaze(0.5, 0.5),
            face_with_gaze(0.9, 0.5),
            face_with_gaze(0.9, 0.5),
            FrameContext::empty(),
            face_with_gaze(0.9, 0.5),
            face_with_gaze(0.5, 0.5),
        ];
        for ctx in &replay {
            let a = warmed.update(ctx).unwrap();
            let b = fresh.update(ctx).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_vertical_off_range_counts() {
        let mut det = detector();
        for _ in 0..5 {
            det.update(&face_with_gaze(0.5, 0.9)).unwrap();
        }
        let out = det.update(&face_with_gaze(0.5, 0.9)).unwrap();
        assert!(alert_of(&out));
    }
}
