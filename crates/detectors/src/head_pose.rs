//! Head pose deviation detection
//!
//! Yaw/pitch/roll come from 2D landmark geometry. A calibration phase
//! averages the first `calibration_sec` worth of valid frames into a
//! per-session baseline; afterwards, reported angles are
//! baseline-relative and each axis independently debounces past its
//! threshold. Unlike eye closure there is no hysteresis: an axis
//! alert clears the moment the axis returns under threshold.
//!
//! Losing the face for `missing_reset_sec` discards the baseline and
//! restarts calibration, as does an explicit recalibration request.

use geometry::head_pose_angles;
use tracing::debug;

use crate::config::{sec_to_frames, validate_fps, ConfigError, HeadPoseConfig};
use crate::context::FrameContext;
use crate::metric::{Metric, MetricError};
use crate::value::{MetricRecord, MetricValue};

const YAW: usize = 0;
const PITCH: usize = 1;
const ROLL: usize = 2;

pub struct HeadPose {
    thresholds: [f32; 3],
    yaw_scale: f32,
    pitch_scale: f32,
    calibration_frames: u32,
    min_sustained_frames: u32,
    missing_reset_frames: u32,

    baseline: Option<[f32; 3]>,
    calib_sum: [f32; 3],
    calib_count: u32,
    missing_streak: u32,
    sustained: [u32; 3],
    alerts: [bool; 3],
}

impl HeadPose {
    pub fn new(config: HeadPoseConfig, fps: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_fps(fps)?;
        Ok(Self {
            thresholds: [
                config.yaw_threshold,
                config.pitch_threshold,
                config.roll_threshold,
            ],
            yaw_scale: config.yaw_scale,
            pitch_scale: config.pitch_scale,
            calibration_frames: sec_to_frames(config.calibration_sec, fps),
            min_sustained_frames: sec_to_frames(config.min_sustained_sec, fps),
            missing_reset_frames: sec_to_frames(config.missing_reset_sec, fps),
            baseline: None,
            calib_sum: [0.0; 3],
            calib_count: 0,
            missing_streak: 0,
            sustained: [0; 3],
            alerts: [false; 3],
        })
    }

    fn discard_baseline(&mut self) {
        self.baseline = None;
        self.calib_sum = [0.0; 3];
        self.calib_count = 0;
        self.sustained = [0; 3];
        self.alerts = [false; 3];
    }

    fn output(&self, angles: Option<[f32; 3]>) -> MetricRecord {
        let mut record = MetricRecord::new();
        let get = |axis: usize| MetricValue::from_opt_f32(angles.map(|a| a[axis]));
        record.insert("yaw".into(), get(YAW));
        record.insert("pitch".into(), get(PITCH));
        record.insert("roll".into(), get(ROLL));
        record.insert(
            "calibrating".into(),
            MetricValue::Bool(self.baseline.is_none()),
        );
        record.insert("yaw_alert".into(), MetricValue::Bool(self.alerts[YAW]));
        record.insert("pitch_alert".into(), MetricValue::Bool(self.alerts[PITCH]));
        record.insert("roll_alert".into(), MetricValue::Bool(self.alerts[ROLL]));
        record.insert(
            "head_pose_alert".into(),
            MetricValue::Bool(self.alerts.iter().any(|&a| a)),
        );
        record
    }
}

impl Metric for HeadPose {
    fn name(&self) -> &'static str {
        "head_pose"
    }

    fn update(&mut self, context: &FrameContext) -> Result<MetricRecord, MetricError> {
        let angles = context
            .landmarks
            .as_deref()
            .and_then(|l| head_pose_angles(l, self.yaw_scale, self.pitch_scale));

        let Some((yaw, pitch, roll)) = angles else {
            self.missing_streak += 1;
            if self.missing_streak >= self.missing_reset_frames && self.baseline.is_some() {
                debug!("face lost for {} frames, restarting head pose calibration", self.missing_streak);
                self.discard_baseline();
            }
            return Ok(self.output(None));
        };
        self.missing_streak = 0;
        let raw = [yaw, pitch, roll];

        let Some(baseline) = self.baseline else {
            // Calibration phase: accumulate the baseline, report raw
            // angles, fire nothing.
            for axis in 0..3 {
                self.calib_sum[axis] += raw[axis];
            }
            self.calib_count += 1;
            if self.calib_count >= self.calibration_frames {
                let n = self.calib_count as f32;
                self.baseline = Some([
                    self.calib_sum[YAW] / n,
                    self.calib_sum[PITCH] / n,
                    self.calib_sum[ROLL] / n,
                ]);
                debug!(baseline = ?self.baseline, "head pose calibrated");
            }
            let mut record = self.output(Some(raw));
            // The completing frame still reports as calibrating.
            record.insert("calibrating".into(), MetricValue::Bool(true));
            return Ok(record);
        };

        let mut relative = [0.0f32; 3];
        for axis in 0..3 {
            relative[axis] = raw[axis] - baseline[axis];
            if relative[axis].abs() > self.thresholds[axis] {
                self.sustained[axis] += 1;
                if self.sustained[axis] >= self.min_sustained_frames {
                    self.alerts[axis] = true;
                }
            } else {
                // No hysteresis on this detector: clear immediately.
                self.sustained[axis] = 0;
                self.alerts[axis] = false;
            }
        }

        Ok(self.output(Some(relative)))
    }

    fn reset(&mut self) {
        self.discard_baseline();
        self.missing_streak = 0;
    }

    fn recalibrate(&mut self) {
        debug!("head pose recalibration requested");
        self.discard_baseline();
    }
}
