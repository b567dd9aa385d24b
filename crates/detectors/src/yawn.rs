//! Yawn detection (MAR with hysteresis)
//!
//! Mouth open at or above `mar_threshold`, closed again at or below
//! `mar_threshold * hysteresis_ratio`. Inside the band, state holds.
//! A yawn becomes active after `min_duration_frames` consecutive open
//! frames and stays latched until the closing transition, which
//! increments the lifetime yawn count exactly once.

use geometry::compute_mar;
use smoothing::ExpSmoother;

use crate::config::{validate_fps, ConfigError, YawnConfig};
use crate::context::FrameContext;
use crate::metric::{Metric, MetricError};
use crate::value::{MetricRecord, MetricValue};

pub struct Yawn {
    open_threshold: f32,
    close_threshold: f32,
    min_duration_frames: u32,
    smoother: ExpSmoother,
    open_frames: u32,
    active: bool,
    yawn_count: u64,
}

impl Yawn {
    pub fn new(config: YawnConfig, fps: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_fps(fps)?;
        Ok(Self {
            open_threshold: config.mar_threshold,
            close_threshold: config.mar_threshold * config.hysteresis_ratio,
            min_duration_frames: config.min_duration_frames,
            smoother: ExpSmoother::new(config.smoothing_alpha, config.max_missing)?,
            open_frames: 0,
            active: false,
            yawn_count: 0,
        })
    }

    fn progress(&self) -> f64 {
        (self.open_frames as f64 / self.min_duration_frames as f64).min(1.0)
    }

    fn output(&self, mar: Option<f32>) -> MetricRecord {
        let mut record = MetricRecord::new();
        record.insert("mar".into(), MetricValue::from_opt_f32(mar));
        record.insert("yawn_alert".into(), MetricValue::Bool(self.active));
        record.insert("yawn_progress".into(), MetricValue::Float(self.progress()));
        record.insert("yawn_count".into(), MetricValue::Int(self.yawn_count as i64));
        record
    }
}

impl Metric for Yawn {
    fn name(&self) -> &'static str {
        "yawn"
    }

    fn update(&mut self, context: &FrameContext) -> Result<MetricRecord, MetricError> {
        let raw = context.landmarks.as_deref().and_then(compute_mar);
        let Some(mar) = self.smoother.update(raw) else {
            // Transient dropout: preserve yawn progress and state.
            return Ok(self.output(None));
        };

        if mar >= self.open_threshold {
            self.open_frames += 1;
        } else if mar <= self.close_threshold {
            if self.active {
                self.yawn_count += 1;
            }
            self.open_frames = 0;
            self.active = false;
        }
        // Inside the hysteresis band: hold.

        if self.open_frames >= self.min_duration_frames {
            self.active = true;
        }

        Ok(self.output(Some(mar)))
    }

    fn reset(&mut self) {
        self.smoother.reset();
        self.open_frames = 0;
        self.active = false;
        self.yawn_count = 0;
    }
}
