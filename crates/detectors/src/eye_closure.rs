//! Eye closure detection (EAR + PERCLOS)
//!
//! Two thresholds with hysteresis: eyes count as closed at or below
//! `ear_threshold`, and only count as open again at or above
//! `ear_threshold / hysteresis_ratio`. The closure alert latches
//! after `min_duration_frames` consecutive closed frames and clears
//! only on the open threshold. A rolling window independently tracks
//! PERCLOS, the fraction of recent frames with eyes below the close
//! threshold.

use std::collections::VecDeque;

use geometry::average_ear;
use smoothing::ExpSmoother;

use crate::config::{sec_to_frames, validate_fps, ConfigError, EyeClosureConfig};
use crate::context::FrameContext;
use crate::metric::{Metric, MetricError};
use crate::value::{MetricRecord, MetricValue};

pub struct EyeClosure {
    close_threshold: f32,
    open_threshold: f32,
    min_duration_frames: u32,
    perclos_threshold: f32,
    window_size: usize,
    smoother: ExpSmoother,
    /// Per-frame "EAR below close" history for PERCLOS.
    history: VecDeque<bool>,
    closed_frames: u32,
    alert: bool,
}

impl EyeClosure {
    pub fn new(config: EyeClosureConfig, fps: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_fps(fps)?;
        let window_size = sec_to_frames(config.window_sec, fps) as usize;
        Ok(Self {
            close_threshold: config.ear_threshold,
            open_threshold: config.ear_threshold / config.hysteresis_ratio,
            min_duration_frames: config.min_duration_frames,
            perclos_threshold: config.perclos_threshold,
            window_size,
            smoother: ExpSmoother::new(config.smoothing_alpha, config.max_missing)?,
            history: VecDeque::with_capacity(window_size),
            closed_frames: 0,
            alert: false,
        })
    }

    fn perclos(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let closed = self.history.iter().filter(|&&c| c).count();
        closed as f64 / self.history.len() as f64
    }

    fn output(&self, ear: Option<f32>) -> MetricRecord {
        let perclos = self.perclos();
        let mut record = MetricRecord::new();
        record.insert("ear".into(), MetricValue::from_opt_f32(ear));
        record.insert("eye_closed_alert".into(), MetricValue::Bool(self.alert));
        record.insert("perclos".into(), MetricValue::Float(perclos));
        record.insert(
            "perclos_alert".into(),
            MetricValue::Bool(perclos >= self.perclos_threshold as f64),
        );
        record
    }
}

impl Metric for EyeClosure {
    fn name(&self) -> &'static str {
        "eye_closure"
    }

    fn update(&mut self, context: &FrameContext) -> Result<MetricRecord, MetricError> {
        let raw = context.landmarks.as_deref().and_then(average_ear);
        let Some(ear) = self.smoother.update(raw) else {
            // Missing for too long: hold the latched state, report
            // null measurements.
            return Ok(self.output(None));
        };

        if ear <= self.close_threshold {
            self.closed_frames += 1;
        } else if ear >= self.open_threshold {
            self.closed_frames = 0;
            self.alert = false;
        }
        if self.closed_frames >= self.min_duration_frames {
            self.alert = true;
        }

        if self.history.len() == self.window_size {
            self.history.pop_front();
        }
        self.history.push_back(ear <= self.close_threshold);

        Ok(self.output(Some(ear)))
    }

    fn reset(&mut self) {
        self.smoother.reset();
        self.history.clear();
        self.closed_frames = 0;
        self.alert = false;
    }
}
