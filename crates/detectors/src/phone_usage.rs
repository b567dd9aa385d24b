//! Phone usage detection
//!
//! A frame counts as a hit when any object detection matches the
//! configured class at or above the confidence threshold. Usage
//! progress accumulates over hits and tolerates short detection gaps;
//! only a gap longer than `max_missed_sec` resets it.

use crate::config::{sec_to_frames, validate_fps, ConfigError, PhoneUsageConfig};
use crate::context::FrameContext;
use crate::metric::{Metric, MetricError};
use crate::value::{MetricRecord, MetricValue};

pub struct PhoneUsage {
    class_id: u32,
    confidence_threshold: f32,
    min_usage_frames: u32,
    max_missed_frames: u32,
    usage_frames: u32,
    missed_frames: u32,
    active: bool,
}

impl PhoneUsage {
    pub fn new(config: PhoneUsageConfig, fps: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_fps(fps)?;
        Ok(Self {
            class_id: config.class_id,
            confidence_threshold: config.confidence_threshold,
            min_usage_frames: sec_to_frames(config.min_usage_sec, fps),
            // Unlike the duration knobs this may legitimately be 0
            // (no gap tolerance), so no floor of 1 here.
            max_missed_frames: (config.max_missed_sec * fps as f32) as u32,
            usage_frames: 0,
            missed_frames: 0,
            active: false,
        })
    }

    fn output(&self) -> MetricRecord {
        let sustained =
            (self.usage_frames as f64 / self.min_usage_frames as f64).min(1.0);
        let mut record = MetricRecord::new();
        record.insert("phone_usage_alert".into(), MetricValue::Bool(self.active));
        record.insert(
            "phone_usage_sustained".into(),
            MetricValue::Float(sustained),
        );
        record
    }
}

impl Metric for PhoneUsage {
    fn name(&self) -> &'static str {
        "phone_usage"
    }

    fn update(&mut self, context: &FrameContext) -> Result<MetricRecord, MetricError> {
        let detected = context.detections.iter().any(|d| {
            d.class_id == self.class_id && d.confidence >= self.confidence_threshold
        });

        if detected {
            self.missed_frames = 0;
            if self.usage_frames < self.min_usage_frames {
                self.usage_frames += 1;
            }
            if self.usage_frames >= self.min_usage_frames {
                self.active = true;
            }
        } else {
            self.missed_frames += 1;
            if self.missed_frames > self.max_missed_frames {
                self.usage_frames = 0;
                self.missed_frames = 0;
                self.active = false;
            }
        }

        Ok(self.output())
    }

    fn reset(&mut self) {
        self.usage_frames = 0;
        self.missed_frames = 0;
        self.active = false;
    }
}
