//! Detector engine
//!
//! Owns the detector set for one session and folds each frame through
//! all of them, merging their records into a single flat output. A
//! detector failure is logged and skipped; the other detectors still
//! contribute their keys for that frame.

use tracing::error;

use crate::config::{
    ConfigError, EyeClosureConfig, GazeConfig, HeadPoseConfig, PhoneUsageConfig, YawnConfig,
};
use crate::context::FrameContext;
use crate::eye_closure::EyeClosure;
use crate::gaze::Gaze;
use crate::head_pose::HeadPose;
use crate::metric::Metric;
use crate::phone_usage::PhoneUsage;
use crate::value::MetricRecord;
use crate::yawn::Yawn;

pub struct MetricEngine {
    metrics: Vec<Box<dyn Metric>>,
}

impl MetricEngine {
    /// Engine over an explicit detector set.
    pub fn new(metrics: Vec<Box<dyn Metric>>) -> Self {
        Self { metrics }
    }

    /// Engine with the full default detector set at the given frame
    /// rate.
    pub fn with_defaults(fps: u32) -> Result<Self, ConfigError> {
        Ok(Self::new(vec![
            Box::new(EyeClosure::new(EyeClosureConfig::default(), fps)?),
            Box::new(Yawn::new(YawnConfig::default(), fps)?),
            Box::new(HeadPose::new(HeadPoseConfig::default(), fps)?),
            Box::new(Gaze::new(GazeConfig::default(), fps)?),
            Box::new(PhoneUsage::new(PhoneUsageConfig::default(), fps)?),
        ]))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Fold one frame through every detector. Later detectors win on
    /// key collisions; detector names are distinct enough that none
    /// occur with the default set.
    pub fn update(&mut self, context: &FrameContext) -> MetricRecord {
        let mut merged = MetricRecord::new();
        for metric in &mut self.metrics {
            match metric.update(context) {
                Ok(record) => merged.extend(record),
                Err(err) => {
                    error!(metric = metric.name(), %err, "detector update failed");
                }
            }
        }
        merged
    }

    /// Return every detector to its initial state.
    pub fn reset(&mut self) {
        for metric in &mut self.metrics {
            metric.reset();
        }
    }

    /// Discard learned baselines in detectors that calibrate.
    pub fn recalibrate(&mut self) {
        for metric in &mut self.metrics {
            metric.recalibrate();
        }
    }
}
