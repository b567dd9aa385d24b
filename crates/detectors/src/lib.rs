//! Driver-state signal detectors
//!
//! Five independent stateful detectors convert noisy per-frame
//! measurements into debounced, hysteretic alerts:
//! - Eye closure (EAR + PERCLOS)
//! - Yawn (MAR with hysteresis and lifetime count)
//! - Head pose (calibration-relative yaw/pitch/roll)
//! - Gaze (iris-based on/off-range with debounce)
//! - Phone usage (object detections with gap tolerance)
//!
//! The [`MetricEngine`] runs all of them against one frame's context
//! and merges their outputs into a single flat record.

pub mod config;
pub mod context;
pub mod engine;
pub mod eye_closure;
pub mod gaze;
pub mod head_pose;
pub mod metric;
pub mod phone_usage;
pub mod value;
pub mod yawn;

pub use config::{
    ConfigError, EyeClosureConfig, GazeConfig, HeadPoseConfig, PhoneUsageConfig, YawnConfig,
};
pub use context::FrameContext;
pub use engine::MetricEngine;
pub use eye_closure::EyeClosure;
pub use gaze::Gaze;
pub use head_pose::HeadPose;
pub use metric::{Metric, MetricError};
pub use phone_usage::PhoneUsage;
pub use value::{has_active_alert, MetricRecord, MetricValue, ALERT_SUFFIX};
pub use yawn::Yawn;
