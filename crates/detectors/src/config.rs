//! Detector configuration
//!
//! All thresholds, hysteresis ratios, and durations are constructor
//! inputs and validated up front: an out-of-range value is a fatal
//! configuration error, never silently clamped.

use serde::{Deserialize, Serialize};
use smoothing::SmoothingError;
use thiserror::Error;
use vision::detect::PHONE_CLASS_ID;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("target fps must be at least 1")]
    InvalidFps,

    #[error(transparent)]
    Smoothing(#[from] SmoothingError),
}

fn require(
    ok: bool,
    field: &'static str,
    value: f64,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

/// Eye closure detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EyeClosureConfig {
    /// EAR at or below which eyes count as closed
    pub ear_threshold: f32,
    /// Close/open threshold ratio; open = ear_threshold / ratio
    pub hysteresis_ratio: f32,
    /// Consecutive closed frames before the alert latches
    pub min_duration_frames: u32,
    /// PERCLOS ratio at or above which its alert fires
    pub perclos_threshold: f32,
    /// Rolling PERCLOS window duration (seconds)
    pub window_sec: f32,
    /// EMA alpha for EAR smoothing
    pub smoothing_alpha: f32,
    /// Consecutive missing frames the smoother bridges
    pub max_missing: u32,
}

impl Default for EyeClosureConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.20,
            hysteresis_ratio: 0.9,
            min_duration_frames: 8,
            perclos_threshold: 0.4,
            window_sec: 10.0,
            smoothing_alpha: 0.5,
            max_missing: 5,
        }
    }
}

impl EyeClosureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(
            self.ear_threshold > 0.0,
            "ear_threshold",
            self.ear_threshold as f64,
            "> 0",
        )?;
        require(
            self.hysteresis_ratio > 0.0 && self.hysteresis_ratio < 1.0,
            "hysteresis_ratio",
            self.hysteresis_ratio as f64,
            "(0, 1)",
        )?;
        require(
            self.min_duration_frames >= 1,
            "min_duration_frames",
            self.min_duration_frames as f64,
            ">= 1",
        )?;
        require(
            self.perclos_threshold > 0.0 && self.perclos_threshold <= 1.0,
            "perclos_threshold",
            self.perclos_threshold as f64,
            "(0, 1]",
        )?;
        require(
            self.window_sec > 0.0,
            "window_sec",
            self.window_sec as f64,
            "> 0",
        )?;
        Ok(())
    }
}

/// Yawn detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YawnConfig {
    /// MAR at or above which the mouth counts as open
    pub mar_threshold: f32,
    /// Close/open threshold ratio; close = mar_threshold * ratio
    pub hysteresis_ratio: f32,
    /// Consecutive open frames before a yawn counts
    pub min_duration_frames: u32,
    /// EMA alpha for MAR smoothing
    pub smoothing_alpha: f32,
    /// Consecutive missing frames the smoother bridges
    pub max_missing: u32,
}

impl Default for YawnConfig {
    fn default() -> Self {
        Self {
            mar_threshold: 0.6,
            hysteresis_ratio: 0.9,
            min_duration_frames: 15,
            smoothing_alpha: 0.3,
            max_missing: 5,
        }
    }
}

impl YawnConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(
            self.mar_threshold > 0.0,
            "mar_threshold",
            self.mar_threshold as f64,
            "> 0",
        )?;
        require(
            self.hysteresis_ratio > 0.0 && self.hysteresis_ratio < 1.0,
            "hysteresis_ratio",
            self.hysteresis_ratio as f64,
            "(0, 1)",
        )?;
        require(
            self.min_duration_frames >= 1,
            "min_duration_frames",
            self.min_duration_frames as f64,
            ">= 1",
        )?;
        Ok(())
    }
}

/// Head pose detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadPoseConfig {
    /// Baseline-relative yaw threshold (degrees)
    pub yaw_threshold: f32,
    /// Baseline-relative pitch threshold (degrees)
    pub pitch_threshold: f32,
    /// Baseline-relative roll threshold (degrees)
    pub roll_threshold: f32,
    /// Calibration phase duration (seconds of valid frames)
    pub calibration_sec: f32,
    /// Sustained deviation before an axis alert latches (seconds)
    pub min_sustained_sec: f32,
    /// Face absence after which the baseline is discarded (seconds)
    pub missing_reset_sec: f32,
    /// Empirical ratio-to-degrees scale for yaw
    pub yaw_scale: f32,
    /// Empirical ratio-to-degrees scale for pitch
    pub pitch_scale: f32,
}

impl Default for HeadPoseConfig {
    fn default() -> Self {
        Self {
            yaw_threshold: 30.0,
            pitch_threshold: 25.0,
            roll_threshold: 20.0,
            calibration_sec: 2.0,
            min_sustained_sec: 0.5,
            missing_reset_sec: 1.0,
            yaw_scale: 60.0,
            pitch_scale: 40.0,
        }
    }
}

impl HeadPoseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("yaw_threshold", self.yaw_threshold),
            ("pitch_threshold", self.pitch_threshold),
            ("roll_threshold", self.roll_threshold),
            ("calibration_sec", self.calibration_sec),
            ("min_sustained_sec", self.min_sustained_sec),
            ("missing_reset_sec", self.missing_reset_sec),
            ("yaw_scale", self.yaw_scale),
            ("pitch_scale", self.pitch_scale),
        ] {
            require(value > 0.0, field, value as f64, "> 0")?;
        }
        Ok(())
    }
}

/// Gaze detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazeConfig {
    /// Acceptable horizontal gaze ratio range
    pub horizontal_range: (f32, f32),
    /// Acceptable vertical gaze ratio range
    pub vertical_range: (f32, f32),
    /// Sustained off-range duration before the alert latches (seconds)
    pub min_sustained_sec: f32,
    /// EMA alpha for per-eye ratio smoothing
    pub smoothing_alpha: f32,
    /// Consecutive missing frames the smoothers bridge
    pub max_missing: u32,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            horizontal_range: (0.35, 0.65),
            vertical_range: (0.35, 0.65),
            min_sustained_sec: 0.5,
            smoothing_alpha: 0.4,
            max_missing: 3,
        }
    }
}

impl GazeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, range) in [
            ("horizontal_range", self.horizontal_range),
            ("vertical_range", self.vertical_range),
        ] {
            require(
                (0.0..=1.0).contains(&range.0) && (0.0..=1.0).contains(&range.1),
                field,
                range.0 as f64,
                "bounds in [0, 1]",
            )?;
            require(range.0 <= range.1, field, range.1 as f64, "lo <= hi")?;
        }
        require(
            self.min_sustained_sec > 0.0,
            "min_sustained_sec",
            self.min_sustained_sec as f64,
            "> 0",
        )?;
        Ok(())
    }
}

/// Phone usage detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneUsageConfig {
    /// Object class id to scan for
    pub class_id: u32,
    /// Minimum detection confidence
    pub confidence_threshold: f32,
    /// Sustained detection before the alert latches (seconds)
    pub min_usage_sec: f32,
    /// Detection gap tolerated without resetting progress (seconds)
    pub max_missed_sec: f32,
}

impl Default for PhoneUsageConfig {
    fn default() -> Self {
        Self {
            class_id: PHONE_CLASS_ID,
            confidence_threshold: 0.5,
            min_usage_sec: 0.5,
            max_missed_sec: 0.3,
        }
    }
}

impl PhoneUsageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(
            (0.0..=1.0).contains(&self.confidence_threshold),
            "confidence_threshold",
            self.confidence_threshold as f64,
            "[0, 1]",
        )?;
        require(
            self.min_usage_sec > 0.0,
            "min_usage_sec",
            self.min_usage_sec as f64,
            "> 0",
        )?;
        require(
            self.max_missed_sec >= 0.0,
            "max_missed_sec",
            self.max_missed_sec as f64,
            ">= 0",
        )?;
        Ok(())
    }
}

/// Convert a duration to a frame count at the given rate, at least 1.
pub(crate) fn sec_to_frames(seconds: f32, fps: u32) -> u32 {
    ((seconds * fps as f32) as u32).max(1)
}

/// Validate the target frame rate shared by all detectors.
pub(crate) fn validate_fps(fps: u32) -> Result<(), ConfigError> {
    if fps < 1 {
        return Err(ConfigError::InvalidFps);
    }
    Ok(())
}
