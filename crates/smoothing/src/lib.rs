//! Gap-tolerant exponential moving-average smoothing
//!
//! Per-frame measurements from vision models drop out for a few
//! frames at a time (occlusion, failed detection). These smoothers
//! hold the last value over short gaps and only clear state once a
//! gap exceeds `max_missing` consecutive frames.

pub mod smoother;

pub use smoother::{ExpSmoother, SmoothingError, VecSmoother};
