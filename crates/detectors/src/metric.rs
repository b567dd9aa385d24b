//! Detector contract

use crate::context::FrameContext;
use crate::value::MetricRecord;
use thiserror::Error;

/// Unexpected runtime fault inside a detector. Transient measurement
/// failures (missing landmarks, degenerate geometry) are NOT errors -
/// detectors hold their previous state and report null measurements
/// for those. This type exists for the genuinely unexpected, so the
/// engine can isolate one detector's fault from the others.
#[derive(Error, Debug)]
pub enum MetricError {
    #[error("metric computation failed: {0}")]
    Computation(String),
}

/// One stateful signal detector.
pub trait Metric: Send {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fold one frame into the detector's state and report the
    /// current outputs. Never fails on missing or degenerate input.
    fn update(&mut self, context: &FrameContext) -> Result<MetricRecord, MetricError>;

    /// Return to the initial state.
    fn reset(&mut self);

    /// Discard any learned per-session baseline. Default no-op;
    /// detectors with a calibration phase override this.
    fn recalibrate(&mut self) {}
}
