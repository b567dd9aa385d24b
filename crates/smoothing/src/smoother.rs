//! EMA smoother implementations

use thiserror::Error;

/// Smoothing configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmoothingError {
    #[error("alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f32),
}

/// Exponential moving-average smoother for a scalar stream.
///
/// `output = alpha * new + (1 - alpha) * previous`. A missing input
/// re-emits the last smoothed value for up to `max_missing`
/// consecutive frames, after which state clears and the output goes
/// missing too.
#[derive(Debug, Clone)]
pub struct ExpSmoother {
    alpha: f32,
    max_missing: u32,
    last_value: Option<f32>,
    missing_count: u32,
}

impl ExpSmoother {
    /// Create a smoother. `alpha` closer to 1 is more responsive,
    /// closer to 0 is smoother with more lag.
    pub fn new(alpha: f32, max_missing: u32) -> Result<Self, SmoothingError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(SmoothingError::InvalidAlpha(alpha));
        }
        Ok(Self {
            alpha,
            max_missing,
            last_value: None,
            missing_count: 0,
        })
    }

    /// Feed one sample (or a gap) and get the smoothed output.
    pub fn update(&mut self, value: Option<f32>) -> Option<f32> {
        match value {
            Some(v) => {
                self.missing_count = 0;
                let smoothed = match self.last_value {
                    None => v,
                    Some(prev) => self.alpha * v + (1.0 - self.alpha) * prev,
                };
                self.last_value = Some(smoothed);
                Some(smoothed)
            }
            None => {
                self.missing_count += 1;
                if self.missing_count <= self.max_missing {
                    self.last_value
                } else {
                    self.last_value = None;
                    None
                }
            }
        }
    }

    /// Clear state and counters unconditionally.
    pub fn reset(&mut self) {
        self.last_value = None;
        self.missing_count = 0;
    }
}

/// Element-wise EMA smoother for fixed-length numeric vectors.
///
/// A vector whose length differs from the stored state is treated as
/// a fresh start rather than an error.
#[derive(Debug, Clone)]
pub struct VecSmoother {
    alpha: f32,
    max_missing: u32,
    last_value: Option<Vec<f32>>,
    missing_count: u32,
}

impl VecSmoother {
    pub fn new(alpha: f32, max_missing: u32) -> Result<Self, SmoothingError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(SmoothingError::InvalidAlpha(alpha));
        }
        Ok(Self {
            alpha,
            max_missing,
            last_value: None,
            missing_count: 0,
        })
    }

    /// Feed one vector (or a gap) and get the smoothed output.
    pub fn update(&mut self, value: Option<&[f32]>) -> Option<Vec<f32>> {
        match value {
            Some(v) => {
                self.missing_count = 0;
                let smoothed = match &self.last_value {
                    Some(prev) if prev.len() == v.len() => v
                        .iter()
                        .zip(prev.iter())
                        .map(|(new, old)| self.alpha * new + (1.0 - self.alpha) * old)
                        .collect(),
                    // No prior state, or length changed: adopt as-is.
                    _ => v.to_vec(),
                };
                self.last_value = Some(smoothed.clone());
                Some(smoothed)
            }
            None => {
                self.missing_count += 1;
                if self.missing_count <= self.max_missing {
                    self.last_value.clone()
                } else {
                    self.last_value = None;
                    None
                }
            }
        }
    }

    /// Clear state and counters unconditionally.
    pub fn reset(&mut self) {
        self.last_value = None;
        self.missing_count = 0;
    }
}
