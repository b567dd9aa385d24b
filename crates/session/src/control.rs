//! Out-of-band session control flags
//!
//! The owning collaborator flips these from outside the pipeline
//! loop; the loop consumes them at the top of each iteration. Pause
//! is level-triggered, reset and recalibrate are edge-triggered
//! (consumed once), and the stop reason is first-writer-wins so a
//! TTL expiry racing an explicit stop yields one deterministic
//! close reason.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Why a session's pipeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The frame transport reached end of stream.
    TransportEnded,
    /// The owning collaborator asked for the session to close.
    Stopped,
    /// The session's fixed TTL elapsed.
    Expired,
    /// The result sink stayed unready past the retry budget or
    /// rejected a send.
    SinkUnavailable,
}

#[derive(Default)]
pub struct SessionControl {
    paused: AtomicBool,
    reset: AtomicBool,
    recalibrate: AtomicBool,
    stop: Mutex<Option<SessionEnd>>,
}

impl SessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::Release);
    }

    /// Consume a pending reset request.
    pub fn take_reset(&self) -> bool {
        self.reset.swap(false, Ordering::AcqRel)
    }

    pub fn request_recalibrate(&self) {
        self.recalibrate.store(true, Ordering::Release);
    }

    /// Consume a pending recalibration request.
    pub fn take_recalibrate(&self) -> bool {
        self.recalibrate.swap(false, Ordering::AcqRel)
    }

    /// Request the pipeline to stop. The first reason recorded wins.
    pub fn stop(&self, reason: SessionEnd) {
        let mut stop = match self.stop.lock() {
            Ok(stop) => stop,
            Err(poisoned) => poisoned.into_inner(),
        };
        stop.get_or_insert(reason);
    }

    pub fn stop_reason(&self) -> Option<SessionEnd> {
        match self.stop.lock() {
            Ok(stop) => *stop,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_is_consumed_once() {
        let control = SessionControl::new();
        assert!(!control.take_reset());
        control.request_reset();
        assert!(control.take_reset());
        assert!(!control.take_reset());
    }

    #[test]
    fn test_first_stop_reason_wins() {
        let control = SessionControl::new();
        assert_eq!(control.stop_reason(), None);
        control.stop(SessionEnd::Expired);
        control.stop(SessionEnd::Stopped);
        assert_eq!(control.stop_reason(), Some(SessionEnd::Expired));
    }

    #[test]
    fn test_pause_is_level_triggered() {
        let control = SessionControl::new();
        control.set_paused(true);
        assert!(control.is_paused());
        assert!(control.is_paused());
        control.set_paused(false);
        assert!(!control.is_paused());
    }
}
