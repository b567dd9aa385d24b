//! Live per-session processing loop
//!
//! One intake task pulls frames from the transport into a depth-1
//! latest-wins slot while the loop drains the slot at `target_fps`,
//! runs inference and metrics off the loop, and writes serialized
//! results to the session's sink. Excess frames are dropped, never
//! queued. Inference collaborators may be shared across sessions but
//! are not assumed thread-safe, so every call goes through one
//! mutual-exclusion section, off the coordination path.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{error, info, warn};
use uuid::Uuid;

use detectors::{ConfigError, FrameContext, MetricEngine, MetricRecord};
use geometry::{flatten_essential, Point2};
use smoothing::{SmoothingError, VecSmoother};
use vision::{
    DetectOptions, Detection, FaceLandmarker, ObjectDetector, Resolution, VideoFrame,
    MAX_INFERENCE_WIDTH,
};

use crate::control::{SessionControl, SessionEnd};
use crate::slot::LatestSlot;

const LANDMARK_SMOOTHING_ALPHA: f32 = 0.8;
const LANDMARK_MAX_MISSING: u32 = 5;
const FPS_LOG_EVERY: u64 = 100;

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Rolling window behind the periodic processing-rate log. Frames and
/// elapsed time always restart together, so the reported rate covers
/// exactly the frames counted since the last restart.
struct FpsWindow {
    started: Instant,
    frames: u64,
}

impl FpsWindow {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            frames: 0,
        }
    }

    fn restart(&mut self) {
        self.started = Instant::now();
        self.frames = 0;
    }

    /// Record one processed frame. Returns the window's rate once per
    /// `FPS_LOG_EVERY` frames, restarting the window.
    fn tick(&mut self) -> Option<f64> {
        self.frames += 1;
        if self.frames < FPS_LOG_EVERY {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            Some(self.frames as f64 / elapsed)
        } else {
            None
        };
        self.restart();
        rate
    }
}

/// Pipeline failures distinct from ordinary session close reasons.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("target fps must be at least 1")]
    InvalidTargetFps,

    #[error(transparent)]
    Detector(#[from] ConfigError),

    #[error(transparent)]
    Smoothing(#[from] SmoothingError),
}

/// The result sink rejected a send.
#[derive(Error, Debug)]
#[error("result sink closed")]
pub struct SinkClosed;

/// Session output channel. `buffered_bytes` and `is_ready` let the
/// loop apply a byte ceiling and bounded readiness retries instead of
/// blocking on a slow consumer.
pub trait ResultSink: Send {
    fn is_ready(&self) -> bool;
    fn buffered_bytes(&self) -> usize;
    fn send(&mut self, payload: &[u8]) -> Result<(), SinkClosed>;
}

/// The shared inference collaborators behind a single mutual
/// exclusion section. The models are expensive to construct and may
/// be shared across sessions, but are not assumed thread-safe.
pub struct SharedDetectors {
    inner: Mutex<DetectorSet>,
}

pub struct DetectorSet {
    pub landmarker: Box<dyn FaceLandmarker + Send>,
    pub objects: Box<dyn ObjectDetector + Send>,
}

impl SharedDetectors {
    pub fn new(
        landmarker: Box<dyn FaceLandmarker + Send>,
        objects: Box<dyn ObjectDetector + Send>,
    ) -> Self {
        Self {
            inner: Mutex::new(DetectorSet { landmarker, objects }),
        }
    }

    fn infer(&self, frame: &VideoFrame) -> (Vec<Point2>, Vec<Detection>) {
        let mut set = lock_unpoisoned(&self.inner);
        let landmarks = set.landmarker.detect(frame);
        let detections = set.objects.detect(frame, DetectOptions::default());
        (landmarks, detections)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Maximum processed-frame rate
    pub target_fps: u32,
    /// Result payloads are dropped while the sink buffers more than this
    pub sink_buffer_ceiling_bytes: usize,
    /// Readiness retries before the session is terminated
    pub max_sink_retries: u32,
    /// Delay between readiness retries
    pub sink_retry_delay: Duration,
    /// Bounded wait for a frame on the intake slot
    pub slot_wait: Duration,
    /// Log the result-drop counter every this many drops
    pub drop_log_every: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_fps: 10,
            sink_buffer_ceiling_bytes: 1 << 20, // 1 MiB
            max_sink_retries: 10,
            sink_retry_delay: Duration::from_millis(50),
            slot_wait: Duration::from_millis(100),
            drop_log_every: 50,
        }
    }
}

/// Counters describing a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub end: SessionEnd,
    /// Frames accepted for processing
    pub frames_processed: u64,
    /// Frames discarded by pacing, pause, or slot replacement
    pub frames_discarded: u64,
    /// Result payloads delivered to the sink
    pub results_sent: u64,
    /// Result payloads dropped by the byte ceiling
    pub results_dropped: u64,
}

/// Per-frame live message.
#[derive(Debug, Serialize)]
struct FrameMessage {
    timestamp: String,
    resolution: Resolution,
    face_landmarks: Option<Vec<f32>>,
    object_detections: Option<Vec<Detection>>,
    metrics: Option<MetricRecord>,
}

fn process_frame(
    detectors: &SharedDetectors,
    engine: &Mutex<MetricEngine>,
    smoother: &Mutex<VecSmoother>,
    frame: &VideoFrame,
) -> Option<Vec<u8>> {
    let small = frame.downscale_to_width(MAX_INFERENCE_WIDTH);
    let (raw_landmarks, detections) = detectors.infer(&small);
    let landmarks = (!raw_landmarks.is_empty()).then_some(raw_landmarks);

    let essential = landmarks.as_deref().and_then(flatten_essential);
    let flat = lock_unpoisoned(smoother).update(essential.as_deref());

    let context = FrameContext::new(landmarks, detections.clone());
    let metrics = lock_unpoisoned(engine).update(&context);

    let message = FrameMessage {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        resolution: small.resolution(),
        face_landmarks: flat,
        object_detections: Some(detections),
        metrics: Some(metrics),
    };
    match serde_json::to_vec(&message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            error!(%err, "frame message serialization failed");
            None
        }
    }
}

/// Run one session's pipeline to completion.
///
/// Returns when the transport ends, a stop reason is set on the
/// control surface, or the sink becomes unusable. The intake task is
/// always cancelled and awaited before this returns.
pub async fn run_session(
    session_id: Uuid,
    mut frames: mpsc::Receiver<VideoFrame>,
    detectors: Arc<SharedDetectors>,
    control: Arc<SessionControl>,
    mut sink: Box<dyn ResultSink>,
    config: PipelineConfig,
) -> Result<SessionOutcome, SessionError> {
    if config.target_fps < 1 {
        return Err(SessionError::InvalidTargetFps);
    }
    let engine = Arc::new(Mutex::new(MetricEngine::with_defaults(config.target_fps)?));
    let smoother = Arc::new(Mutex::new(VecSmoother::new(
        LANDMARK_SMOOTHING_ALPHA,
        LANDMARK_MAX_MISSING,
    )?));

    let slot = Arc::new(LatestSlot::new());
    let reader = {
        let slot = Arc::clone(&slot);
        tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                if !slot.put(frame) {
                    break;
                }
            }
            slot.close();
        })
    };

    let frame_interval = Duration::from_secs_f64(1.0 / config.target_fps as f64);
    let mut last_processed: Option<Instant> = None;
    let mut frames_processed: u64 = 0;
    let mut frames_discarded: u64 = 0;
    let mut results_sent: u64 = 0;
    let mut results_dropped: u64 = 0;
    let mut fps_window = FpsWindow::new();

    info!(%session_id, target_fps = config.target_fps, "session pipeline started");

    let end = 'session: loop {
        if let Some(reason) = control.stop_reason() {
            break reason;
        }
        if control.take_reset() {
            info!(%session_id, "session state reset");
            lock_unpoisoned(&engine).reset();
            lock_unpoisoned(&smoother).reset();
            last_processed = None;
            fps_window.restart();
        }
        if control.take_recalibrate() {
            info!(%session_id, "head pose recalibration requested");
            lock_unpoisoned(&engine).recalibrate();
        }

        let Some(frame) = slot.take(config.slot_wait).await else {
            if slot.is_closed() {
                break SessionEnd::TransportEnded;
            }
            continue;
        };

        if control.is_paused() {
            // Keep the pacing clock advancing so resume does not
            // burst-process stale frames.
            last_processed = Some(Instant::now());
            frames_discarded += 1;
            continue;
        }
        if last_processed.is_some_and(|t| t.elapsed() < frame_interval) {
            frames_discarded += 1;
            continue;
        }
        last_processed = Some(Instant::now());

        let payload = {
            let detectors = Arc::clone(&detectors);
            let engine = Arc::clone(&engine);
            let smoother = Arc::clone(&smoother);
            task::spawn_blocking(move || {
                process_frame(&detectors, &engine, &smoother, &frame)
            })
            .await
        };
        let payload = match payload {
            Ok(Some(payload)) => payload,
            Ok(None) => continue,
            Err(err) => {
                error!(%session_id, %err, "frame processing task failed");
                continue;
            }
        };
        frames_processed += 1;

        let mut attempts = 0;
        while !sink.is_ready() {
            attempts += 1;
            if attempts > config.max_sink_retries {
                warn!(%session_id, "sink not ready after {attempts} attempts");
                break 'session SessionEnd::SinkUnavailable;
            }
            tokio::time::sleep(config.sink_retry_delay).await;
        }

        if sink.buffered_bytes() + payload.len() > config.sink_buffer_ceiling_bytes {
            results_dropped += 1;
            if results_dropped % config.drop_log_every == 0 {
                warn!(%session_id, results_dropped, "sink backpressure dropping results");
            }
            continue;
        }
        if sink.send(&payload).is_err() {
            warn!(%session_id, "sink closed mid-session");
            break SessionEnd::SinkUnavailable;
        }
        results_sent += 1;

        if let Some(fps) = fps_window.tick() {
            info!(
                %session_id,
                fps = format!("{fps:.1}"),
                frames_processed,
                "processing rate"
            );
        }
    };

    // Cancel intake and wait for it so no background work leaks.
    reader.abort();
    let _ = reader.await;

    let outcome = SessionOutcome {
        end,
        frames_processed,
        frames_discarded: frames_discarded + slot.dropped(),
        results_sent,
        results_dropped,
    };
    info!(%session_id, ?outcome.end, outcome.frames_processed, "session pipeline ended");
    Ok(outcome)
}
