//! Batch video processing
//!
//! Drives a decoded frame source through sampling, inference, metric
//! computation, and bucketing, producing a bounded-size report for an
//! arbitrarily long video. The duration ceiling is a hard cost bound:
//! it is checked against container metadata up front and against
//! decoded timestamps incrementally, and exceeding it aborts the
//! whole job rather than returning a partial result.

use detectors::{has_active_alert, ConfigError, FrameContext, MetricEngine, MetricRecord};
use geometry::flatten_essential;
use serde::{Deserialize, Serialize};
use smoothing::{SmoothingError, VecSmoother};
use thiserror::Error;
use tracing::{debug, info};
use vision::{
    DetectOptions, Detection, FaceLandmarker, ObjectDetector, Resolution, VideoFrame,
    MAX_INFERENCE_WIDTH,
};

use crate::bucket::{BucketAccumulator, FrameGroup};

const LANDMARK_SMOOTHING_ALPHA: f32 = 0.8;
const LANDMARK_MAX_MISSING: u32 = 5;

/// Batch processing failures
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("invalid video source: {0}")]
    InvalidSource(String),

    #[error("video source failed: {0}")]
    Source(String),

    #[error("source duration {duration_sec:.1}s exceeds limit {max_sec:.1}s")]
    DurationExceeded { duration_sec: f64, max_sec: f64 },

    #[error("{field} out of range: {value} (expected {expected})")]
    InvalidOption {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error(transparent)]
    Detector(#[from] ConfigError),

    #[error(transparent)]
    Smoothing(#[from] SmoothingError),
}

/// Container-level metadata reported by a source before decoding.
/// Either field may be absent or wrong; decoded timestamps are the
/// authority.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMetadata {
    pub duration_sec: Option<f64>,
    pub fps: Option<f64>,
}

/// A decoded, ordered frame source.
pub trait VideoSource {
    fn metadata(&self) -> SourceMetadata;

    /// Next decoded frame in timestamp order, `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, BatchError>;
}

/// Batch processing options
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Frames sampled per second of source time
    pub target_fps: u32,
    /// Hard ceiling on source duration
    pub max_duration_sec: f64,
    /// Bucket width
    pub group_interval_sec: f64,
    /// Include per-frame records in the report
    pub include_frames: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            target_fps: 5,
            max_duration_sec: 300.0,
            group_interval_sec: 3.0,
            include_frames: false,
        }
    }
}

impl BatchOptions {
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.target_fps < 1 {
            return Err(BatchError::InvalidOption {
                field: "target_fps",
                value: self.target_fps as f64,
                expected: ">= 1",
            });
        }
        if !(self.max_duration_sec > 0.0) {
            return Err(BatchError::InvalidOption {
                field: "max_duration_sec",
                value: self.max_duration_sec,
                expected: "> 0",
            });
        }
        if !(self.group_interval_sec > 0.0) {
            return Err(BatchError::InvalidOption {
                field: "group_interval_sec",
                value: self.group_interval_sec,
                expected: "> 0",
            });
        }
        Ok(())
    }
}

/// One sampled frame's record, kept only when requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Source position as `HH:MM:SS.mmm`
    pub timestamp: String,
    pub timestamp_sec: f64,
    pub resolution: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_landmarks: Option<Vec<f32>>,
    pub object_detections: Vec<Detection>,
    pub metrics: MetricRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration_sec: f64,
    pub total_frames_processed: u64,
    pub fps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

/// Full batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoReport {
    pub video_metadata: VideoMetadata,
    pub groups: Vec<FrameGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<FrameRecord>>,
}

/// Format a source position as `HH:MM:SS.mmm`.
pub fn format_timestamp(sec: f64) -> String {
    let total_ms = (sec.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Process a whole video into bucketed aggregates.
///
/// Decoded frames are sampled down to `target_fps`, downscaled to
/// [`MAX_INFERENCE_WIDTH`], run through the landmarker and object
/// detector, folded through the detector engine, and bucketed every
/// `group_interval_sec` of source time.
pub fn process_video(
    source: &mut dyn VideoSource,
    landmarker: &mut dyn FaceLandmarker,
    objects: &mut dyn ObjectDetector,
    options: &BatchOptions,
) -> Result<VideoReport, BatchError> {
    options.validate()?;

    let metadata = source.metadata();
    if let Some(duration) = metadata.duration_sec {
        if duration > options.max_duration_sec {
            return Err(BatchError::DurationExceeded {
                duration_sec: duration,
                max_sec: options.max_duration_sec,
            });
        }
    }

    let mut engine = MetricEngine::with_defaults(options.target_fps)?;
    let mut landmark_smoother =
        VecSmoother::new(LANDMARK_SMOOTHING_ALPHA, LANDMARK_MAX_MISSING)?;

    let sample_step = 1.0 / options.target_fps as f64;
    let mut next_target_sec = 0.0f64;
    let mut open_bucket: Option<BucketAccumulator> = None;
    let mut groups = Vec::new();
    let mut frames = options.include_frames.then(Vec::new);
    let mut processed: u64 = 0;
    let mut last_sec = 0.0f64;
    let mut first_resolution: Option<Resolution> = None;

    while let Some(frame) = source.next_frame()? {
        let sec = frame.timestamp_sec();
        // Metadata can be wrong or absent, so the ceiling is also
        // enforced from decoded timestamps.
        if sec > options.max_duration_sec {
            return Err(BatchError::DurationExceeded {
                duration_sec: sec,
                max_sec: options.max_duration_sec,
            });
        }
        last_sec = last_sec.max(sec);
        if sec < next_target_sec {
            continue;
        }
        next_target_sec = sec + sample_step;

        let small = frame.downscale_to_width(MAX_INFERENCE_WIDTH);
        first_resolution.get_or_insert(small.resolution());

        let raw_landmarks = landmarker.detect(&small);
        let landmarks = (!raw_landmarks.is_empty()).then_some(raw_landmarks);
        let essential = landmarks.as_deref().and_then(flatten_essential);
        let flat = landmark_smoother.update(essential.as_deref());
        let detections = objects.detect(&small, DetectOptions::default());

        let context = FrameContext::new(landmarks, detections.clone());
        let metrics = engine.update(&context);

        let index = (sec / options.group_interval_sec) as u64;
        let mut bucket = match open_bucket.take() {
            Some(bucket) if bucket.index() == index => bucket,
            Some(done) => {
                debug!(bucket = done.index(), "bucket finalized");
                groups.push(done.finalize());
                BucketAccumulator::new(index, options.group_interval_sec)
            }
            None => BucketAccumulator::new(index, options.group_interval_sec),
        };

        let thumbnail = (bucket.wants_thumbnail()
            && flat.is_some()
            && has_active_alert(&metrics))
        .then(|| small.encode_thumbnail())
        .flatten();
        bucket.add_frame(
            small.resolution(),
            flat.as_deref(),
            &detections,
            metrics.clone(),
            thumbnail,
        );
        open_bucket = Some(bucket);

        if let Some(frames) = frames.as_mut() {
            frames.push(FrameRecord {
                timestamp: format_timestamp(sec),
                timestamp_sec: sec,
                resolution: small.resolution(),
                face_landmarks: flat,
                object_detections: detections,
                metrics,
            });
        }
        processed += 1;
    }

    if let Some(bucket) = open_bucket {
        groups.push(bucket.finalize());
    }

    info!(
        processed,
        groups = groups.len(),
        duration_sec = last_sec,
        "batch processing complete"
    );

    Ok(VideoReport {
        video_metadata: VideoMetadata {
            duration_sec: last_sec,
            total_frames_processed: processed,
            fps: options.target_fps,
            resolution: first_resolution,
        },
        groups,
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::Point2;

    /// Synthetic source emitting solid frames at a fixed decode rate.
    struct SyntheticSource {
        decode_fps: f64,
        total_frames: u64,
        emitted: u64,
        reported_duration: Option<f64>,
    }

    impl SyntheticSource {
        fn new(decode_fps: f64, duration_sec: f64) -> Self {
            Self {
                decode_fps,
                total_frames: (decode_fps * duration_sec) as u64,
                emitted: 0,
                reported_duration: Some(duration_sec),
            }
        }
    }

    impl VideoSource for SyntheticSource {
        fn metadata(&self) -> SourceMetadata {
            SourceMetadata {
                duration_sec: self.reported_duration,
                fps: Some(self.decode_fps),
            }
        }

        fn next_frame(&mut self) -> Result<Option<VideoFrame>, BatchError> {
            if self.emitted >= self.total_frames {
                return Ok(None);
            }
            let ts_ms = (self.emitted as f64 / self.decode_fps * 1000.0) as u64;
            let frame = VideoFrame::new(vec![100; 64 * 48 * 3], 64, 48, ts_ms, self.emitted);
            self.emitted += 1;
            Ok(Some(frame))
        }
    }

    struct FixedFace;

    impl FaceLandmarker for FixedFace {
        fn detect(&mut self, _: &VideoFrame) -> Vec<Point2> {
            let mut landmarks = vec![(0.5, 0.5); 478];
            landmarks[33] = (0.4, 0.5);
            landmarks[133] = (0.5, 0.5);
            landmarks
        }
    }

    struct NoFace;

    impl FaceLandmarker for NoFace {
        fn detect(&mut self, _: &VideoFrame) -> Vec<Point2> {
            Vec::new()
        }
    }

    struct NoObjects;

    impl ObjectDetector for NoObjects {
        fn detect(&mut self, _: &VideoFrame, _: DetectOptions) -> Vec<Detection> {
            Vec::new()
        }
    }

    #[test]
    fn test_sampling_converges_to_target_fps() {
        let mut source = SyntheticSource::new(30.0, 10.0);
        let options = BatchOptions {
            target_fps: 5,
            ..Default::default()
        };
        let report =
            process_video(&mut source, &mut NoFace, &mut NoObjects, &options).unwrap();
        // 10 seconds at 5 fps: 50 samples, within one frame of exact.
        let processed = report.video_metadata.total_frames_processed;
        assert!((49..=51).contains(&processed), "processed {processed}");
    }

    #[test]
    fn test_one_group_per_distinct_bucket() {
        let mut source = SyntheticSource::new(30.0, 9.0);
        let options = BatchOptions {
            target_fps: 5,
            group_interval_sec: 3.0,
            ..Default::default()
        };
        let report =
            process_video(&mut source, &mut FixedFace, &mut NoObjects, &options).unwrap();
        // Buckets 0, 1, 2: flushed exactly once each.
        assert_eq!(report.groups.len(), 3);
        let indices: Vec<u64> = report.groups.iter().map(|g| g.bucket_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let total: u32 = report.groups.iter().map(|g| g.frame_count).sum();
        assert_eq!(total as u64, report.video_metadata.total_frames_processed);
    }

    #[test]
    fn test_metadata_duration_rejected_up_front() {
        let mut source = SyntheticSource::new(30.0, 100.0);
        let options = BatchOptions {
            max_duration_sec: 60.0,
            ..Default::default()
        };
        let err =
            process_video(&mut source, &mut NoFace, &mut NoObjects, &options).unwrap_err();
        assert!(matches!(err, BatchError::DurationExceeded { .. }));
    }

    #[test]
    fn test_decoded_duration_rejected_incrementally() {
        // Metadata lies about the duration; decoded timestamps do not.
        let mut source = SyntheticSource::new(30.0, 100.0);
        source.reported_duration = None;
        let options = BatchOptions {
            max_duration_sec: 60.0,
            ..Default::default()
        };
        let err =
            process_video(&mut source, &mut NoFace, &mut NoObjects, &options).unwrap_err();
        assert!(matches!(err, BatchError::DurationExceeded { .. }));
    }

    #[test]
    fn test_frames_included_on_request() {
        let mut source = SyntheticSource::new(10.0, 2.0);
        let options = BatchOptions {
            target_fps: 5,
            include_frames: true,
            ..Default::default()
        };
        let report =
            process_video(&mut source, &mut FixedFace, &mut NoObjects, &options).unwrap();
        let frames = report.frames.unwrap();
        assert_eq!(frames.len() as u64, report.video_metadata.total_frames_processed);
        assert_eq!(frames[0].timestamp, "00:00:00.000");

        let mut source = SyntheticSource::new(10.0, 2.0);
        let options = BatchOptions {
            include_frames: false,
            ..options
        };
        let report =
            process_video(&mut source, &mut FixedFace, &mut NoObjects, &options).unwrap();
        assert!(report.frames.is_none());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(61.5), "00:01:01.500");
        assert_eq!(format_timestamp(3723.042), "01:02:03.042");
    }

    #[test]
    fn test_invalid_options() {
        let options = BatchOptions {
            target_fps: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
        let options = BatchOptions {
            group_interval_sec: 0.0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
