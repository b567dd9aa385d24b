//! Per-bucket accumulation and finalization
//!
//! A bucket covers one `group_interval_sec` window of a video. Frames
//! append into the open bucket; finalization consumes the accumulator
//! (a bucket cannot be finalized twice) and reduces it to a single
//! aggregate record.

use std::collections::BTreeMap;

use detectors::{has_active_alert, MetricRecord};
use serde::{Deserialize, Serialize};
use vision::{Detection, Resolution};

use crate::reduce::reduce_records;

/// Detection identity for best-confidence deduplication: class id
/// plus the bounding box rounded to 3 decimals.
fn detection_key(detection: &Detection) -> String {
    let [x1, y1, x2, y2] = detection.bbox;
    format!(
        "{}:{:.3},{:.3},{:.3},{:.3}",
        detection.class_id, x1, y1, x2, y2
    )
}

/// Accumulates one time bucket's worth of per-frame results.
pub struct BucketAccumulator {
    index: u64,
    start_sec: f64,
    end_sec: f64,
    frame_count: u32,
    resolution: Option<Resolution>,
    landmarks_sum: Vec<f32>,
    landmarks_count: u32,
    detections: BTreeMap<String, Detection>,
    metrics: Vec<MetricRecord>,
    thumbnail: Option<Vec<u8>>,
}

impl BucketAccumulator {
    pub fn new(index: u64, interval_sec: f64) -> Self {
        Self {
            index,
            start_sec: index as f64 * interval_sec,
            end_sec: (index + 1) as f64 * interval_sec,
            frame_count: 0,
            resolution: None,
            landmarks_sum: Vec::new(),
            landmarks_count: 0,
            detections: BTreeMap::new(),
            metrics: Vec::new(),
            thumbnail: None,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    /// True until the first alert thumbnail has been captured.
    pub fn wants_thumbnail(&self) -> bool {
        self.thumbnail.is_none()
    }

    /// Fold one frame's results into the bucket. `thumbnail` is only
    /// stored when the frame has both an active alert and landmarks,
    /// and only the first such frame in the bucket wins.
    pub fn add_frame(
        &mut self,
        resolution: Resolution,
        landmarks: Option<&[f32]>,
        detections: &[Detection],
        metrics: MetricRecord,
        thumbnail: Option<Vec<u8>>,
    ) {
        self.frame_count += 1;
        self.resolution.get_or_insert(resolution);

        if let Some(flat) = landmarks {
            if self.landmarks_count == 0 {
                self.landmarks_sum = flat.to_vec();
                self.landmarks_count = 1;
            } else if self.landmarks_sum.len() == flat.len() {
                for (acc, v) in self.landmarks_sum.iter_mut().zip(flat.iter()) {
                    *acc += v;
                }
                self.landmarks_count += 1;
            }
            // Mismatched lengths are skipped, not errored.
        }

        for detection in detections {
            let key = detection_key(detection);
            match self.detections.get(&key) {
                Some(existing) if existing.confidence >= detection.confidence => {}
                _ => {
                    self.detections.insert(key, detection.clone());
                }
            }
        }

        if self.thumbnail.is_none() && landmarks.is_some() && has_active_alert(&metrics) {
            self.thumbnail = thumbnail;
        }
        self.metrics.push(metrics);
    }

    /// Finalize the bucket into its aggregate, consuming it.
    pub fn finalize(self) -> FrameGroup {
        let face_landmarks = if self.landmarks_count > 0 {
            let n = self.landmarks_count as f32;
            Some(self.landmarks_sum.into_iter().map(|v| v / n).collect())
        } else {
            None
        };

        FrameGroup {
            bucket_index: self.index,
            start_sec: self.start_sec,
            end_sec: self.end_sec,
            frame_count: self.frame_count,
            aggregate: Aggregate {
                resolution: self.resolution,
                face_landmarks,
                object_detections: self.detections.into_values().collect(),
                metrics: reduce_records(&self.metrics),
                thumbnail: self.thumbnail,
            },
        }
    }
}

/// One finalized time bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameGroup {
    pub bucket_index: u64,
    pub start_sec: f64,
    pub end_sec: f64,
    pub frame_count: u32,
    pub aggregate: Aggregate,
}

/// Reduced contents of a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    /// Element-wise averaged flattened landmarks, absent when no
    /// landmark-bearing frame occurred in the bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_landmarks: Option<Vec<f32>>,
    pub object_detections: Vec<Detection>,
    pub metrics: MetricRecord,
    /// JPEG bytes of the first alert frame in the bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Vec<u8>>,
}
