//! Time-bucket aggregation and batch video processing
//!
//! Reduces an ordered stream of per-frame metric records into one
//! aggregate per fixed time window, bounding the size of a report for
//! an arbitrarily long video. The reduction is generic over record
//! shape so new detectors need no aggregation changes.

pub mod bucket;
pub mod reduce;
pub mod video;

pub use bucket::{Aggregate, BucketAccumulator, FrameGroup};
pub use reduce::reduce_records;
pub use video::{
    format_timestamp, process_video, BatchError, BatchOptions, FrameRecord, SourceMetadata,
    VideoMetadata, VideoReport, VideoSource,
};
