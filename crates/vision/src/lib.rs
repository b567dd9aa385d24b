//! Frame types and inference collaborator interfaces
//!
//! The face-landmark and object-detection models are external
//! collaborators: this crate defines only the narrow traits they are
//! consumed through, plus the RGB frame type that flows through the
//! pipelines.

pub mod detect;
pub mod frame;

pub use detect::{Detection, DetectOptions, FaceLandmarker, ObjectDetector, PHONE_CLASS_ID};
pub use frame::{Resolution, VideoFrame, MAX_INFERENCE_WIDTH, THUMBNAIL_JPEG_QUALITY};
