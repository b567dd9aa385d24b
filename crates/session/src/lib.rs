//! Live session management
//!
//! One pipeline task per active session: an intake task feeds a
//! depth-1 latest-wins slot, the loop paces processing to the target
//! frame rate, inference runs off the coordination path, and results
//! stream to the session's sink with bounded backpressure. A
//! read-mostly registry tracks handles and enforces per-session TTLs.

pub mod control;
pub mod pipeline;
pub mod registry;
pub mod slot;
pub mod telemetry;

pub use control::{SessionControl, SessionEnd};
pub use pipeline::{
    run_session, DetectorSet, PipelineConfig, ResultSink, SessionError, SessionOutcome,
    SharedDetectors, SinkClosed,
};
pub use registry::SessionRegistry;
pub use slot::LatestSlot;
pub use telemetry::init_logging;
