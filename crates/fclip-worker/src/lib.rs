//! Focus highlight worker.
//!
//! This crate provides:
//! - The detection → scoring → rendering pipeline for one task
//! - Progress sinks and the structured status record
//! - Completion polling and rendered-clip listing
//! - Environment configuration and structured task logging

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod status;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::TaskLogger;
pub use pipeline::{FocusPipeline, PipelineInputs, PipelineOutcome};
pub use progress::{CompositeSink, MonotonicProgress, ProgressSink, StatusFileSink, TracingSink};
pub use status::{get_progress, is_completed, poll_status, read_status};

pub use fclip_media::list_rendered_clips;
