//! Shared data models for focusclip.
//!
//! This crate provides Serde-serializable types for:
//! - Affect (emotion/gaze) and object-detection frames
//! - Scored focus windows and the persisted focus result records
//! - Rendered clip descriptors
//! - Task identifiers and the structured task status record
//! - The fixed clip encoding profile

pub mod clip;
pub mod encoding;
pub mod focus;
pub mod request;
pub mod signal;
pub mod task;
pub mod task_status;

// Re-export common types
pub use clip::{ClipListing, RenderedClip};
pub use encoding::EncodingConfig;
pub use focus::{round2, FocusRecord, FocusWindow};
pub use request::{AnalysisRequest, RequestError};
pub use signal::{
    AffectFrame, BoundingBox, Detection, Emotion, MovementClass, ObjectFrame, PupilPoint,
};
pub use task::TaskId;
pub use task_status::{TaskState, TaskStatus};
