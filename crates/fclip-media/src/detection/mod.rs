//! Object detection over the source video.
//!
//! The detector model is a black box behind [`ObjectDetector`]; frames come
//! from a [`FrameSource`]. The orchestrator only sees a [`DetectionStage`]
//! that leaves an object log on disk:
//!
//! | Stage | Detections come from |
//! |-------|----------------------|
//! | `FrameDetectionStage` | sampled frames run through an `ObjectDetector` |
//! | `PrecomputedDetections` | an object log written by an external detector |

pub mod sampler;
pub mod stage;

pub use sampler::{detect_objects, Frame, FrameSource, ObjectDetector};
pub use stage::{DetectionStage, FrameDetectionStage, PrecomputedDetections, SourceOpener};
