//! Media side of focusclip.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with captured stderr
//! - FFprobe video information
//! - The burned-in focus annotation
//! - Clip rendering for selected focus windows
//! - Per-frame object detection behind a pluggable model trait
//! - Gaze movement and attention scoring for the live affect classifier

pub mod affect;
pub mod command;
pub mod detection;
pub mod error;
pub mod overlay;
pub mod probe;
pub mod render;

pub use affect::{
    affect_frame, attention_level, attention_score, classify_movement, emotion_confidence_score,
    AffectClassification, AttentionLevel, GazeState,
};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use detection::{
    detect_objects, DetectionStage, Frame, FrameDetectionStage, FrameSource, ObjectDetector,
    PrecomputedDetections, SourceOpener,
};
pub use error::{MediaError, MediaResult};
pub use overlay::{build_drawtext, overlay_text};
pub use probe::{get_duration, probe_video, VideoInfo};
pub use render::{
    clamp_duration, clip_filename, list_rendered_clips, ClipExtractor, ClipJob, ClipRenderer,
    FfmpegExtractor, FfprobeProber, RenderConfig, RenderReport, VideoProber,
};
