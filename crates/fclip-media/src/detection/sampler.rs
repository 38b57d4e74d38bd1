//! Frame sampling and per-frame detection.

use tracing::{debug, info};

use fclip_models::{Detection, ObjectFrame};

use crate::error::MediaResult;
use crate::probe::DEFAULT_FPS;

/// One decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 0-based position in the video
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// Packed RGB24 pixels
    pub data: Vec<u8>,
}

/// Sequential access to decoded frames.
pub trait FrameSource: Send {
    /// Frames per second; non-positive when unknown.
    fn fps(&self) -> f64;

    /// Frame size as `(width, height)`.
    fn resolution(&self) -> (u32, u32);

    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> MediaResult<Option<Frame>>;
}

/// Per-frame object detection model.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> MediaResult<Vec<Detection>>;

    /// Detector name for logging.
    fn name(&self) -> &'static str {
        "object-detector"
    }
}

/// Run `detector` on every `skip_frames`-th frame of `source`.
///
/// Timestamps are `frame_id / fps`, rounded to milliseconds. A detector
/// error aborts the whole pass.
pub fn detect_objects<S, D>(source: &mut S, detector: &D, skip_frames: u32) -> MediaResult<Vec<ObjectFrame>>
where
    S: FrameSource + ?Sized,
    D: ObjectDetector + ?Sized,
{
    let fps = match source.fps() {
        fps if fps > 0.0 => fps,
        _ => DEFAULT_FPS,
    };
    let resolution = source.resolution();
    let stride = u64::from(skip_frames.max(1));

    info!(
        detector = detector.name(),
        fps,
        width = resolution.0,
        height = resolution.1,
        skip_frames = stride,
        "Starting object detection"
    );

    let mut frames = Vec::new();
    let mut frame_id: u64 = 0;
    while let Some(frame) = source.next_frame()? {
        if frame_id % stride == 0 {
            let objects = detector.detect(&frame)?;
            let timestamp = (frame_id as f64 / fps * 1000.0).round() / 1000.0;
            debug!(frame_id, timestamp, detections = objects.len(), "Detected objects");
            frames.push(ObjectFrame {
                frame_id,
                timestamp,
                objects,
                resolution,
            });
        }
        frame_id += 1;
    }

    info!(
        frames_read = frame_id,
        frames_detected = frames.len(),
        "Object detection finished"
    );
    Ok(frames)
}
