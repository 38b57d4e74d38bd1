//! Detection stage used by the pipeline orchestrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use fclip_models::ObjectFrame;

use crate::detection::sampler::{detect_objects, FrameSource, ObjectDetector};
use crate::error::{MediaError, MediaResult};

/// Produces the object log for a source video.
#[async_trait]
pub trait DetectionStage: Send + Sync {
    /// Write the object log for `video` to `object_log`; returns the frame count.
    async fn run(&self, video: &Path, object_log: &Path) -> MediaResult<usize>;

    /// Files that must exist before the pipeline starts.
    fn required_inputs(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Stage name for logging.
    fn name(&self) -> &'static str;
}

/// Opens a frame source for a video path.
pub type SourceOpener = Arc<dyn Fn(&Path) -> MediaResult<Box<dyn FrameSource>> + Send + Sync>;

/// Samples frames from the video and runs an [`ObjectDetector`] on them.
///
/// Inference is blocking and runs on the blocking thread pool.
pub struct FrameDetectionStage {
    open: SourceOpener,
    detector: Arc<dyn ObjectDetector>,
    skip_frames: u32,
}

impl FrameDetectionStage {
    pub fn new(open: SourceOpener, detector: Arc<dyn ObjectDetector>, skip_frames: u32) -> Self {
        Self {
            open,
            detector,
            skip_frames,
        }
    }
}

#[async_trait]
impl DetectionStage for FrameDetectionStage {
    async fn run(&self, video: &Path, object_log: &Path) -> MediaResult<usize> {
        let open = Arc::clone(&self.open);
        let detector = Arc::clone(&self.detector);
        let skip_frames = self.skip_frames;
        let video = video.to_path_buf();

        let frames = tokio::task::spawn_blocking(move || {
            let mut source = open(&video)?;
            detect_objects(source.as_mut(), detector.as_ref(), skip_frames)
        })
        .await
        .map_err(|e| MediaError::internal(format!("detection task panicked: {}", e)))??;

        write_object_log(object_log, &frames).await?;
        Ok(frames.len())
    }

    fn name(&self) -> &'static str {
        "frame-detection"
    }
}

/// Adopts an object log produced by an external detector.
///
/// The log is parsed before it is copied, so a corrupt file fails the stage.
#[derive(Debug, Clone)]
pub struct PrecomputedDetections {
    path: PathBuf,
}

impl PrecomputedDetections {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DetectionStage for PrecomputedDetections {
    async fn run(&self, _video: &Path, object_log: &Path) -> MediaResult<usize> {
        if !self.path.exists() {
            return Err(MediaError::FileNotFound(self.path.clone()));
        }
        let content = tokio::fs::read(&self.path).await?;
        let frames: Vec<ObjectFrame> = serde_json::from_slice(&content).map_err(|e| {
            MediaError::detection_failed(format!("invalid object log {}: {}", self.path.display(), e))
        })?;

        if self.path != object_log {
            write_object_log(object_log, &frames).await?;
        }
        info!(source = %self.path.display(), frames = frames.len(), "Adopted precomputed object log");
        Ok(frames.len())
    }

    fn required_inputs(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }

    fn name(&self) -> &'static str {
        "precomputed"
    }
}

async fn write_object_log(path: &Path, frames: &[ObjectFrame]) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(frames)?;
    tokio::fs::write(path, json).await?;
    info!(path = %path.display(), frames = frames.len(), "Wrote object log");
    Ok(())
}
