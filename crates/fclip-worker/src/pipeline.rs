//! Focus highlight pipeline.
//!
//! Stages run strictly in sequence, each reading the previous stage's file:
//!
//! 1. detection → `<work_dir>/<task>/objects.json`
//! 2. scoring and selection → `<work_dir>/<task>/focus.json`
//! 3. rendering → `<output_dir>/<task>/short_*.mp4`
//!
//! Only a fully successful run writes `<output_dir>/<task>/done.flag`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tracing::{info, Instrument};

use fclip_focus::{load_affect_log, load_object_log, save_focus_results, score_windows, select_top_k, WindowConfig};
use fclip_media::{
    ClipExtractor, ClipRenderer, DetectionStage, FfmpegExtractor, FfprobeProber, RenderReport, VideoProber,
};
use fclip_models::{AnalysisRequest, FocusRecord, TaskId};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::TaskLogger;
use crate::progress::ProgressSink;
use crate::status::{task_output_dir, write_marker};

pub const OBJECT_LOG_FILE: &str = "objects.json";
pub const FOCUS_RESULTS_FILE: &str = "focus.json";

const WINDOWS_SCORED: &str = "focusclip_windows_scored_total";
const WINDOWS_SELECTED: &str = "focusclip_windows_selected_total";

/// Progress checkpoints reported around each stage.
mod checkpoint {
    pub const DETECTION_STARTED: u8 = 10;
    pub const DETECTION_DONE: u8 = 30;
    pub const SCORING_STARTED: u8 = 40;
    pub const SCORING_DONE: u8 = 70;
    pub const RENDERING_STARTED: u8 = 80;
    pub const RENDERING_DONE: u8 = 100;
}

/// Files one run reads.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub video: PathBuf,
    pub affect_log: PathBuf,
}

impl PipelineInputs {
    pub fn new(video: impl Into<PathBuf>, affect_log: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            affect_log: affect_log.into(),
        }
    }

    /// Inputs from an analysis request naming a local video file.
    ///
    /// Remote URLs are rejected; fetching them is left to the caller.
    pub fn from_request(request: &AnalysisRequest, affect_log: impl Into<PathBuf>) -> WorkerResult<Self> {
        let url = request.video_url()?;
        let video = match url.strip_prefix("file://") {
            Some(path) => PathBuf::from(path),
            None if url.contains("://") => {
                return Err(WorkerError::Unsupported(format!("remote video source {}", url)))
            }
            None => PathBuf::from(url),
        };
        Ok(Self::new(video, affect_log))
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub task_id: TaskId,
    pub object_frames: usize,
    pub affect_frames: usize,
    pub skipped_affect_rows: usize,
    pub windows_scored: usize,
    /// Persisted selection, best first
    pub selected: Vec<FocusRecord>,
    pub render: RenderReport,
    pub object_log: PathBuf,
    pub focus_results: PathBuf,
    pub marker: PathBuf,
}

struct ScoringOutput {
    affect_frames: usize,
    skipped_rows: usize,
    windows_scored: usize,
    selected: Vec<FocusRecord>,
}

/// Runs detection, scoring and rendering for one task at a time.
pub struct FocusPipeline<P = FfprobeProber, X = FfmpegExtractor> {
    config: WorkerConfig,
    detection: Arc<dyn DetectionStage>,
    renderer: ClipRenderer<P, X>,
    sink: Arc<dyn ProgressSink>,
}

impl FocusPipeline {
    /// Pipeline rendering through ffprobe and ffmpeg.
    pub fn with_ffmpeg(
        config: WorkerConfig,
        detection: Arc<dyn DetectionStage>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let renderer = ClipRenderer::ffmpeg(config.render_config());
        Self::new(config, detection, renderer, sink)
    }
}

impl<P: VideoProber, X: ClipExtractor> FocusPipeline<P, X> {
    pub fn new(
        config: WorkerConfig,
        detection: Arc<dyn DetectionStage>,
        renderer: ClipRenderer<P, X>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            detection,
            renderer,
            sink,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run every stage for `task_id`.
    ///
    /// On any error the remaining stages are skipped, the status record is
    /// marked failed and no completion marker is written.
    pub async fn run(&self, task_id: &TaskId, inputs: &PipelineInputs) -> WorkerResult<PipelineOutcome> {
        let logger = TaskLogger::new(task_id, "focus_pipeline");
        let span = logger.create_span();

        async {
            logger.log_start(&format!("video {}", inputs.video.display()));

            let result = match self.check_inputs(inputs) {
                Ok(()) => self.run_stages(task_id, inputs, &logger).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(outcome) => {
                    logger.log_completion(&format!(
                        "{} of {} clips rendered",
                        outcome.render.rendered(),
                        outcome.render.requested
                    ));
                    Ok(outcome)
                }
                Err(e) => {
                    logger.log_error(&e.to_string());
                    if let Err(sink_err) = self.sink.failed(task_id, &e.to_string()).await {
                        logger.log_warning(&format!("could not record failure: {}", sink_err));
                    }
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    fn check_inputs(&self, inputs: &PipelineInputs) -> WorkerResult<()> {
        self.config.validate()?;
        let required = [inputs.video.clone(), inputs.affect_log.clone()]
            .into_iter()
            .chain(self.detection.required_inputs());
        for path in required {
            if !path.exists() {
                return Err(WorkerError::InputMissing(path));
            }
        }
        Ok(())
    }

    async fn run_stages(
        &self,
        task_id: &TaskId,
        inputs: &PipelineInputs,
        logger: &TaskLogger,
    ) -> WorkerResult<PipelineOutcome> {
        let work_dir = self.config.work_dir.join(task_id.as_str());
        let out_dir = task_output_dir(&self.config.output_dir, task_id);
        let object_log = work_dir.join(OBJECT_LOG_FILE);
        let focus_results = work_dir.join(FOCUS_RESULTS_FILE);

        // Detection
        self.report(task_id, checkpoint::DETECTION_STARTED, "Detecting objects")
            .await?;
        let object_frames = self
            .detection
            .run(&inputs.video, &object_log)
            .await
            .map_err(|e| WorkerError::stage_failed("detection", e))?;
        logger.log_progress(&format!(
            "{} object frames from {}",
            object_frames,
            self.detection.name()
        ));
        self.report(task_id, checkpoint::DETECTION_DONE, "Objects detected")
            .await?;

        // Scoring and selection
        self.report(task_id, checkpoint::SCORING_STARTED, "Scoring focus windows")
            .await?;
        let scoring = score_and_select(
            inputs.affect_log.clone(),
            object_log.clone(),
            focus_results.clone(),
            self.config.window.clone(),
        )
        .await?;
        logger.log_progress(&format!(
            "{} windows scored, {} selected",
            scoring.windows_scored,
            scoring.selected.len()
        ));
        self.report(task_id, checkpoint::SCORING_DONE, "Focus windows selected")
            .await?;

        // Rendering
        self.report(task_id, checkpoint::RENDERING_STARTED, "Rendering clips")
            .await?;
        let render = self
            .renderer
            .render_all(&inputs.video, &scoring.selected, &out_dir)
            .await
            .map_err(|e| WorkerError::stage_failed("rendering", e))?;
        if render.rendered() < render.requested {
            logger.log_warning(&format!(
                "{} skipped, {} failed",
                render.skipped, render.failed
            ));
        }
        self.report(task_id, checkpoint::RENDERING_DONE, "Clips rendered")
            .await?;

        // Status is recorded before the marker exists
        self.sink
            .completed(task_id, render.requested as u32, render.rendered() as u32)
            .await?;
        let marker = write_marker(&self.config.output_dir, task_id).await?;

        Ok(PipelineOutcome {
            task_id: task_id.clone(),
            object_frames,
            affect_frames: scoring.affect_frames,
            skipped_affect_rows: scoring.skipped_rows,
            windows_scored: scoring.windows_scored,
            selected: scoring.selected,
            render,
            object_log,
            focus_results,
            marker,
        })
    }

    async fn report(&self, task_id: &TaskId, value: u8, step: &str) -> WorkerResult<()> {
        self.sink.progress(task_id, value, step).await
    }
}

/// Load both logs, score, select and persist the selection.
///
/// File parsing and scoring are CPU-bound and run on the blocking pool.
async fn score_and_select(
    affect_log: PathBuf,
    object_log: PathBuf,
    focus_results: PathBuf,
    window: WindowConfig,
) -> WorkerResult<ScoringOutput> {
    tokio::task::spawn_blocking(move || {
        score_and_select_blocking(&affect_log, &object_log, &focus_results, &window)
    })
    .await
    .map_err(|e| WorkerError::stage_failed("scoring", e))?
}

fn score_and_select_blocking(
    affect_log: &Path,
    object_log: &Path,
    focus_results: &Path,
    window: &WindowConfig,
) -> WorkerResult<ScoringOutput> {
    let stage = |e: fclip_focus::FocusError| WorkerError::stage_failed("scoring", e);

    let affect = load_affect_log(affect_log).map_err(stage)?;
    let objects = load_object_log(object_log).map_err(stage)?;

    let windows = score_windows(&affect.frames, &objects, window).map_err(stage)?;
    let windows_scored = windows.len();
    let selected: Vec<FocusRecord> = select_top_k(windows, window.top_k)
        .iter()
        .map(FocusRecord::from)
        .collect();

    counter!(WINDOWS_SCORED).increment(windows_scored as u64);
    counter!(WINDOWS_SELECTED).increment(selected.len() as u64);

    save_focus_results(focus_results, &selected).map_err(stage)?;
    info!(
        path = %focus_results.display(),
        windows = windows_scored,
        selected = selected.len(),
        "Focus results written"
    );

    Ok(ScoringOutput {
        affect_frames: affect.frames.len(),
        skipped_rows: affect.skipped_rows,
        windows_scored,
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_from_request() {
        let request = AnalysisRequest {
            youtube_url: Some("file:///data/video.mp4".to_string()),
            ..Default::default()
        };
        let inputs = PipelineInputs::from_request(&request, "affect.csv").unwrap();
        assert_eq!(inputs.video, PathBuf::from("/data/video.mp4"));

        let request = AnalysisRequest {
            link: Some("clips/video.mp4".to_string()),
            ..Default::default()
        };
        let inputs = PipelineInputs::from_request(&request, "affect.csv").unwrap();
        assert_eq!(inputs.video, PathBuf::from("clips/video.mp4"));
    }

    #[test]
    fn test_remote_or_missing_request_rejected() {
        let request = AnalysisRequest {
            url: Some("https://www.youtube.com/watch?v=abc".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PipelineInputs::from_request(&request, "affect.csv"),
            Err(WorkerError::Unsupported(_))
        ));

        assert!(matches!(
            PipelineInputs::from_request(&AnalysisRequest::default(), "affect.csv"),
            Err(WorkerError::Request(_))
        ));
    }
}
