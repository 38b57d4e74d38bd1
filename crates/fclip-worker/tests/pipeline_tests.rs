//! End-to-end pipeline tests with a fake prober and extractor.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use fclip_focus::load_focus_results;
use fclip_media::{ClipExtractor, ClipJob, ClipRenderer, MediaError, MediaResult, PrecomputedDetections, VideoProber};
use fclip_models::{Emotion, TaskId, TaskState};
use fclip_worker::{
    is_completed, list_rendered_clips, poll_status, CompositeSink, FocusPipeline, PipelineInputs, ProgressSink,
    StatusFileSink, WorkerConfig, WorkerError, WorkerResult,
};

struct FixedProber(f64);

#[async_trait]
impl VideoProber for FixedProber {
    async fn duration(&self, _video: &Path) -> MediaResult<f64> {
        Ok(self.0)
    }
}

/// Writes a small file per clip, or fails every call.
struct FakeExtractor {
    fail: bool,
}

#[async_trait]
impl ClipExtractor for FakeExtractor {
    async fn extract(&self, job: &ClipJob) -> MediaResult<()> {
        if self.fail {
            return Err(MediaError::ffmpeg_failed("exit status 1", None, Some(1)));
        }
        std::fs::write(&job.output, format!("{}:{}", job.start, job.duration_seconds))?;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    values: Mutex<Vec<u8>>,
    failures: Mutex<Vec<String>>,
    fail_completed: bool,
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn progress(&self, _task_id: &TaskId, value: u8, _step: &str) -> WorkerResult<()> {
        self.values.lock().unwrap().push(value);
        Ok(())
    }

    async fn completed(&self, _task_id: &TaskId, _requested: u32, _rendered: u32) -> WorkerResult<()> {
        if self.fail_completed {
            return Err(WorkerError::Io(std::io::Error::other("status volume full")));
        }
        Ok(())
    }

    async fn failed(&self, _task_id: &TaskId, message: &str) -> WorkerResult<()> {
        self.failures.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    video: PathBuf,
    affect_log: PathBuf,
    object_log: PathBuf,
}

impl Fixture {
    /// 20 one-second affect frames alternating happy/neutral, gaze on a cup
    /// for the first half.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();

        let video = dir.path().join("source.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        let mut csv = String::from("timestamp,emotion,attention,movement,pupil_x,pupil_y\n");
        for i in 0..20 {
            let emotion = if i % 2 == 0 { "happy" } else { "neutral" };
            let (x, y) = if i < 10 { ("50", "25") } else { ("", "") };
            csv.push_str(&format!("{}.0,{},{},HIGH_FOCUS,{},{}\n", i, emotion, i % 10, x, y));
        }
        let affect_log = dir.path().join("affect.csv");
        std::fs::write(&affect_log, csv).unwrap();

        let object_log = dir.path().join("detections.json");
        std::fs::write(
            &object_log,
            r#"[
                {"frame_id": 0, "timestamp": 0.0, "objects": [{"label": "cup", "bbox": [0, 0, 100, 50], "confidence": 0.91}], "resolution": [1280, 720]},
                {"frame_id": 570, "timestamp": 19.0, "objects": [], "resolution": [1280, 720]}
            ]"#,
        )
        .unwrap();

        Self {
            dir,
            video,
            affect_log,
            object_log,
        }
    }

    fn config(&self) -> WorkerConfig {
        WorkerConfig {
            output_dir: self.dir.path().join("out"),
            work_dir: self.dir.path().join("work"),
            ..Default::default()
        }
    }

    fn inputs(&self) -> PipelineInputs {
        PipelineInputs::new(&self.video, &self.affect_log)
    }

    fn pipeline(
        &self,
        config: WorkerConfig,
        total_duration: f64,
        fail_extraction: bool,
        sink: Arc<dyn ProgressSink>,
    ) -> FocusPipeline<FixedProber, FakeExtractor> {
        let renderer = ClipRenderer::new(
            FixedProber(total_duration),
            FakeExtractor {
                fail: fail_extraction,
            },
            config.render_config(),
        );
        FocusPipeline::new(
            config,
            Arc::new(PrecomputedDetections::new(&self.object_log)),
            renderer,
            sink,
        )
    }
}

#[tokio::test]
async fn test_full_run_writes_marker() {
    let fx = Fixture::new();
    let config = fx.config();
    let output_dir = config.output_dir.clone();
    let recorder = Arc::new(RecordingSink::default());
    let sink = CompositeSink::new()
        .with(recorder.clone())
        .with(Arc::new(StatusFileSink::new(&output_dir)));
    let pipeline = fx.pipeline(config, 12.0, false, Arc::new(sink));
    let task = TaskId::from("task-ok");

    let outcome = pipeline.run(&task, &fx.inputs()).await.unwrap();

    assert_eq!(*recorder.values.lock().unwrap(), vec![10, 30, 40, 70, 80, 100]);
    assert_eq!(outcome.object_frames, 2);
    assert_eq!(outcome.affect_frames, 20);
    // ceil((20 - 10) / 5) candidate windows
    assert_eq!(outcome.windows_scored, 2);
    assert_eq!(outcome.selected.len(), 2);
    assert!(outcome.selected[0].score >= outcome.selected[1].score);

    // The first window looks at the cup for all of its frames
    let first = outcome.selected.iter().find(|r| r.start == 0.0).unwrap();
    assert_eq!(first.object.as_deref(), Some("cup"));
    assert_eq!(first.emotion, Emotion::Happy);
    assert_eq!(first.object_score, 10.0);

    // Window at 5s overruns the 12s video
    let second = outcome.render.clips.iter().find(|c| c.source.start == 5.0).unwrap();
    assert_eq!(second.actual_duration_seconds, 7);

    assert!(outcome.marker.exists());
    assert!(is_completed(&output_dir, &task));
    assert_eq!(poll_status(&output_dir, &task), TaskState::Completed);
    assert_eq!(load_focus_results(&outcome.focus_results).unwrap(), outcome.selected);

    let listing = list_rendered_clips(&output_dir, task.as_str()).unwrap();
    assert_eq!(listing.len(), 2);
    assert!(listing[0].filename.starts_with("task-ok/short_01_"));
}

#[tokio::test]
async fn test_missing_video_aborts_before_stages() {
    let fx = Fixture::new();
    let config = fx.config();
    let output_dir = config.output_dir.clone();
    let work_dir = config.work_dir.clone();
    let recorder = Arc::new(RecordingSink::default());
    let pipeline = fx.pipeline(config, 30.0, false, recorder.clone());
    let task = TaskId::from("task-no-video");

    let inputs = PipelineInputs::new(fx.dir.path().join("missing.mp4"), &fx.affect_log);
    let err = pipeline.run(&task, &inputs).await.unwrap_err();

    assert!(matches!(err, WorkerError::InputMissing(_)));
    assert!(recorder.values.lock().unwrap().is_empty());
    assert_eq!(recorder.failures.lock().unwrap().len(), 1);
    assert!(!work_dir.join("task-no-video").exists());
    assert!(!is_completed(&output_dir, &task));
}

#[tokio::test]
async fn test_missing_object_log_is_input_error() {
    let fx = Fixture::new();
    std::fs::remove_file(&fx.object_log).unwrap();
    let config = fx.config();
    let output_dir = config.output_dir.clone();
    let pipeline = fx.pipeline(config, 30.0, false, Arc::new(RecordingSink::default()));
    let task = TaskId::from("task-no-objects");

    let err = pipeline.run(&task, &fx.inputs()).await.unwrap_err();
    assert!(matches!(err, WorkerError::InputMissing(path) if path == fx.object_log));
    assert!(!is_completed(&output_dir, &task));
}

#[tokio::test]
async fn test_empty_affect_stream_fails_without_marker() {
    let fx = Fixture::new();
    std::fs::write(&fx.affect_log, "timestamp,emotion,attention,movement,pupil_x,pupil_y\n").unwrap();
    let config = fx.config();
    let output_dir = config.output_dir.clone();
    let pipeline = fx.pipeline(config, 30.0, false, Arc::new(StatusFileSink::new(&output_dir)));
    let task = TaskId::from("task-empty");

    let err = pipeline.run(&task, &fx.inputs()).await.unwrap_err();

    assert!(matches!(err, WorkerError::StageFailed { stage: "scoring", .. }));
    assert!(!is_completed(&output_dir, &task));
    assert_eq!(poll_status(&output_dir, &task), TaskState::Failed);
}

#[tokio::test]
async fn test_clip_failures_still_complete() {
    let fx = Fixture::new();
    let config = fx.config();
    let output_dir = config.output_dir.clone();
    let pipeline = fx.pipeline(config, 30.0, true, Arc::new(RecordingSink::default()));
    let task = TaskId::from("task-partial");

    let outcome = pipeline.run(&task, &fx.inputs()).await.unwrap();

    assert_eq!(outcome.render.requested, 2);
    assert_eq!(outcome.render.rendered(), 0);
    assert_eq!(outcome.render.failed, 2);
    assert!(is_completed(&output_dir, &task));
}

#[tokio::test]
async fn test_failed_completion_record_leaves_no_marker() {
    let fx = Fixture::new();
    let config = fx.config();
    let output_dir = config.output_dir.clone();
    let recorder = Arc::new(RecordingSink {
        fail_completed: true,
        ..Default::default()
    });
    let sink = CompositeSink::new()
        .with(Arc::new(StatusFileSink::new(&output_dir)))
        .with(recorder.clone());
    let pipeline = fx.pipeline(config, 30.0, false, Arc::new(sink));
    let task = TaskId::from("task-unrecorded");

    let err = pipeline.run(&task, &fx.inputs()).await.unwrap_err();

    assert!(matches!(err, WorkerError::Io(_)));
    assert_eq!(recorder.failures.lock().unwrap().len(), 1);
    assert!(!is_completed(&output_dir, &task));
    assert_eq!(poll_status(&output_dir, &task), TaskState::Failed);
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let fx = Fixture::new();
    let first_task = TaskId::from("run-a");
    let second_task = TaskId::from("run-b");

    let first = fx
        .pipeline(fx.config(), 30.0, false, Arc::new(RecordingSink::default()))
        .run(&first_task, &fx.inputs())
        .await
        .unwrap();
    let second = fx
        .pipeline(fx.config(), 30.0, false, Arc::new(RecordingSink::default()))
        .run(&second_task, &fx.inputs())
        .await
        .unwrap();

    let names = |outcome: &fclip_worker::PipelineOutcome| -> Vec<String> {
        outcome.render.clips.iter().map(|c| c.file_name()).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(
        std::fs::read(&first.focus_results).unwrap(),
        std::fs::read(&second.focus_results).unwrap()
    );
}
