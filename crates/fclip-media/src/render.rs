//! Clip rendering from selected focus windows.
//!
//! Each selected window becomes one re-encoded clip with the focus
//! annotation burned in. Per-clip failures are counted and skipped; only a
//! missing source video or an unprobeable one aborts the batch.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use metrics::counter;
use tracing::{info, warn};

use fclip_models::{ClipListing, EncodingConfig, FocusRecord, RenderedClip};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::overlay::build_drawtext;
use crate::probe::get_duration;

const CLIPS_RENDERED: &str = "focusclip_clips_rendered_total";
const CLIPS_SKIPPED: &str = "focusclip_clips_skipped_total";
const CLIPS_FAILED: &str = "focusclip_clips_failed_total";

/// Reports a source video's total duration in seconds.
#[async_trait]
pub trait VideoProber: Send + Sync {
    async fn duration(&self, video: &Path) -> MediaResult<f64>;
}

/// One extraction request handed to a [`ClipExtractor`].
#[derive(Debug, Clone)]
pub struct ClipJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub start: f64,
    pub duration_seconds: u32,
    /// Complete `-vf` filter string
    pub filter: String,
    pub encoding: EncodingConfig,
}

/// Cuts and re-encodes one clip.
#[async_trait]
pub trait ClipExtractor: Send + Sync {
    async fn extract(&self, job: &ClipJob) -> MediaResult<()>;
}

/// [`VideoProber`] backed by ffprobe.
#[derive(Debug, Default, Clone)]
pub struct FfprobeProber;

#[async_trait]
impl VideoProber for FfprobeProber {
    async fn duration(&self, video: &Path) -> MediaResult<f64> {
        get_duration(video).await
    }
}

/// [`ClipExtractor`] backed by the ffmpeg CLI.
#[derive(Debug, Default, Clone)]
pub struct FfmpegExtractor {
    runner: FfmpegRunner,
}

impl FfmpegExtractor {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &FfmpegRunner {
        &self.runner
    }

    pub fn build_command(job: &ClipJob) -> FfmpegCommand {
        FfmpegCommand::new(&job.source, &job.output)
            .seek(job.start)
            .duration(job.duration_seconds)
            .video_filter(job.filter.clone())
            .output_args(job.encoding.to_ffmpeg_args())
    }
}

#[async_trait]
impl ClipExtractor for FfmpegExtractor {
    async fn extract(&self, job: &ClipJob) -> MediaResult<()> {
        self.runner.run(&Self::build_command(job)).await
    }
}

/// Renderer settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Used when a record carries no window length
    pub default_window_length_seconds: u32,
    /// Outputs smaller than this are deleted and counted as failures
    pub min_output_bytes: Option<u64>,
    /// Kill an extraction that runs longer than this
    pub ffmpeg_timeout_secs: Option<u64>,
    pub encoding: EncodingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_window_length_seconds: 10,
            min_output_bytes: None,
            ffmpeg_timeout_secs: None,
            encoding: EncodingConfig::default(),
        }
    }
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    pub requested: usize,
    pub clips: Vec<RenderedClip>,
    /// Windows that start at or past the end of the video
    pub skipped: usize,
    /// Extraction errors and undersized outputs
    pub failed: usize,
}

impl RenderReport {
    pub fn rendered(&self) -> usize {
        self.clips.len()
    }
}

/// Clip length that fits the source video, or `None` when nothing is left.
///
/// Overruns are shortened to `max(1, floor(total - start))`; a window that
/// starts at or after `total` is skipped.
pub fn clamp_duration(start: f64, length: u32, total: f64) -> Option<u32> {
    if length == 0 {
        return None;
    }
    if start + f64::from(length) <= total {
        return Some(length);
    }
    if start >= total {
        return None;
    }
    Some((total - start).floor().max(1.0) as u32)
}

/// `short_<NN>_<emotion>_<object>_<start>s_<score>.mp4`
pub fn clip_filename(sequence: u32, record: &FocusRecord) -> String {
    format!(
        "short_{:02}_{}_{}_{}s_{:.2}.mp4",
        sequence,
        record.emotion.as_str(),
        record.object.as_deref().unwrap_or("None"),
        record.start.trunc() as i64,
        record.score
    )
}

/// Renders selected windows through a prober and an extractor.
pub struct ClipRenderer<P = FfprobeProber, X = FfmpegExtractor> {
    prober: P,
    extractor: X,
    config: RenderConfig,
}

impl ClipRenderer {
    /// Renderer using ffprobe and ffmpeg.
    pub fn ffmpeg(config: RenderConfig) -> Self {
        let runner = match config.ffmpeg_timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        };
        Self::new(FfprobeProber, FfmpegExtractor::new(runner), config)
    }
}

impl<P: VideoProber, X: ClipExtractor> ClipRenderer<P, X> {
    pub fn new(prober: P, extractor: X, config: RenderConfig) -> Self {
        Self {
            prober,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render every record, in order, into `out_dir`.
    pub async fn render_all(
        &self,
        source: &Path,
        records: &[FocusRecord],
        out_dir: &Path,
    ) -> MediaResult<RenderReport> {
        if !source.exists() {
            return Err(MediaError::FileNotFound(source.to_path_buf()));
        }

        let total = self.prober.duration(source).await?;
        tokio::fs::create_dir_all(out_dir).await?;

        info!(
            source = %source.display(),
            total_duration = total,
            windows = records.len(),
            "Rendering focus clips"
        );

        let mut report = RenderReport {
            requested: records.len(),
            ..Default::default()
        };

        for (index, record) in records.iter().enumerate() {
            let sequence = index as u32 + 1;
            let length = match record.window {
                0 => self.config.default_window_length_seconds,
                w => w,
            };

            let Some(duration) = clamp_duration(record.start, length, total) else {
                info!(
                    sequence,
                    start = record.start,
                    total_duration = total,
                    "Skipping window past end of video"
                );
                counter!(CLIPS_SKIPPED).increment(1);
                report.skipped += 1;
                continue;
            };

            let output = out_dir.join(clip_filename(sequence, record));
            let job = ClipJob {
                source: source.to_path_buf(),
                output: output.clone(),
                start: record.start,
                duration_seconds: duration,
                filter: build_drawtext(record),
                encoding: self.config.encoding.clone(),
            };

            if let Err(e) = self.extractor.extract(&job).await {
                warn!(sequence, output = %output.display(), error = %e, "Clip extraction failed");
                counter!(CLIPS_FAILED).increment(1);
                report.failed += 1;
                continue;
            }

            if let Some(min_bytes) = self.config.min_output_bytes {
                let size = tokio::fs::metadata(&output).await.map(|m| m.len()).unwrap_or(0);
                if size < min_bytes {
                    warn!(
                        sequence,
                        output = %output.display(),
                        size,
                        min_bytes,
                        "Discarding undersized clip"
                    );
                    let _ = tokio::fs::remove_file(&output).await;
                    counter!(CLIPS_FAILED).increment(1);
                    report.failed += 1;
                    continue;
                }
            }

            info!(
                sequence,
                output = %output.display(),
                duration,
                clamped = duration < length,
                "Rendered clip"
            );
            counter!(CLIPS_RENDERED).increment(1);
            report.clips.push(RenderedClip {
                sequence,
                source: record.clone(),
                output_path: output,
                actual_duration_seconds: duration,
            });
        }

        info!(
            requested = report.requested,
            rendered = report.rendered(),
            skipped = report.skipped,
            failed = report.failed,
            "Clip rendering finished"
        );
        Ok(report)
    }
}

/// List the clips rendered for a task under `output_root/<task_id>/`.
///
/// Only the file names are read. A missing directory yields an empty list.
pub fn list_rendered_clips(output_root: &Path, task_id: &str) -> MediaResult<Vec<ClipListing>> {
    let dir = output_root.join(task_id);
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Clip directory not found");
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".mp4"))
        .collect();
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| {
            let (emotion, timestamp) = parse_clip_name(&name);
            ClipListing {
                filename: format!("{}/{}", task_id, name),
                emotion,
                timestamp,
            }
        })
        .collect())
}

/// Emotion and `MM:SS` start parsed from a clip file name.
fn parse_clip_name(name: &str) -> (String, String) {
    let parts: Vec<&str> = name.split('_').collect();
    let emotion = parts.get(2).map(|e| e.to_string()).unwrap_or_else(|| "unknown".to_string());
    let timestamp = parts
        .get(4)
        .and_then(|p| p.strip_suffix('s'))
        .and_then(|secs| secs.parse::<f64>().ok())
        .map(|secs| {
            let secs = secs.max(0.0) as u64;
            format!("{:02}:{:02}", secs / 60, secs % 60)
        })
        .unwrap_or_else(|| "00:00".to_string());
    (emotion, timestamp)
}
