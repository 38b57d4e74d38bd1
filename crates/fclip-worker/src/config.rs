//! Worker configuration.

use std::path::PathBuf;

use fclip_focus::WindowConfig;
use fclip_media::RenderConfig;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root for clips, status records and completion markers
    pub output_dir: PathBuf,
    /// Root for intermediate logs (object log, focus results)
    pub work_dir: PathBuf,
    /// Window length, step, top-K and gaze margin
    pub window: WindowConfig,
    /// Rendered clips below this size are discarded
    pub min_clip_bytes: Option<u64>,
    /// Per-clip ffmpeg timeout; none by default
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("shorts_output"),
            work_dir: PathBuf::from("analysis_outputs"),
            window: WindowConfig::default(),
            min_clip_bytes: None,
            ffmpeg_timeout_secs: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("FOCUS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            work_dir: std::env::var("FOCUS_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            window: WindowConfig {
                window_length_seconds: env_parse("FOCUS_WINDOW_SEC")
                    .unwrap_or(defaults.window.window_length_seconds),
                step_seconds: env_parse("FOCUS_STEP_SEC").unwrap_or(defaults.window.step_seconds),
                top_k: env_parse("FOCUS_TOP_K").unwrap_or(defaults.window.top_k),
                gaze_margin_px: env_parse("FOCUS_GAZE_MARGIN_PX")
                    .unwrap_or(defaults.window.gaze_margin_px),
            },
            min_clip_bytes: env_parse("FOCUS_MIN_CLIP_BYTES"),
            ffmpeg_timeout_secs: env_parse("FOCUS_FFMPEG_TIMEOUT_SECS"),
        }
    }

    pub fn validate(&self) -> WorkerResult<()> {
        self.window
            .ensure_valid()
            .map_err(|e| WorkerError::config(e.to_string()))?;
        if self.ffmpeg_timeout_secs == Some(0) {
            return Err(WorkerError::config("ffmpeg timeout must be at least 1 second"));
        }
        Ok(())
    }

    /// Renderer settings derived from this config.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            default_window_length_seconds: self.window.window_length_seconds,
            min_output_bytes: self.min_clip_bytes,
            ffmpeg_timeout_secs: self.ffmpeg_timeout_secs,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = WorkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.window_length_seconds, 10);
        assert_eq!(config.window.step_seconds, 5);
        assert_eq!(config.window.top_k, 3);
    }

    #[test]
    fn test_invalid_window_rejected() {
        let mut config = WorkerConfig::default();
        config.window.step_seconds = 0;
        assert!(matches!(config.validate(), Err(WorkerError::Config(_))));

        let mut config = WorkerConfig::default();
        config.ffmpeg_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_render_config() {
        let mut config = WorkerConfig::default();
        config.window.window_length_seconds = 15;
        config.min_clip_bytes = Some(500 * 1024);
        config.ffmpeg_timeout_secs = Some(600);

        let render = config.render_config();
        assert_eq!(render.default_window_length_seconds, 15);
        assert_eq!(render.min_output_bytes, Some(512_000));
        assert_eq!(render.ffmpeg_timeout_secs, Some(600));
        assert_eq!(render.encoding.codec, "libx264");
    }
}
