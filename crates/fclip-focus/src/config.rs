//! Sliding-window parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{FocusError, FocusResult};

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: u32 = 10;
/// Default distance between window starts in seconds.
pub const DEFAULT_STEP_SECS: u32 = 5;
/// Default number of windows kept by the selector.
pub const DEFAULT_TOP_K: usize = 3;
/// Default slack around each bounding box for the gaze hit test (pixels).
pub const DEFAULT_GAZE_MARGIN_PX: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WindowConfig {
    #[validate(range(min = 1))]
    pub window_length_seconds: u32,

    #[validate(range(min = 1))]
    pub step_seconds: u32,

    #[validate(range(min = 1))]
    pub top_k: usize,

    #[validate(range(min = 0.0))]
    pub gaze_margin_px: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_length_seconds: DEFAULT_WINDOW_SECS,
            step_seconds: DEFAULT_STEP_SECS,
            top_k: DEFAULT_TOP_K,
            gaze_margin_px: DEFAULT_GAZE_MARGIN_PX,
        }
    }
}

impl WindowConfig {
    pub fn new(window_length_seconds: u32, step_seconds: u32, top_k: usize) -> Self {
        Self {
            window_length_seconds,
            step_seconds,
            top_k,
            ..Default::default()
        }
    }

    pub fn with_gaze_margin(mut self, margin_px: f64) -> Self {
        self.gaze_margin_px = margin_px;
        self
    }

    /// Validate, mapping failures into [`FocusError::InvalidConfig`].
    pub fn ensure_valid(&self) -> FocusResult<()> {
        self.validate()
            .map_err(|e| FocusError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(WindowConfig::default().ensure_valid().is_ok());
    }

    #[test]
    fn test_zero_step_rejected() {
        let config = WindowConfig::new(10, 0, 3);
        assert!(matches!(
            config.ensure_valid(),
            Err(FocusError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        assert!(WindowConfig::new(10, 5, 0).ensure_valid().is_err());
    }
}
