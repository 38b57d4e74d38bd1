//! Rendered clip descriptor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::FocusRecord;

/// A clip cut from the source video for one selected focus window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedClip {
    /// 1-based position in the selection order
    pub sequence: u32,
    /// Window the clip was cut from
    pub source: FocusRecord,
    pub output_path: PathBuf,
    /// Seconds actually extracted (shorter than the window when clamped)
    pub actual_duration_seconds: u32,
}

impl RenderedClip {
    /// Whether the clip was shortened to fit the source video.
    pub fn was_clamped(&self) -> bool {
        self.actual_duration_seconds < self.source.window
    }

    /// Output file name without directory.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// A rendered clip as seen by a result listing: only what the file name says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipListing {
    /// `<task_id>/<file name>`, relative to the output root
    pub filename: String,
    pub emotion: String,
    /// Window start as `MM:SS`
    pub timestamp: String,
}
