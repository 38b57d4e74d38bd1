//! Focus window models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Emotion;

/// Weight of the mean attention score in the composite.
pub const ATTENTION_WEIGHT: f64 = 0.4;
/// Weight of the mean categorical emotion score in the composite.
pub const EMOTION_WEIGHT: f64 = 0.3;
/// Weight of the object-gaze overlap score in the composite.
pub const OBJECT_WEIGHT: f64 = 0.3;

/// A scored, fixed-length slice of the affect stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusWindow {
    /// Window start (seconds)
    pub start_time: f64,
    pub window_length_seconds: u32,
    pub dominant_emotion: Emotion,
    /// Label the viewer looked at most, if any gaze hit an object
    pub focused_object_label: Option<String>,
    pub composite_score: f64,
    pub attention_avg: f64,
    pub emotion_score: f64,
    pub object_score: f64,
}

impl FocusWindow {
    /// Fixed-weight linear combination of the three sub-scores.
    pub fn composite(attention_avg: f64, emotion_score: f64, object_score: f64) -> f64 {
        ATTENTION_WEIGHT * attention_avg + EMOTION_WEIGHT * emotion_score + OBJECT_WEIGHT * object_score
    }

    /// Recompute the composite score from the carried sub-scores.
    pub fn recompute_score(&self) -> f64 {
        Self::composite(self.attention_avg, self.emotion_score, self.object_score)
    }
}

/// One row of the persisted focus result artifact (`focus.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FocusRecord {
    /// Window start (seconds, 2 decimals)
    pub start: f64,
    /// Dominant emotion label
    #[schemars(with = "String")]
    pub emotion: Emotion,
    /// Focused object label
    pub object: Option<String>,
    pub score: f64,
    pub attention_avg: f64,
    pub emotion_score: f64,
    pub object_score: f64,
    /// Window length in seconds
    #[serde(default)]
    pub window: u32,
}

impl From<&FocusWindow> for FocusRecord {
    fn from(w: &FocusWindow) -> Self {
        Self {
            start: round2(w.start_time),
            emotion: w.dominant_emotion,
            object: w.focused_object_label.clone(),
            score: round2(w.composite_score),
            attention_avg: round2(w.attention_avg),
            emotion_score: round2(w.emotion_score),
            object_score: round2(w.object_score),
            window: w.window_length_seconds,
        }
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
