//! Affect and object-detection signal frames.
//!
//! Both streams are sampled independently: the affect stream comes from the
//! viewer-facing camera, the object stream from the source video. They share
//! nothing but the video timeline (seconds).

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Emotion label produced by the affect classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Surprise,
    Happy,
    Sad,
    Angry,
    Neutral,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Surprise => "surprise",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Neutral => "neutral",
            Emotion::Unknown => "unknown",
        }
    }

    /// Categorical weight used by the focus scorer.
    pub fn weight(&self) -> f64 {
        match self {
            Emotion::Surprise => 5.0,
            Emotion::Happy => 4.0,
            Emotion::Sad => 3.0,
            Emotion::Angry => 2.0,
            Emotion::Neutral => 1.0,
            Emotion::Unknown => 0.0,
        }
    }

    /// Parse a classifier label, case-insensitively.
    ///
    /// Anything outside the closed set (including the classifier's `Error`
    /// placeholder) becomes `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "surprise" => Emotion::Surprise,
            "happy" => Emotion::Happy,
            "sad" => Emotion::Sad,
            "angry" => Emotion::Angry,
            "neutral" => Emotion::Neutral,
            _ => Emotion::Unknown,
        }
    }
}

impl FromStr for Emotion {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gaze stability class derived from pupil displacement between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementClass {
    HighFocus,
    MediumFocus,
    LowFocus,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MovementClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementClass::HighFocus => "HIGH_FOCUS",
            MovementClass::MediumFocus => "MEDIUM_FOCUS",
            MovementClass::LowFocus => "LOW_FOCUS",
            MovementClass::Unknown => "UNKNOWN",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "HIGH_FOCUS" => MovementClass::HighFocus,
            "MEDIUM_FOCUS" => MovementClass::MediumFocus,
            "LOW_FOCUS" => MovementClass::LowFocus,
            _ => MovementClass::Unknown,
        }
    }
}

impl fmt::Display for MovementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pupil center in source-frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PupilPoint {
    pub x: f64,
    pub y: f64,
}

impl PupilPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &PupilPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One sample of the affect stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectFrame {
    /// Video time in seconds
    pub timestamp: f64,
    pub emotion: Emotion,
    /// Attention score (0-10 scale, computed upstream)
    pub attention_score: f64,
    pub movement: MovementClass,
    /// Absent when no face/eyes were found
    pub pupil: Option<PupilPoint>,
}

/// Axis-aligned box `[x1, y1, x2, y2]` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Inclusive hit test with `margin` pixels of slack on every side.
    pub fn contains_with_margin(&self, point: &PupilPoint, margin: f64) -> bool {
        (self.x1 - margin) <= point.x
            && point.x <= (self.x2 + margin)
            && (self.y1 - margin) <= point.y
            && point.y <= (self.y2 + margin)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// A single detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bbox: BoundingBox,
    pub confidence: f64,
}

/// One sampled frame of the object stream, in the persisted object-log shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectFrame {
    pub frame_id: u64,
    /// Video time in seconds
    pub timestamp: f64,
    #[serde(default)]
    pub objects: Vec<Detection>,
    /// (width, height)
    pub resolution: (u32, u32),
}
