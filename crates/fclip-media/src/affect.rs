//! Gaze movement and attention scoring for the live affect classifier.
//!
//! The classifier itself is external; this module turns its per-frame output
//! (emotion, confidence, pupil point) into an [`AffectFrame`]. Movement is
//! classified from the pupil displacement since the previous frame, and that
//! previous point travels in an explicit [`GazeState`] so independent
//! streams never share state.

use std::fmt;

use fclip_models::{round2, AffectFrame, Emotion, MovementClass, PupilPoint};

/// Displacement (px) below which gaze counts as steady.
const HIGH_FOCUS_MAX_DISTANCE: f64 = 8.0;
/// Displacement (px) below which gaze counts as wandering but engaged.
const MEDIUM_FOCUS_MAX_DISTANCE: f64 = 20.0;

const EYE_WEIGHT: f64 = 0.6;
const EMOTION_SCORE_WEIGHT: f64 = 0.4;
const MAX_EMOTION_SCORE: f64 = 10.0;

/// Pupil position carried between consecutive frames of one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GazeState {
    pub previous: Option<PupilPoint>,
}

/// Classify gaze movement and return the state for the next frame.
///
/// The returned state always holds `current`, so a frame without a pupil
/// makes the following frame `Unknown` as well.
pub fn classify_movement(state: GazeState, current: Option<PupilPoint>) -> (MovementClass, GazeState) {
    let movement = match (state.previous, current) {
        (Some(previous), Some(current)) => {
            let distance = current.distance(&previous);
            if distance < HIGH_FOCUS_MAX_DISTANCE {
                MovementClass::HighFocus
            } else if distance < MEDIUM_FOCUS_MAX_DISTANCE {
                MovementClass::MediumFocus
            } else {
                MovementClass::LowFocus
            }
        }
        _ => MovementClass::Unknown,
    };
    (movement, GazeState { previous: current })
}

fn eye_score(movement: MovementClass) -> f64 {
    match movement {
        MovementClass::HighFocus => 10.0,
        MovementClass::MediumFocus => 5.0,
        MovementClass::LowFocus | MovementClass::Unknown => 0.0,
    }
}

/// Attention on the 0-10 scale, rounded to two decimals.
pub fn attention_score(movement: MovementClass, emotion_score: f64) -> f64 {
    round2(eye_score(movement) * EYE_WEIGHT + emotion_score * EMOTION_SCORE_WEIGHT)
}

/// Emotion weight plus a confidence bonus, capped at 10.
pub fn emotion_confidence_score(emotion: Emotion, confidence: f64) -> f64 {
    let bonus = if confidence > 0.7 {
        2.0
    } else if confidence > 0.5 {
        1.0
    } else {
        0.0
    };
    (bonus + emotion.weight()).min(MAX_EMOTION_SCORE)
}

/// Qualitative attention bucket shown to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionLevel {
    High,
    Medium,
    Low,
}

impl AttentionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttentionLevel::High => "High",
            AttentionLevel::Medium => "Medium",
            AttentionLevel::Low => "Low",
        }
    }
}

impl fmt::Display for AttentionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn attention_level(score: f64) -> AttentionLevel {
    if score >= 8.0 {
        AttentionLevel::High
    } else if score >= 4.0 {
        AttentionLevel::Medium
    } else {
        AttentionLevel::Low
    }
}

/// Raw per-frame output of the external affect classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffectClassification {
    pub emotion: Emotion,
    pub confidence: f64,
    pub pupil: Option<PupilPoint>,
}

/// Build the affect frame for one classifier output.
pub fn affect_frame(
    state: GazeState,
    timestamp: f64,
    classification: &AffectClassification,
) -> (AffectFrame, GazeState) {
    let (movement, next) = classify_movement(state, classification.pupil);
    let emotion_score = emotion_confidence_score(classification.emotion, classification.confidence);
    let frame = AffectFrame {
        timestamp,
        emotion: classification.emotion,
        attention_score: attention_score(movement, emotion_score),
        movement,
        pupil: classification.pupil,
    };
    (frame, next)
}
