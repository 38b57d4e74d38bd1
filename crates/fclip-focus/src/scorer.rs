//! Sliding-window focus scoring.
//!
//! A window starts at every `step` seconds from the first affect timestamp
//! and covers `[t, t + window)`. Windows are taken only while
//! `t < last_timestamp - window`, so the final window that would touch the
//! trailing edge of the stream is never scored. Empty slices produce nothing.

use tracing::{debug, info};

use fclip_models::{AffectFrame, Emotion, FocusWindow, ObjectFrame};

use crate::association::associate;
use crate::config::WindowConfig;
use crate::error::{FocusError, FocusResult};
use crate::selector::select_top_k;

/// Maximum object score.
const MAX_OBJECT_SCORE: f64 = 10.0;

/// Score every non-empty window over the two streams.
///
/// Both inputs are read-only. Windows are returned in emission order
/// (ascending start) without merging overlaps.
pub fn score_windows(
    affect: &[AffectFrame],
    objects: &[ObjectFrame],
    config: &WindowConfig,
) -> FocusResult<Vec<FocusWindow>> {
    config.ensure_valid()?;
    if affect.is_empty() {
        return Err(FocusError::EmptyStream("affect"));
    }
    if objects.is_empty() {
        return Err(FocusError::EmptyStream("object"));
    }

    let (min_time, max_time) = affect.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), frame| (lo.min(frame.timestamp), hi.max(frame.timestamp)),
    );
    let window = f64::from(config.window_length_seconds);
    let step = f64::from(config.step_seconds);

    let mut windows = Vec::new();
    let mut index: u64 = 0;
    loop {
        let start = min_time + index as f64 * step;
        if start >= max_time - window {
            break;
        }
        index += 1;

        let slice: Vec<&AffectFrame> = affect
            .iter()
            .filter(|frame| start <= frame.timestamp && frame.timestamp < start + window)
            .collect();
        if slice.is_empty() {
            continue;
        }

        let scored = score_slice(start, &slice, objects, config);
        debug!(
            start = scored.start_time,
            emotion = %scored.dominant_emotion,
            attention = scored.attention_avg,
            emotion_score = scored.emotion_score,
            object_score = scored.object_score,
            score = scored.composite_score,
            object = ?scored.focused_object_label,
            "Scored focus window"
        );
        windows.push(scored);
    }

    info!(
        affect_frames = affect.len(),
        object_frames = objects.len(),
        windows = windows.len(),
        "Focus windows scored"
    );
    Ok(windows)
}

/// Score and select: the top-K windows by composite score.
pub fn analyze_focus(
    affect: &[AffectFrame],
    objects: &[ObjectFrame],
    config: &WindowConfig,
) -> FocusResult<Vec<FocusWindow>> {
    let windows = score_windows(affect, objects, config)?;
    Ok(select_top_k(windows, config.top_k))
}

fn score_slice(
    start: f64,
    slice: &[&AffectFrame],
    objects: &[ObjectFrame],
    config: &WindowConfig,
) -> FocusWindow {
    let frame_count = slice.len() as f64;

    let mut emotions = Tally::default();
    for frame in slice {
        emotions.add(frame.emotion);
    }
    let dominant_emotion = emotions
        .winner()
        .map(|(emotion, _)| *emotion)
        .unwrap_or(Emotion::Unknown);

    let emotion_score = slice.iter().map(|f| f.emotion.weight()).sum::<f64>() / frame_count;
    let attention_avg = slice.iter().map(|f| f.attention_score).sum::<f64>() / frame_count;

    let mut gaze_hits: Tally<String> = Tally::default();
    for (frame, nearest) in associate(slice, objects) {
        let (Some(pupil), Some(nearest)) = (frame.pupil, nearest) else {
            continue;
        };
        for detection in &nearest.objects {
            if detection
                .bbox
                .contains_with_margin(&pupil, config.gaze_margin_px)
            {
                gaze_hits.add(detection.label.clone());
            }
        }
    }

    let (focused_object_label, object_score) = match gaze_hits.winner() {
        Some((label, hits)) => (
            Some(label.clone()),
            (hits as f64 / frame_count * 10.0).min(MAX_OBJECT_SCORE),
        ),
        None => (None, 0.0),
    };

    FocusWindow {
        start_time: start,
        window_length_seconds: config.window_length_seconds,
        dominant_emotion,
        focused_object_label,
        composite_score: FocusWindow::composite(attention_avg, emotion_score, object_score),
        attention_avg,
        emotion_score,
        object_score,
    }
}

/// Insertion-ordered counter; ties resolve to the first key seen.
struct Tally<K> {
    counts: Vec<(K, usize)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self { counts: Vec::new() }
    }
}

impl<K: PartialEq> Tally<K> {
    fn add(&mut self, key: K) {
        match self.counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((key, 1)),
        }
    }

    fn winner(&self) -> Option<(&K, usize)> {
        let mut best: Option<(&K, usize)> = None;
        for (key, count) in &self.counts {
            if best.map_or(true, |(_, best_count)| *count > best_count) {
                best = Some((key, *count));
            }
        }
        best
    }
}
