//! Signal log loading and focus result artifacts.
//!
//! The affect log is tolerant: a bad row is skipped and counted, never fatal.
//! The object log is strict: association needs the whole stream, so a missing
//! or malformed file fails the load.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{debug, info, warn};

use fclip_models::{AffectFrame, Emotion, FocusRecord, MovementClass, ObjectFrame, PupilPoint};

use crate::error::{FocusError, FocusResult};

/// Ordinal attention vocabulary written by the live-capture classifier.
const ATTENTION_LEVELS: &[(&str, f64)] = &[("Low", 0.2), ("Medium", 0.5), ("High", 1.0)];

/// Parsed affect log.
#[derive(Debug, Clone, Default)]
pub struct AffectLog {
    /// Frames in ascending timestamp order
    pub frames: Vec<AffectFrame>,
    /// Rows dropped as malformed
    pub skipped_rows: usize,
}

/// Column positions resolved from the header row.
struct AffectColumns {
    time: usize,
    emotion: Option<usize>,
    attention: Option<usize>,
    movement: Option<usize>,
    pupil_x: Option<usize>,
    pupil_y: Option<usize>,
}

impl AffectColumns {
    fn resolve(headers: &StringRecord) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        // Live-capture logs carry a wall-clock `timestamp` next to the video time.
        let time = find("video_time").or_else(|| find("timestamp"))?;
        Some(Self {
            time,
            emotion: find("emotion"),
            attention: find("attention"),
            movement: find("movement"),
            pupil_x: find("pupil_x"),
            pupil_y: find("pupil_y"),
        })
    }
}

/// Convert an attention cell to a number.
///
/// Numeric text parses directly, the ordinal vocabulary maps through a fixed
/// table, and anything else is 0.0.
pub fn attention_from_str(value: &str) -> f64 {
    let value = value.trim();
    if let Ok(number) = value.parse::<f64>() {
        return number;
    }
    ATTENTION_LEVELS
        .iter()
        .find(|(label, _)| *label == value)
        .map(|(_, score)| *score)
        .unwrap_or(0.0)
}

/// Load the affect log from CSV.
pub fn load_affect_log(path: impl AsRef<Path>) -> FocusResult<AffectLog> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FocusError::NotFound(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let columns = AffectColumns::resolve(&headers)
        .ok_or_else(|| FocusError::invalid_log(path, "missing timestamp column"))?;

    let mut log = AffectLog::default();
    for (index, record) in reader.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(line, error = %e, "Skipping unreadable affect row");
                log.skipped_rows += 1;
                continue;
            }
        };

        match parse_affect_row(&record, &columns) {
            Ok(frame) => log.frames.push(frame),
            Err(reason) => {
                warn!(line, reason, row = ?record, "Skipping affect row");
                log.skipped_rows += 1;
            }
        }
    }

    log.frames
        .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    info!(
        path = %path.display(),
        frames = log.frames.len(),
        skipped = log.skipped_rows,
        "Loaded affect log"
    );
    Ok(log)
}

fn parse_affect_row(record: &StringRecord, columns: &AffectColumns) -> Result<AffectFrame, &'static str> {
    let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).filter(|v| !v.is_empty());

    let timestamp = cell(Some(columns.time))
        .ok_or("missing timestamp")?
        .parse::<f64>()
        .map_err(|_| "unparseable timestamp")?;
    if !timestamp.is_finite() {
        return Err("non-finite timestamp");
    }

    let emotion = cell(columns.emotion).ok_or("missing emotion")?;
    let attention = cell(columns.attention).ok_or("missing attention")?;

    let pupil = match (
        cell(columns.pupil_x).and_then(|v| v.parse::<f64>().ok()),
        cell(columns.pupil_y).and_then(|v| v.parse::<f64>().ok()),
    ) {
        (Some(x), Some(y)) => Some(PupilPoint::new(x, y)),
        _ => None,
    };

    Ok(AffectFrame {
        timestamp,
        emotion: Emotion::from_label(emotion),
        attention_score: attention_from_str(attention),
        movement: cell(columns.movement)
            .map(MovementClass::from_label)
            .unwrap_or_default(),
        pupil,
    })
}

/// Load the object log. Any failure is fatal.
pub fn load_object_log(path: impl AsRef<Path>) -> FocusResult<Vec<ObjectFrame>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FocusError::NotFound(path.to_path_buf()));
    }
    let frames: Vec<ObjectFrame> = read_json(path)?;
    info!(path = %path.display(), frames = frames.len(), "Loaded object log");
    Ok(frames)
}

/// Persist the object log.
pub fn save_object_log(path: impl AsRef<Path>, frames: &[ObjectFrame]) -> FocusResult<()> {
    write_json(path.as_ref(), &frames)
}

/// Persist the selected focus windows (already sorted, at most top-K).
pub fn save_focus_results(path: impl AsRef<Path>, records: &[FocusRecord]) -> FocusResult<()> {
    write_json(path.as_ref(), &records)
}

/// Load a focus result artifact.
pub fn load_focus_results(path: impl AsRef<Path>) -> FocusResult<Vec<FocusRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FocusError::NotFound(path.to_path_buf()));
    }
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> FocusResult<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| FocusError::invalid_log(path, e.to_string()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> FocusResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    debug!(path = %path.display(), "Wrote artifact");
    Ok(())
}
