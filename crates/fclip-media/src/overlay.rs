//! Burned-in focus annotation.

use fclip_models::FocusRecord;

const DEFAULT_EMOTION_TEXT: &str = "Neutral";
const DEFAULT_OBJECT_TEXT: &str = "Object";

/// Upper-case the first character, lower-case the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Escape colons and spaces for the drawtext `text` option.
pub fn escape_drawtext(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == ':' || c == ' ' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Annotation text, escaped for drawtext.
pub fn overlay_text(record: &FocusRecord) -> String {
    let emotion = match capitalize(record.emotion.as_str()) {
        e if e.is_empty() => DEFAULT_EMOTION_TEXT.to_string(),
        e => e,
    };
    let object = record
        .object
        .as_deref()
        .filter(|o| !o.is_empty())
        .map(capitalize)
        .unwrap_or_else(|| DEFAULT_OBJECT_TEXT.to_string());

    format!(
        "Focus\\: {} on {} (score\\: {:.2})",
        escape_drawtext(&emotion),
        escape_drawtext(&object),
        record.score
    )
}

/// Full drawtext filter: red 24px text in the bottom-left corner.
pub fn build_drawtext(record: &FocusRecord) -> String {
    format!(
        "drawtext=text='{}':fontcolor=red:fontsize=24:x=10:y=H-th-10",
        overlay_text(record)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fclip_models::Emotion;

    fn record(emotion: Emotion, object: Option<&str>, score: f64) -> FocusRecord {
        FocusRecord {
            start: 10.0,
            emotion,
            object: object.map(String::from),
            score,
            attention_avg: 0.0,
            emotion_score: 0.0,
            object_score: 0.0,
            window: 10,
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("happy"), "Happy");
        assert_eq!(capitalize("CELL PHONE"), "Cell phone");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_overlay_text() {
        let text = overlay_text(&record(Emotion::Happy, Some("cup"), 3.456));
        assert_eq!(text, "Focus\\: Happy on Cup (score\\: 3.46)");
    }

    #[test]
    fn test_overlay_defaults_and_spaces() {
        let text = overlay_text(&record(Emotion::Surprise, None, 1.0));
        assert_eq!(text, "Focus\\: Surprise on Object (score\\: 1.00)");

        let text = overlay_text(&record(Emotion::Sad, Some("cell phone"), 2.0));
        assert!(text.contains("Cell\\ phone"));
    }

    #[test]
    fn test_build_drawtext() {
        let filter = build_drawtext(&record(Emotion::Neutral, Some("tv"), 0.5));
        assert!(filter.starts_with("drawtext=text='Focus\\: Neutral on Tv"));
        assert!(filter.ends_with(":fontcolor=red:fontsize=24:x=10:y=H-th-10"));
    }
}
