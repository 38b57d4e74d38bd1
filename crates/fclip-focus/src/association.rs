//! Nearest-timestamp association between the affect and object streams.

use fclip_models::{AffectFrame, ObjectFrame};

/// Find the object frame closest in time to `timestamp`.
///
/// Linear scan; the first frame at the minimal distance wins. No
/// interpolation between neighbours.
pub fn nearest_object_frame(objects: &[ObjectFrame], timestamp: f64) -> Option<&ObjectFrame> {
    let mut best: Option<(&ObjectFrame, f64)> = None;
    for frame in objects {
        let distance = (frame.timestamp - timestamp).abs();
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((frame, distance));
        }
    }
    best.map(|(frame, _)| frame)
}

/// Pair every affect frame with its nearest object frame.
pub fn associate<'a, 'b>(
    affect: &[&'a AffectFrame],
    objects: &'b [ObjectFrame],
) -> Vec<(&'a AffectFrame, Option<&'b ObjectFrame>)> {
    affect
        .iter()
        .map(|frame| (*frame, nearest_object_frame(objects, frame.timestamp)))
        .collect()
}
