//! Highlight selection.

use fclip_models::FocusWindow;

/// Keep the `top_k` highest-scoring windows.
///
/// Stable sort, so equal scores keep emission order (earlier start first).
/// Overlapping windows are not merged or suppressed.
pub fn select_top_k(mut windows: Vec<FocusWindow>, top_k: usize) -> Vec<FocusWindow> {
    windows.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    windows.truncate(top_k);
    windows
}
