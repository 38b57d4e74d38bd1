//! Signal fusion for focus-window highlight selection.
//!
//! This crate provides:
//! - Loading of the affect (CSV) and object (JSON) signal logs
//! - Nearest-timestamp association between the two streams
//! - Sliding-window composite scoring
//! - Top-K highlight selection
//! - Focus result artifact I/O

pub mod association;
pub mod config;
pub mod error;
pub mod logs;
pub mod scorer;
pub mod selector;

pub use association::{associate, nearest_object_frame};
pub use config::WindowConfig;
pub use error::{FocusError, FocusResult};
pub use logs::{
    attention_from_str, load_affect_log, load_focus_results, load_object_log, save_focus_results,
    save_object_log, AffectLog,
};
pub use scorer::{analyze_focus, score_windows};
pub use selector::select_top_k;
