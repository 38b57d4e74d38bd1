//! Task artifact paths and completion polling.
//!
//! Every task owns `<output_dir>/<task_id>/`. The completion marker
//! `done.flag` in that directory is the success contract; `status.json`
//! next to it carries the structured state. Polling never reports success
//! without the marker and falls back to `Processing` when nothing can be read.

use std::path::{Path, PathBuf};

use tracing::debug;

use fclip_models::{TaskId, TaskState, TaskStatus};

use crate::error::WorkerResult;

pub const MARKER_FILE: &str = "done.flag";
pub const MARKER_CONTENT: &str = "completed";
pub const STATUS_FILE: &str = "status.json";

/// Clip directory for a task.
pub fn task_output_dir(output_dir: &Path, task_id: &TaskId) -> PathBuf {
    output_dir.join(task_id.as_str())
}

pub fn marker_path(output_dir: &Path, task_id: &TaskId) -> PathBuf {
    task_output_dir(output_dir, task_id).join(MARKER_FILE)
}

pub fn status_path(output_dir: &Path, task_id: &TaskId) -> PathBuf {
    task_output_dir(output_dir, task_id).join(STATUS_FILE)
}

/// Write the completion marker.
pub async fn write_marker(output_dir: &Path, task_id: &TaskId) -> WorkerResult<PathBuf> {
    let path = marker_path(output_dir, task_id);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, MARKER_CONTENT).await?;
    Ok(path)
}

/// Whether the task finished successfully.
pub fn is_completed(output_dir: &Path, task_id: &TaskId) -> bool {
    marker_path(output_dir, task_id).exists()
}

/// Read the status record; `None` when absent or unreadable.
pub fn read_status(output_dir: &Path, task_id: &TaskId) -> Option<TaskStatus> {
    let path = status_path(output_dir, task_id);
    let content = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(status) => Some(status),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Unreadable status record");
            None
        }
    }
}

/// Current state of a task.
pub fn poll_status(output_dir: &Path, task_id: &TaskId) -> TaskState {
    if is_completed(output_dir, task_id) {
        return TaskState::Completed;
    }
    match read_status(output_dir, task_id) {
        // A completed record without its marker is not trusted
        Some(status) if status.state != TaskState::Completed => status.state,
        _ => TaskState::Processing,
    }
}

/// Progress percentage: 100 once completed, else the last recorded value.
pub fn get_progress(output_dir: &Path, task_id: &TaskId) -> u8 {
    if is_completed(output_dir, task_id) {
        return 100;
    }
    read_status(output_dir, task_id)
        .map(|status| status.progress.min(100))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_status(dir: &Path, status: &TaskStatus) {
        let path = status_path(dir, &status.task_id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string(status).unwrap()).unwrap();
    }

    #[test]
    fn test_unknown_task_is_processing() {
        let dir = tempfile::tempdir().unwrap();
        let task = TaskId::from("never-seen");

        assert!(!is_completed(dir.path(), &task));
        assert_eq!(poll_status(dir.path(), &task), TaskState::Processing);
        assert_eq!(get_progress(dir.path(), &task), 0);
    }

    #[test]
    fn test_marker_means_completed() {
        let dir = tempfile::tempdir().unwrap();
        let task = TaskId::from("task-done");

        let marker = tokio_test::block_on(write_marker(dir.path(), &task)).unwrap();
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "completed");
        assert!(is_completed(dir.path(), &task));
        assert_eq!(poll_status(dir.path(), &task), TaskState::Completed);
        assert_eq!(get_progress(dir.path(), &task), 100);
    }

    #[test]
    fn test_recorded_status_used() {
        let dir = tempfile::tempdir().unwrap();
        let mut status = TaskStatus::new(TaskId::from("task-running"));
        status.set_progress(40, Some("Scoring".into()));
        write_status(dir.path(), &status);

        assert_eq!(poll_status(dir.path(), &status.task_id), TaskState::Processing);
        assert_eq!(get_progress(dir.path(), &status.task_id), 40);

        status.fail("empty affect stream");
        write_status(dir.path(), &status);
        assert_eq!(poll_status(dir.path(), &status.task_id), TaskState::Failed);
    }

    #[test]
    fn test_completed_record_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut status = TaskStatus::new(TaskId::from("task-partial"));
        status.complete(3, 3);
        write_status(dir.path(), &status);

        assert_eq!(poll_status(dir.path(), &status.task_id), TaskState::Processing);
    }

    #[test]
    fn test_corrupt_status_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let task = TaskId::from("task-corrupt");
        let path = status_path(dir.path(), &task);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        assert_eq!(poll_status(dir.path(), &task), TaskState::Processing);
        assert_eq!(get_progress(dir.path(), &task), 0);
    }
}
