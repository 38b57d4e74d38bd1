//! Structured task status record.
//!
//! Written next to the rendered clips as `status.json`. Unlike the bare
//! completion marker it can tell "never started", "running" and "failed"
//! apart.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::TaskId;

/// Lifecycle state of an analysis task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    NotStarted,
    Processing,
    Completed,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::NotStarted => "not_started",
            TaskState::Processing => "processing",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }

    /// No more updates are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a task's progress.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskStatus {
    pub task_id: TaskId,
    pub state: TaskState,
    /// Progress percentage (0-100)
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default)]
    pub clips_requested: u32,
    #[serde(default)]
    pub clips_rendered: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskStatus {
    pub fn new(task_id: TaskId) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            state: TaskState::NotStarted,
            progress: 0,
            current_step: None,
            clips_requested: 0,
            clips_rendered: 0,
            error_message: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Record a progress checkpoint; also moves the task into `Processing`.
    pub fn set_progress(&mut self, progress: u8, step: Option<String>) {
        self.progress = progress.min(100);
        if !self.state.is_terminal() {
            self.state = TaskState::Processing;
        }
        if step.is_some() {
            self.current_step = step;
        }
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self, clips_requested: u32, clips_rendered: u32) {
        self.state = TaskState::Completed;
        self.progress = 100;
        self.current_step = Some("Complete".into());
        self.clips_requested = clips_requested;
        self.clips_rendered = clips_rendered;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = TaskState::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let mut status = TaskStatus::new(TaskId::from("task-1"));
        assert_eq!(status.state, TaskState::NotStarted);

        status.set_progress(40, Some("Scoring focus windows".into()));
        assert_eq!(status.state, TaskState::Processing);
        assert_eq!(status.progress, 40);

        status.complete(3, 2);
        assert!(status.state.is_terminal());
        assert_eq!(status.progress, 100);
        assert_eq!(status.clips_rendered, 2);
    }

    #[test]
    fn test_failed_state_sticks() {
        let mut status = TaskStatus::new(TaskId::from("task-2"));
        status.set_progress(10, None);
        status.fail("object log not found");
        status.set_progress(30, None);
        assert_eq!(status.state, TaskState::Failed);
        assert_eq!(status.error_message.as_deref(), Some("object log not found"));
    }

    #[test]
    fn test_status_json_roundtrip_state_name() {
        let status = TaskStatus::new(TaskId::from("task-3"));
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["state"], "not_started");
        assert_eq!(value["task_id"], "task-3");
    }
}
