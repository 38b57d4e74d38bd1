//! Progress reporting sinks.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use fclip_models::{TaskId, TaskStatus};

use crate::error::WorkerResult;
use crate::status::status_path;

/// Receives coarse task progress.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Report a checkpoint (0-100) and the step that follows it.
    async fn progress(&self, task_id: &TaskId, value: u8, step: &str) -> WorkerResult<()>;

    /// Every stage succeeded; the marker is written after this returns.
    async fn completed(&self, task_id: &TaskId, clips_requested: u32, clips_rendered: u32) -> WorkerResult<()>;

    /// The run aborted.
    async fn failed(&self, task_id: &TaskId, message: &str) -> WorkerResult<()>;
}

/// Persists a [`TaskStatus`] as `<output_dir>/<task_id>/status.json`.
pub struct StatusFileSink {
    output_dir: PathBuf,
    // One record per task; writes are serialized
    current: Mutex<Option<TaskStatus>>,
}

impl StatusFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            current: Mutex::new(None),
        }
    }

    async fn update<F>(&self, task_id: &TaskId, apply: F) -> WorkerResult<()>
    where
        F: FnOnce(&mut TaskStatus) + Send,
    {
        let mut guard = self.current.lock().await;
        if guard.as_ref().is_some_and(|s| &s.task_id != task_id) {
            *guard = None;
        }
        let status = guard.get_or_insert_with(|| TaskStatus::new(task_id.clone()));
        apply(status);

        let path = status_path(&self.output_dir, task_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write then rename so pollers never see a half-written record
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&*status)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), state = %status.state, progress = status.progress, "Status written");
        Ok(())
    }
}

#[async_trait]
impl ProgressSink for StatusFileSink {
    async fn progress(&self, task_id: &TaskId, value: u8, step: &str) -> WorkerResult<()> {
        let step = step.to_string();
        self.update(task_id, move |s| s.set_progress(value, Some(step))).await
    }

    async fn completed(&self, task_id: &TaskId, clips_requested: u32, clips_rendered: u32) -> WorkerResult<()> {
        self.update(task_id, move |s| s.complete(clips_requested, clips_rendered))
            .await
    }

    async fn failed(&self, task_id: &TaskId, message: &str) -> WorkerResult<()> {
        let message = message.to_string();
        self.update(task_id, move |s| s.fail(message)).await
    }
}

/// Logs progress through `tracing` only.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

#[async_trait]
impl ProgressSink for TracingSink {
    async fn progress(&self, task_id: &TaskId, value: u8, step: &str) -> WorkerResult<()> {
        info!(task_id = %task_id, progress = value, step, "Task progress");
        Ok(())
    }

    async fn completed(&self, task_id: &TaskId, clips_requested: u32, clips_rendered: u32) -> WorkerResult<()> {
        info!(task_id = %task_id, clips_requested, clips_rendered, "Task completed");
        Ok(())
    }

    async fn failed(&self, task_id: &TaskId, message: &str) -> WorkerResult<()> {
        warn!(task_id = %task_id, error = message, "Task failed");
        Ok(())
    }
}

/// Forwards only non-decreasing values per task, clamped to 100.
pub struct MonotonicProgress<S> {
    inner: S,
    last: Mutex<HashMap<TaskId, u8>>,
}

impl<S: ProgressSink> MonotonicProgress<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: Mutex::new(HashMap::new()),
        }
    }

    /// Highest value forwarded for `task_id` (0 when none).
    pub async fn last(&self, task_id: &TaskId) -> u8 {
        self.last.lock().await.get(task_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl<S: ProgressSink> ProgressSink for MonotonicProgress<S> {
    async fn progress(&self, task_id: &TaskId, value: u8, step: &str) -> WorkerResult<()> {
        let value = value.min(100);
        {
            let mut last = self.last.lock().await;
            let previous = last.get(task_id).copied().unwrap_or(0);
            if value < previous {
                debug!(task_id = %task_id, value, previous, "Dropping regressive progress");
                return Ok(());
            }
            last.insert(task_id.clone(), value);
        }
        self.inner.progress(task_id, value, step).await
    }

    async fn completed(&self, task_id: &TaskId, clips_requested: u32, clips_rendered: u32) -> WorkerResult<()> {
        self.last.lock().await.insert(task_id.clone(), 100);
        self.inner.completed(task_id, clips_requested, clips_rendered).await
    }

    async fn failed(&self, task_id: &TaskId, message: &str) -> WorkerResult<()> {
        self.inner.failed(task_id, message).await
    }
}

/// Fans every event out to several sinks; the first error is returned
/// after all sinks have been called.
#[derive(Default, Clone)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl ProgressSink for CompositeSink {
    async fn progress(&self, task_id: &TaskId, value: u8, step: &str) -> WorkerResult<()> {
        let mut result = Ok(());
        for sink in &self.sinks {
            if let Err(e) = sink.progress(task_id, value, step).await {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    async fn completed(&self, task_id: &TaskId, clips_requested: u32, clips_rendered: u32) -> WorkerResult<()> {
        let mut result = Ok(());
        for sink in &self.sinks {
            if let Err(e) = sink.completed(task_id, clips_requested, clips_rendered).await {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    async fn failed(&self, task_id: &TaskId, message: &str) -> WorkerResult<()> {
        let mut result = Ok(());
        for sink in &self.sinks {
            if let Err(e) = sink.failed(task_id, message).await {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fclip_models::TaskState;
    use std::sync::Mutex as StdMutex;

    use crate::status::{get_progress, poll_status, read_status};

    /// Records every progress value it receives.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub values: StdMutex<Vec<u8>>,
        pub completed: StdMutex<bool>,
        pub failures: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn progress(&self, _task_id: &TaskId, value: u8, _step: &str) -> WorkerResult<()> {
            self.values.lock().unwrap().push(value);
            Ok(())
        }

        async fn completed(&self, _task_id: &TaskId, _requested: u32, _rendered: u32) -> WorkerResult<()> {
            *self.completed.lock().unwrap() = true;
            Ok(())
        }

        async fn failed(&self, _task_id: &TaskId, message: &str) -> WorkerResult<()> {
            self.failures.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_monotonic_drops_regressions() {
        let sink = MonotonicProgress::new(RecordingSink::default());
        let task = TaskId::from("t");

        for value in [10, 30, 20, 30, 150, 40] {
            sink.progress(&task, value, "step").await.unwrap();
        }
        assert_eq!(*sink.inner.values.lock().unwrap(), vec![10, 30, 30, 100]);
        assert_eq!(sink.last(&task).await, 100);
    }

    #[tokio::test]
    async fn test_monotonic_tracks_tasks_separately() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MonotonicProgress::new(StatusFileSink::new(dir.path()));
        let first = TaskId::from("task-a");
        let second = TaskId::from("task-b");

        for value in [10, 30, 40, 70, 80, 100] {
            sink.progress(&first, value, "step").await.unwrap();
        }
        sink.completed(&first, 3, 3).await.unwrap();

        sink.progress(&second, 40, "Scoring focus windows").await.unwrap();
        assert_eq!(get_progress(dir.path(), &second), 40);
        assert_eq!(sink.last(&second).await, 40);
        assert_eq!(sink.last(&first).await, 100);

        sink.progress(&second, 10, "step").await.unwrap();
        assert_eq!(get_progress(dir.path(), &second), 40);
    }

    #[tokio::test]
    async fn test_status_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = StatusFileSink::new(dir.path());
        let task = TaskId::from("task-status");

        sink.progress(&task, 40, "Scoring focus windows").await.unwrap();
        let status = read_status(dir.path(), &task).unwrap();
        assert_eq!(status.state, TaskState::Processing);
        assert_eq!(status.current_step.as_deref(), Some("Scoring focus windows"));
        assert_eq!(get_progress(dir.path(), &task), 40);

        sink.failed(&task, "object log not found").await.unwrap();
        assert_eq!(poll_status(dir.path(), &task), TaskState::Failed);
        let status = read_status(dir.path(), &task).unwrap();
        assert_eq!(status.progress, 40);
        assert_eq!(status.error_message.as_deref(), Some("object log not found"));
    }

    #[tokio::test]
    async fn test_composite_fans_out() {
        let first = Arc::new(RecordingSink::default());
        let second = Arc::new(RecordingSink::default());
        let sink = CompositeSink::new()
            .with(first.clone())
            .with(second.clone())
            .with(Arc::new(TracingSink));
        let task = TaskId::from("t");

        sink.progress(&task, 10, "Detecting objects").await.unwrap();
        sink.completed(&task, 3, 2).await.unwrap();

        assert_eq!(*first.values.lock().unwrap(), vec![10]);
        assert_eq!(*second.values.lock().unwrap(), vec![10]);
        assert!(*second.completed.lock().unwrap());
    }
}
