//! Analysis request body.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request does not name a source video URL")]
    MissingVideoUrl,
}

/// Request to analyze a recorded viewing session.
///
/// Clients send the source URL under several historical field names; they are
/// checked in declaration order by [`AnalysisRequest::video_url`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub task_id: Option<TaskId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl AnalysisRequest {
    /// Resolve the source URL: first non-blank of `video_url`, `youtube_url`,
    /// `url`, `link`.
    pub fn video_url(&self) -> Result<&str, RequestError> {
        [&self.video_url, &self.youtube_url, &self.url, &self.link]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|value| !value.is_empty())
            .ok_or(RequestError::MissingVideoUrl)
    }

    /// Task ID from the request, or a freshly generated one.
    pub fn task_id_or_new(&self) -> TaskId {
        self.task_id.clone().unwrap_or_default()
    }
}
