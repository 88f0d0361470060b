//! Task records and the request/result types that flow through them

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle states of a download task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// The stream roles a task reports progress for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamRole {
    Video,
    Audio,
}

/// Latest observed progress for one stream role
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamProgress {
    /// Percent complete, 0-100 (degenerate values possible when the
    /// upstream total is unknown)
    pub percent: f64,
    /// Bytes per second
    pub speed: f64,
}

/// What a caller submits to start a download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,

    /// Presented title; becomes the artifact name after sanitization
    #[serde(default)]
    pub title: Option<String>,

    /// Video format selector, or an already-combined format
    pub video_format: String,

    /// Separate audio-only selector; absent for combined formats
    #[serde(default)]
    pub audio_format: Option<String>,

    /// Opaque display label recorded in history, not validated
    #[serde(default)]
    pub quality_label: Option<String>,

    /// Opaque language label recorded in history, not validated
    #[serde(default)]
    pub language: Option<String>,
}

/// Final artifact description for a completed task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOutcome {
    pub filename: String,
    pub file_size: u64,
    /// Stable retrieval path under the download root
    pub download_url: String,
}

/// Point-in-time view of one task, as seen by the polling path
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub status: TaskStatus,
    pub progress: HashMap<StreamRole, StreamProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DownloadOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
