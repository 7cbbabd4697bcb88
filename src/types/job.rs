use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::video_info::{FormatType, Quality, VideoInfo};

/// Opaque identifier for a backend download job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One progress sample for a running job. All display fields are kept as
/// preformatted strings; a later sample always replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub percent: f64,
    pub speed: String,
    pub eta: String,
    pub downloaded: String,
    pub total: String,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            percent: 0.0,
            speed: "--".to_string(),
            eta: "--".to_string(),
            downloaded: "--".to_string(),
            total: "--".to_string(),
        }
    }
}

/// Everything needed to start a download job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: Quality,
    pub format_type: FormatType,
    /// Optional trim bounds as strict "HH:MM:SS" strings.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Events pushed from worker threads to the UI. Job-scoped events carry
/// the job id they belong to; the session drops events for stale jobs.
#[derive(Debug, Clone)]
pub enum AppEvent {
    InfoFetched(VideoInfo),
    InfoFailed(String),
    /// Raw image bytes for the current video's thumbnail.
    Thumbnail(Vec<u8>),
    Progress(JobId, Progress),
    /// Post-download processing status line (merge, audio extraction).
    Processing(JobId, String),
    /// Terminal success, with the output file name.
    Completed(JobId, String),
    /// Terminal failure, with a user-facing message.
    Failed(JobId, String),
}
