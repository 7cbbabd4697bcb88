pub mod ytdlp;

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;

use crate::types::job::{AppEvent, DownloadRequest, JobId};
use crate::types::video_info::VideoInfo;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("could not read video metadata: {0}")]
    Metadata(String),
    #[error("thumbnail fetch failed: {0}")]
    Thumbnail(String),
}

/// Seam between the control panel and whatever actually fetches and
/// downloads media. `fetch_info` and `fetch_thumbnail` block and are
/// called from worker threads; `start_download` returns a job id right
/// away and streams the job's progress as `AppEvent`s on the given
/// channel, terminated by `Completed` or `Failed`.
pub trait Backend: Send + Sync {
    fn fetch_info(&self, url: &str) -> Result<VideoInfo, BackendError>;

    fn fetch_thumbnail(&self, url: &str) -> Result<Vec<u8>, BackendError>;

    fn start_download(
        &self,
        request: DownloadRequest,
        events: Sender<AppEvent>,
    ) -> Result<JobId, BackendError>;

    /// Local path of a finished job's artifact, if still available.
    fn artifact_path(&self, job: &JobId) -> Option<PathBuf>;
}
