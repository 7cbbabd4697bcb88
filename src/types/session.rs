use crate::types::job::{AppEvent, JobId, Progress};
use crate::types::trim::TrimSelector;
use crate::types::video_info::{FormatType, Quality, VideoInfo};

/// Which sections of the panel are visible. Exactly one state is active;
/// the render function maps it to sections instead of toggling visibility
/// piecemeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    InfoLoaded,
    Downloading,
    Complete,
    Error,
}

/// The whole mutable state of one download flow, created on startup and
/// returned to its initial state by `reset()`. Mutated only through the
/// methods here, the trim selector's operations, and the fetch/download
/// handlers in the UI layer.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub url: String,
    pub format_type: FormatType,
    pub quality: Quality,
    pub info: Option<VideoInfo>,
    pub trim: TrimSelector,
    pub start_time_text: String,
    pub end_time_text: String,
    pub show_manual_inputs: bool,
    /// A fetch is outstanding; the trigger button is disabled meanwhile.
    pub fetching: bool,
    pub job_id: Option<JobId>,
    pub progress: Option<Progress>,
    pub status_line: String,
    pub finished_file: Option<String>,
    pub error: Option<String>,
    pub view: ViewState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the initial state: inputs cleared, quality and format back
    /// to defaults, selection and job state dropped.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn show_error(&mut self, message: String) {
        self.error = Some(message);
        self.fetching = false;
        self.view = ViewState::Error;
    }

    pub fn begin_download(&mut self, job: JobId) {
        self.job_id = Some(job);
        self.progress = Some(Progress::default());
        self.status_line = "Starting download...".to_string();
        self.finished_file = None;
        self.view = ViewState::Downloading;
    }

    fn is_current_job(&self, job: &JobId) -> bool {
        self.job_id.as_ref() == Some(job)
    }

    /// Apply one pushed event. Job-scoped events are keyed by id and
    /// dropped when they belong to a job this session is no longer
    /// tracking; within a job they are applied unconditionally, a later
    /// event always overwriting the displayed state.
    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::InfoFetched(info) => {
                self.fetching = false;
                self.trim.initialize(info.duration_seconds);
                self.start_time_text.clear();
                self.end_time_text.clear();
                self.info = Some(info);
                self.view = ViewState::InfoLoaded;
            }
            AppEvent::InfoFailed(message) => {
                self.show_error(message);
            }
            // Image bytes are consumed by the UI layer's texture loader.
            AppEvent::Thumbnail(_) => {}
            AppEvent::Progress(job, progress) => {
                if self.is_current_job(&job) {
                    self.status_line = format!(
                        "Downloading... {} / {}",
                        progress.downloaded, progress.total
                    );
                    self.progress = Some(progress);
                } else {
                    log::debug!("dropping progress for stale job {job}");
                }
            }
            AppEvent::Processing(job, message) => {
                if self.is_current_job(&job) {
                    self.status_line = message;
                    self.progress.get_or_insert_with(Progress::default).percent = 100.0;
                }
            }
            AppEvent::Completed(job, filename) => {
                if self.is_current_job(&job) {
                    self.finished_file = Some(filename);
                    self.view = ViewState::Complete;
                }
            }
            AppEvent::Failed(job, message) => {
                if self.is_current_job(&job) {
                    self.show_error(message);
                }
            }
        }
    }
}
