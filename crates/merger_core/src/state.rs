use crate::view_model::AppViewModel;
use crate::{FileDescriptor, MergeError, ProgressTracker};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Selecting,
    Loading,
    Merging,
    Done,
    Failed,
}

impl JobStatus {
    /// Loading and Merging own an in-flight external call.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Loading | JobStatus::Merging)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    status: JobStatus,
    selection: Vec<FileDescriptor>,
    job_id: Option<JobId>,
    next_job_id: JobId,
    progress: ProgressTracker,
    message: Option<String>,
    last_error: Option<MergeError>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn selection(&self) -> &[FileDescriptor] {
        &self.selection
    }

    /// Id of the current or most recent job, cleared on a new selection.
    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    pub fn active_job(&self) -> Option<JobId> {
        if self.status.is_active() {
            self.job_id
        } else {
            None
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress.last()
    }

    pub fn last_error(&self) -> Option<&MergeError> {
        self.last_error.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            status: self.status,
            files: self.selection.iter().map(|d| d.name.clone()).collect(),
            job_id: self.job_id,
            progress: self.progress.last(),
            message: self.message.clone(),
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    pub(crate) fn is_current(&self, job_id: JobId) -> bool {
        self.job_id == Some(job_id)
    }

    pub(crate) fn begin_selection(&mut self) {
        self.status = JobStatus::Selecting;
        self.selection.clear();
        self.job_id = None;
        self.progress.reset();
        self.message = None;
        self.last_error = None;
    }

    pub(crate) fn set_selection(&mut self, descriptors: Vec<FileDescriptor>) {
        self.selection = descriptors;
        self.status = JobStatus::Idle;
    }

    pub(crate) fn start_job(&mut self) -> JobId {
        self.next_job_id += 1;
        let job_id = self.next_job_id;
        self.job_id = Some(job_id);
        self.status = JobStatus::Loading;
        self.progress.reset();
        self.last_error = None;
        job_id
    }

    pub(crate) fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub(crate) fn record_progress(&mut self, percentage: f64) -> Option<f64> {
        let published = self.progress.record(percentage)?;
        Some(published)
    }

    pub(crate) fn finish_job(&mut self) -> f64 {
        self.status = JobStatus::Done;
        self.progress.finish()
    }

    pub(crate) fn fail_job(&mut self, error: MergeError) {
        self.message = Some(format!("Error: {error}"));
        self.last_error = Some(error);
        self.status = JobStatus::Failed;
    }
}
