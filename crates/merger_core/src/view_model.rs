use crate::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub status: JobStatus,
    pub files: Vec<String>,
    pub job_id: Option<JobId>,
    pub progress: f64,
    pub message: Option<String>,
    pub last_error: Option<String>,
}
