use crate::{JobId, MergeError, Selection, SelectionError};

/// Readiness of both external engines, queried right before a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineReadiness {
    pub codec_ready: bool,
    pub merge_entry_point: bool,
}

impl EngineReadiness {
    pub fn ready() -> Self {
        Self {
            codec_ready: true,
            merge_entry_point: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Caller began choosing a new set of files.
    SelectionStarted,
    /// Outcome of running the validator on the raw selection.
    SelectionValidated(Result<Selection, SelectionError>),
    /// Caller asked to merge the last successful selection.
    MergeRequested { readiness: EngineReadiness },
    /// Every file of the job was read.
    FilesLoaded { job_id: JobId },
    LoadFailed { job_id: JobId, error: MergeError },
    /// Raw percentage reported by the merge engine.
    MergeProgress { job_id: JobId, percentage: f64 },
    MergeSucceeded { job_id: JobId },
    /// The job ended without a result, including when its caller went away.
    MergeFailed { job_id: JobId, error: MergeError },
}
