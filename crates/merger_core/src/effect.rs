use crate::{FileDescriptor, JobId, MergeError, ProgressEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A selection attempt was refused because a job is running.
    SelectionRefused { active: JobId },
    /// The previous job's artifact must no longer be offered.
    DiscardArtifact,
    /// A merge request failed its preconditions; no job was started.
    MergeRejected(MergeError),
    PublishProgress(ProgressEvent),
    LoadFiles {
        job_id: JobId,
        descriptors: Vec<FileDescriptor>,
    },
    InvokeMerge { job_id: JobId },
    JobCompleted { job_id: JobId },
    JobFailed { job_id: JobId, error: MergeError },
}
