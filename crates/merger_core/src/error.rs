use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::{JobId, RejectedEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Codec,
    MergeBridge,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Codec => write!(f, "codec engine"),
            EngineKind::MergeBridge => write!(f, "merge engine entry point"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no video files in selection ({} entries rejected)", .rejected.len())]
    EmptySelection { rejected: Vec<RejectedEntry> },
    #[error("job {active} is still running; selection is locked")]
    JobActive { active: JobId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("no video files to merge")]
    EmptySelection,
    #[error("{engine} is not ready")]
    EngineNotReady { engine: EngineKind },
    #[error("job {active} is already active")]
    JobAlreadyActive { active: JobId },
    #[error("failed to load {name}: {cause}")]
    Load { name: String, cause: String },
    #[error("merge engine failed: {cause}")]
    MergeEngine { cause: String },
    #[error("merge timed out after {after:?}")]
    MergeTimeout { after: Duration },
    #[error("merge cancelled")]
    Cancelled,
}
