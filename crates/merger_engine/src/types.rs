use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use bytes::Bytes;
use merger_core::{FileDescriptor, MergeError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub descriptor: FileDescriptor,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedArtifact {
    pub bytes: Bytes,
    pub suggested_name: String,
    pub media_type: String,
}

/// Accounts for job buffers while they are alive; the count drops on `Drop`.
#[derive(Debug)]
pub struct BufferLease {
    counter: Arc<AtomicU64>,
    bytes: u64,
}

impl BufferLease {
    pub fn acquire(counter: &Arc<AtomicU64>, bytes: u64) -> Self {
        counter.fetch_add(bytes, Ordering::SeqCst);
        Self {
            counter: Arc::clone(counter),
            bytes,
        }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        self.counter.fetch_sub(self.bytes, Ordering::SeqCst);
    }
}

/// Ordered inputs handed to a merge engine. Ownership moves into the call.
#[derive(Debug)]
pub struct MergeRequest {
    names: Vec<String>,
    contents: Vec<Bytes>,
    _lease: Option<BufferLease>,
}

impl MergeRequest {
    pub fn new(names: Vec<String>, contents: Vec<Bytes>) -> Self {
        Self {
            names,
            contents,
            _lease: None,
        }
    }

    pub(crate) fn from_loaded(files: Vec<LoadedFile>, lease: BufferLease) -> Self {
        let (names, contents) = files
            .into_iter()
            .map(|file| (file.descriptor.name, file.bytes))
            .unzip();
        Self {
            names,
            contents,
            _lease: Some(lease),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contents(&self) -> &[Bytes] {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.contents.iter().map(|c| c.len() as u64).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.names.iter().map(String::as_str).zip(self.contents.iter())
    }
}

#[derive(Debug, Error)]
pub enum EngineFailure {
    #[error("merge entry point is not exported")]
    EntryPointMissing,
    #[error("engine not loaded: {0}")]
    NotLoaded(String),
    #[error("{0}")]
    Rejected(String),
    #[error("cancelled")]
    Cancelled,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EngineFailure> for MergeError {
    fn from(failure: EngineFailure) -> Self {
        match failure {
            EngineFailure::Cancelled => MergeError::Cancelled,
            other => MergeError::MergeEngine {
                cause: other.to_string(),
            },
        }
    }
}
