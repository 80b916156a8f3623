use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, PoisonError,
};

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::MergedArtifact;

pub const ARTIFACT_SCHEME: &str = "artifact";

/// Retrievable reference to a packaged artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadHandle {
    pub id: u64,
    /// `artifact://<id>/<name>`
    pub uri: String,
    pub name: String,
    pub media_type: String,
    pub len: u64,
    /// Lowercase hex SHA-256 of the artifact bytes.
    pub sha256: String,
}

/// Ephemeral artifact store: each `package` call registers a new handle.
#[derive(Debug, Default)]
pub struct ResultPackager {
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, Bytes>>,
}

impl ResultPackager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(&self, artifact: &MergedArtifact) -> DownloadHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, artifact.bytes.clone());
        DownloadHandle {
            id,
            uri: format!("{ARTIFACT_SCHEME}://{id}/{}", artifact.suggested_name),
            name: artifact.suggested_name.clone(),
            media_type: artifact.media_type.clone(),
            len: artifact.bytes.len() as u64,
            sha256: sha256_hex(&artifact.bytes),
        }
    }

    pub fn open(&self, handle: &DownloadHandle) -> Option<Bytes> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle.id)
            .cloned()
    }

    /// Drops the stored bytes; returns false if the handle was already revoked.
    pub fn revoke(&self, handle: &DownloadHandle) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.id)
            .is_some()
    }

    pub fn live_handles(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
