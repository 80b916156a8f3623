use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::{EngineFailure, MergeRequest};

/// Codec engine loaded once per process; the orchestrator only queries it.
#[async_trait::async_trait]
pub trait CodecEngine: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Resolves once the engine finished loading, or reports why it could not.
    async fn when_ready(&self) -> Result<(), EngineFailure>;
}

/// Receives raw percentages from a merge engine while a call is running.
pub trait MergeProgress: Send + Sync {
    fn report(&self, percentage: f64);
}

/// Bridge to the external merge engine's single entry point.
#[async_trait::async_trait]
pub trait MergeEngine: Send + Sync {
    fn entry_point_available(&self) -> bool;

    async fn when_ready(&self) -> Result<(), EngineFailure> {
        if self.entry_point_available() {
            Ok(())
        } else {
            Err(EngineFailure::EntryPointMissing)
        }
    }

    /// Binds the ordered inputs into one output buffer.
    ///
    /// Implementations should stop promptly once `cancel` fires.
    async fn merge(
        &self,
        request: MergeRequest,
        progress: &dyn MergeProgress,
        cancel: CancellationToken,
    ) -> Result<Bytes, EngineFailure>;
}
