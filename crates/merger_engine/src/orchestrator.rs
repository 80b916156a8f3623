use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use bytes::Bytes;
use merger_core::{
    update, validate_with, AppState, AppViewModel, Effect, EngineKind, EngineReadiness,
    FileDescriptor, JobId, JobStatus, MergeError, Msg, RawFileHandle, Selection, SelectionError,
};
use merger_logging::{merger_debug, merger_error, merger_info, merger_warn};
use tokio_util::sync::CancellationToken;

use crate::loader::load;
use crate::progress::ListenerSet;
use crate::{
    BufferLease, CodecEngine, ContentSource, DownloadHandle, MergeEngine, MergeProgress,
    MergeRequest, MergedArtifact, MergerConfig, ProgressListener, ResultPackager,
};

/// Owns the single merge job and drives it through the core state machine.
///
/// Progress listeners run on the reporting task and must not call back into
/// `select_files` or `start_merge`.
pub struct Merger {
    config: MergerConfig,
    source: Arc<dyn ContentSource>,
    codec: Arc<dyn CodecEngine>,
    engine: Arc<dyn MergeEngine>,
    state: Mutex<AppState>,
    // Serializes dispatch so listeners observe events in state order.
    delivery: Mutex<()>,
    listeners: ListenerSet,
    cancel: Mutex<Option<CancellationToken>>,
    artifact: Mutex<Option<DownloadHandle>>,
    packager: ResultPackager,
    resident: Arc<AtomicU64>,
}

impl Merger {
    pub fn new(
        config: MergerConfig,
        source: Arc<dyn ContentSource>,
        codec: Arc<dyn CodecEngine>,
        engine: Arc<dyn MergeEngine>,
    ) -> Self {
        Self {
            config,
            source,
            codec,
            engine,
            state: Mutex::new(AppState::new()),
            delivery: Mutex::new(()),
            listeners: ListenerSet::default(),
            cancel: Mutex::new(None),
            artifact: Mutex::new(None),
            packager: ResultPackager::new(),
            resident: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &MergerConfig {
        &self.config
    }

    /// Awaits both external engines.
    pub async fn wait_until_ready(&self) -> Result<(), MergeError> {
        if let Err(err) = self.codec.when_ready().await {
            merger_error!("Codec engine failed to load: {}", err);
            return Err(MergeError::EngineNotReady {
                engine: EngineKind::Codec,
            });
        }
        if let Err(err) = self.engine.when_ready().await {
            merger_error!("Merge engine failed to load: {}", err);
            return Err(MergeError::EngineNotReady {
                engine: EngineKind::MergeBridge,
            });
        }
        Ok(())
    }

    pub fn on_progress(&self, listener: impl ProgressListener + 'static) {
        self.listeners.add(Arc::new(listener));
    }

    /// Validates a new selection; refused while a job is loading or merging.
    pub fn select_files(&self, raw: &[RawFileHandle]) -> Result<Selection, SelectionError> {
        for effect in self.dispatch(Msg::SelectionStarted) {
            if let Effect::SelectionRefused { active } = effect {
                merger_warn!("Selection refused while job {} is active", active);
                return Err(SelectionError::JobActive { active });
            }
        }

        let result = validate_with(raw, self.config.name_order());
        match &result {
            Ok(selection) => merger_info!(
                "Selection accepted {} video file(s), rejected {}",
                selection.descriptors().len(),
                selection.rejected().len()
            ),
            Err(err) => merger_warn!("Selection rejected: {}", err),
        }
        self.dispatch(Msg::SelectionValidated(result.clone()));
        result
    }

    /// Loads and merges the last successful selection.
    pub async fn start_merge(&self) -> Result<MergedArtifact, MergeError> {
        let readiness = EngineReadiness {
            codec_ready: self.codec.is_ready(),
            merge_entry_point: self.engine.entry_point_available(),
        };

        let mut job = None;
        for effect in self.dispatch(Msg::MergeRequested { readiness }) {
            match effect {
                Effect::MergeRejected(error) => {
                    merger_warn!("Merge request rejected: {}", error);
                    return Err(error);
                }
                Effect::LoadFiles {
                    job_id,
                    descriptors,
                } => job = Some((job_id, descriptors)),
                _ => {}
            }
        }
        let (job_id, descriptors) = job.ok_or(MergeError::EmptySelection)?;
        let _guard = JobGuard {
            merger: self,
            job_id,
        };

        let cancel = lock(&self.cancel)
            .clone()
            .ok_or(MergeError::Cancelled)?;
        self.run_job(job_id, descriptors, &cancel).await
    }

    /// Cancels the active job, if any.
    pub fn cancel(&self) -> bool {
        match lock(&self.cancel).as_ref() {
            Some(token) => {
                merger_info!("Cancelling active merge job");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Handle for the last successful job; cleared by a new selection.
    pub fn artifact(&self) -> Option<DownloadHandle> {
        lock(&self.artifact).clone()
    }

    pub fn open_artifact(&self, handle: &DownloadHandle) -> Option<Bytes> {
        self.packager.open(handle)
    }

    pub fn packager(&self) -> &ResultPackager {
        &self.packager
    }

    pub fn status(&self) -> JobStatus {
        lock(&self.state).status()
    }

    pub fn view(&self) -> AppViewModel {
        lock(&self.state).view()
    }

    /// Bytes of loaded input still held by the current job or its engine call.
    pub fn resident_bytes(&self) -> u64 {
        self.resident.load(Ordering::SeqCst)
    }

    async fn run_job(
        &self,
        job_id: JobId,
        descriptors: Vec<FileDescriptor>,
        cancel: &CancellationToken,
    ) -> Result<MergedArtifact, MergeError> {
        merger_info!("Job {} started with {} file(s)", job_id, descriptors.len());

        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MergeError::Cancelled),
            result = load(self.source.as_ref(), &descriptors, self.config.max_concurrent_reads) => {
                result.map_err(|err| MergeError::Load {
                    name: err.descriptor.name.clone(),
                    cause: err.cause.to_string(),
                })
            }
        };
        let files = match loaded {
            Ok(files) => files,
            Err(error) => {
                self.dispatch(Msg::LoadFailed {
                    job_id,
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        merger_debug!("Job {} loaded {} file(s)", job_id, files.len());
        let bytes: u64 = files.iter().map(|file| file.bytes.len() as u64).sum();
        let request = MergeRequest::from_loaded(files, BufferLease::acquire(&self.resident, bytes));
        let invoke = self
            .dispatch(Msg::FilesLoaded { job_id })
            .into_iter()
            .any(|effect| matches!(effect, Effect::InvokeMerge { .. }));
        if !invoke {
            return Err(MergeError::Cancelled);
        }

        let reporter = JobReporter {
            merger: self,
            job_id,
        };
        let outcome = self.invoke_engine(request, &reporter, cancel).await;

        match outcome {
            Ok(merged) => {
                let artifact = MergedArtifact {
                    bytes: merged,
                    suggested_name: self.config.artifact_name.clone(),
                    media_type: self.config.artifact_media_type.clone(),
                };
                let handle = self.packager.package(&artifact);
                if let Some(previous) = lock(&self.artifact).replace(handle) {
                    self.packager.revoke(&previous);
                }
                merger_debug!(
                    "Job {} packaged {} bytes as {}",
                    job_id,
                    artifact.bytes.len(),
                    artifact.suggested_name
                );
                self.dispatch(Msg::MergeSucceeded { job_id });
                Ok(artifact)
            }
            Err(error) => {
                self.dispatch(Msg::MergeFailed {
                    job_id,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    async fn invoke_engine(
        &self,
        request: MergeRequest,
        reporter: &JobReporter<'_>,
        cancel: &CancellationToken,
    ) -> Result<Bytes, MergeError> {
        let call = self.engine.merge(request, reporter, cancel.clone());
        match self.config.merge_timeout() {
            Some(after) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(MergeError::Cancelled),
                result = tokio::time::timeout(after, call) => match result {
                    Ok(result) => result.map_err(MergeError::from),
                    Err(_) => {
                        cancel.cancel();
                        Err(MergeError::MergeTimeout { after })
                    }
                },
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(MergeError::Cancelled),
                result = call => result.map_err(MergeError::from),
            },
        }
    }

    fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let _delivery = lock(&self.delivery);
        let effects = {
            let mut guard = lock(&self.state);
            let state = std::mem::take(&mut *guard);
            let (state, effects) = update(state, msg);
            *guard = state;
            // Stored under the state lock so an active job always has a token.
            if effects
                .iter()
                .any(|effect| matches!(effect, Effect::LoadFiles { .. }))
            {
                *lock(&self.cancel) = Some(CancellationToken::new());
            }
            effects
        };

        let mut remaining = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::PublishProgress(event) => {
                    merger_debug!("Progress {:.2}% {}", event.percentage, event.message);
                    self.listeners.publish(&event);
                }
                Effect::DiscardArtifact => {
                    if let Some(handle) = lock(&self.artifact).take() {
                        self.packager.revoke(&handle);
                    }
                }
                Effect::JobCompleted { job_id } => {
                    merger_info!("Job {} complete", job_id);
                }
                Effect::JobFailed { job_id, error } => {
                    merger_warn!("Job {} failed: {}", job_id, error);
                    // Stops engine work that may outlive the job.
                    if let Some(token) = lock(&self.cancel).as_ref() {
                        token.cancel();
                    }
                }
                other => remaining.push(other),
            }
        }
        remaining
    }
}

/// Fails the job if `start_merge` is dropped while it is still active, and
/// releases its cancel token either way.
struct JobGuard<'a> {
    merger: &'a Merger,
    job_id: JobId,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        let abandoned = lock(&self.merger.state).active_job() == Some(self.job_id);
        if abandoned {
            merger_warn!("Job {} abandoned by its caller", self.job_id);
            self.merger.dispatch(Msg::MergeFailed {
                job_id: self.job_id,
                error: MergeError::Cancelled,
            });
        }
        lock(&self.merger.cancel).take();
    }
}

struct JobReporter<'a> {
    merger: &'a Merger,
    job_id: JobId,
}

impl MergeProgress for JobReporter<'_> {
    fn report(&self, percentage: f64) {
        self.merger.dispatch(Msg::MergeProgress {
            job_id: self.job_id,
            percentage,
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
