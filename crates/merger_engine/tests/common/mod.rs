#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex, Once};

use bytes::Bytes;
use merger_core::{validate, FileDescriptor, ProgressEvent, RawFileHandle};
use merger_engine::{
    CodecEngine, ContentSource, EngineFailure, MergeEngine, MergeProgress, MergeRequest, Merger,
    MergerConfig, MemorySource,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(merger_logging::initialize_for_tests);
}

pub fn videos(names: &[&str]) -> Vec<RawFileHandle> {
    names
        .iter()
        .map(|name| RawFileHandle::new(*name, Some("video/mp4")))
        .collect()
}

pub fn descriptors(names: &[&str]) -> Vec<FileDescriptor> {
    validate(&videos(names)).unwrap().into_descriptors()
}

pub struct StaticCodec(pub bool);

#[async_trait::async_trait]
impl CodecEngine for StaticCodec {
    fn is_ready(&self) -> bool {
        self.0
    }

    async fn when_ready(&self) -> Result<(), EngineFailure> {
        if self.0 {
            Ok(())
        } else {
            Err(EngineFailure::NotLoaded("codec missing".to_string()))
        }
    }
}

pub enum Outcome {
    Output(Bytes),
    Reject(String),
    /// Never resolves and ignores cancellation.
    Hang,
}

#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

pub struct ScriptedEngine {
    pub available: bool,
    pub progress: Vec<f64>,
    pub outcome: Outcome,
    pub gate: Option<Arc<Gate>>,
    pub calls: Mutex<Vec<(Vec<String>, Vec<Bytes>)>>,
}

impl ScriptedEngine {
    pub fn output(bytes: &'static [u8]) -> Self {
        Self::with_outcome(Outcome::Output(Bytes::from_static(bytes)))
    }

    pub fn with_outcome(outcome: Outcome) -> Self {
        Self {
            available: true,
            progress: Vec::new(),
            outcome,
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn progress(mut self, progress: &[f64]) -> Self {
        self.progress = progress.to_vec();
        self
    }

    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl MergeEngine for ScriptedEngine {
    fn entry_point_available(&self) -> bool {
        self.available
    }

    async fn merge(
        &self,
        request: MergeRequest,
        progress: &dyn MergeProgress,
        cancel: CancellationToken,
    ) -> Result<Bytes, EngineFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((request.names().to_vec(), request.contents().to_vec()));

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            tokio::select! {
                _ = gate.release.notified() => {}
                _ = cancel.cancelled() => return Err(EngineFailure::Cancelled),
            }
        }

        for percentage in &self.progress {
            progress.report(*percentage);
        }

        match &self.outcome {
            Outcome::Output(bytes) => Ok(bytes.clone()),
            Outcome::Reject(cause) => Err(EngineFailure::Rejected(cause.clone())),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

pub fn memory_source(files: &[(&str, &'static [u8])]) -> MemorySource {
    files.iter().fold(MemorySource::new(), |source, (name, bytes)| {
        source.with_file(*name, Bytes::from_static(bytes))
    })
}

pub fn merger_with(
    config: MergerConfig,
    source: MemorySource,
    codec_ready: bool,
    engine: Arc<ScriptedEngine>,
) -> Merger {
    merger_over(config, Arc::new(source), codec_ready, engine)
}

pub fn merger_over(
    config: MergerConfig,
    source: Arc<dyn ContentSource>,
    codec_ready: bool,
    engine: Arc<ScriptedEngine>,
) -> Merger {
    Merger::new(config, source, Arc::new(StaticCodec(codec_ready)), engine)
}

/// Holds every read until the gate is released.
pub struct GatedSource {
    pub inner: MemorySource,
    pub gate: Arc<Gate>,
}

#[async_trait::async_trait]
impl ContentSource for GatedSource {
    async fn read(&self, descriptor: &FileDescriptor) -> io::Result<Bytes> {
        self.gate.entered.notify_one();
        self.gate.release.notified().await;
        self.inner.read(descriptor).await
    }
}

pub fn record_progress(merger: &Merger) -> Arc<Mutex<Vec<ProgressEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    merger.on_progress(move |event: &ProgressEvent| {
        sink.lock().unwrap().push(event.clone());
    });
    events
}
