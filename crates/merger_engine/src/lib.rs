//! Merger engine: content loading, external engine seams and job orchestration.
mod bridge;
mod config;
mod export;
mod ffmpeg;
mod loader;
mod orchestrator;
mod package;
mod persist;
mod progress;
mod source;
mod types;

pub use bridge::{CodecEngine, MergeEngine, MergeProgress};
pub use config::{MergerConfig, NameOrderSetting, DEFAULT_ARTIFACT_MEDIA_TYPE, DEFAULT_ARTIFACT_NAME};
pub use export::{export_artifact, ExportError, ExportOptions, ExportSummary};
pub use ffmpeg::{CodecMode, FfmpegCodec, FfmpegConcatEngine, FfmpegSettings};
pub use loader::{load, LoadError};
pub use orchestrator::Merger;
pub use package::{sha256_hex, DownloadHandle, ResultPackager, ARTIFACT_SCHEME};
pub use persist::{prepare_output_dir, ArtifactWriter, PersistError};
pub use progress::{ChannelProgressListener, ProgressListener};
pub use source::{ContentSource, DirectorySource, MemorySource};
pub use types::{BufferLease, EngineFailure, LoadedFile, MergeRequest, MergedArtifact};
