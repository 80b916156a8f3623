use std::path::{Path, PathBuf};

use merger_logging::merger_info;
use serde_json::json;

use crate::package::sha256_hex;
use crate::persist::{ArtifactWriter, PersistError};
use crate::DownloadHandle;

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Overrides the handle's suggested name.
    pub output_filename: Option<String>,
    /// Also write `<output>.json` describing the inputs and digest.
    pub manifest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub bytes_written: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("artifact bytes do not match handle {uri}")]
    DigestMismatch { uri: String },
}

/// Writes a packaged artifact (and optionally its manifest) into `output_dir`.
pub fn export_artifact(
    output_dir: &Path,
    handle: &DownloadHandle,
    bytes: &[u8],
    inputs: &[String],
    options: ExportOptions,
) -> Result<ExportSummary, ExportError> {
    if bytes.len() as u64 != handle.len || sha256_hex(bytes) != handle.sha256 {
        return Err(ExportError::DigestMismatch {
            uri: handle.uri.clone(),
        });
    }

    let filename = options
        .output_filename
        .unwrap_or_else(|| handle.name.clone());
    let writer = ArtifactWriter::new(output_dir);
    let output_path = writer.write(&filename, bytes)?;
    merger_info!("Wrote {} bytes to {:?}", bytes.len(), output_path);

    let manifest_path = if options.manifest {
        let manifest = json!({
            "name": filename,
            "media_type": handle.media_type,
            "bytes": handle.len,
            "sha256": handle.sha256,
            "inputs": inputs,
        });
        let path = writer.write(&format!("{filename}.json"), manifest.to_string().as_bytes())?;
        Some(path)
    } else {
        None
    };

    Ok(ExportSummary {
        output_path,
        manifest_path,
        bytes_written: bytes.len() as u64,
    })
}
