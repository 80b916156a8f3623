use std::io;

use futures_util::stream::{self, StreamExt};
use merger_core::FileDescriptor;
use merger_logging::merger_debug;
use thiserror::Error;

use crate::{ContentSource, LoadedFile};

#[derive(Debug, Error)]
#[error("failed to read {}: {cause}", .descriptor.name)]
pub struct LoadError {
    pub descriptor: FileDescriptor,
    #[source]
    pub cause: io::Error,
}

/// Reads every descriptor, at most `max_concurrent_reads` at a time.
///
/// Completion order is not observable: the result follows `descriptors`.
/// The first failed read aborts the whole load and drops in-flight reads.
pub async fn load(
    source: &dyn ContentSource,
    descriptors: &[FileDescriptor],
    max_concurrent_reads: usize,
) -> Result<Vec<LoadedFile>, LoadError> {
    let mut reads = stream::iter(0..descriptors.len())
        .map(|slot| {
            let descriptor = &descriptors[slot];
            async move {
                match source.read(descriptor).await {
                    Ok(bytes) => Ok((slot, bytes)),
                    Err(cause) => Err(LoadError {
                        descriptor: descriptor.clone(),
                        cause,
                    }),
                }
            }
        })
        .buffer_unordered(max_concurrent_reads.max(1));

    let mut completed = Vec::with_capacity(descriptors.len());
    while let Some(result) = reads.next().await {
        let (slot, bytes) = result?;
        merger_debug!(
            "Loaded {} ({} bytes)",
            descriptors[slot].name,
            bytes.len()
        );
        completed.push((slot, bytes));
    }
    drop(reads);

    completed.sort_by_key(|(slot, _)| *slot);
    Ok(completed
        .into_iter()
        .map(|(slot, bytes)| LoadedFile {
            descriptor: descriptors[slot].clone(),
            bytes,
        })
        .collect())
}
