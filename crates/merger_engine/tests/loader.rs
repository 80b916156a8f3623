mod common;

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use common::{descriptors, init_logging, memory_source};
use merger_core::FileDescriptor;
use merger_engine::{load, ContentSource, DirectorySource};
use tempfile::TempDir;

/// Completes reads after a per-file delay and tracks peak concurrency.
struct DelayedSource {
    delays_ms: HashMap<String, u64>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl DelayedSource {
    fn new(delays: &[(&str, u64)]) -> Self {
        Self {
            delays_ms: delays
                .iter()
                .map(|(name, ms)| (name.to_string(), *ms))
                .collect(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for DelayedSource {
    async fn read(&self, descriptor: &FileDescriptor) -> io::Result<Bytes> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let delay = self.delays_ms.get(&descriptor.name).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Bytes::from(descriptor.name.clone().into_bytes()))
    }
}

#[tokio::test]
async fn output_follows_descriptor_order_not_completion_order() {
    init_logging();
    let source = DelayedSource::new(&[("a.mp4", 40), ("b.mp4", 0), ("c.mp4", 20), ("d.mp4", 5)]);
    let descriptors = descriptors(&["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);

    let loaded = load(&source, &descriptors, 4).await.unwrap();

    let names: Vec<_> = loaded.iter().map(|f| f.descriptor.name.as_str()).collect();
    assert_eq!(names, vec!["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);
    for file in &loaded {
        assert_eq!(file.bytes, Bytes::from(file.descriptor.name.clone().into_bytes()));
    }
    let orders: Vec<_> = loaded.iter().map(|f| f.descriptor.order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn concurrent_reads_are_capped() {
    init_logging();
    let names = ["a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4", "f.mp4"];
    let delays: Vec<_> = names.iter().map(|name| (*name, 10)).collect();
    let source = DelayedSource::new(&delays);

    let loaded = load(&source, &descriptors(&names), 2).await.unwrap();

    assert_eq!(loaded.len(), names.len());
    assert!(source.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn zero_cap_still_loads() {
    init_logging();
    let source = memory_source(&[("a.mp4", b"A" as &[u8])]);
    let loaded = load(&source, &descriptors(&["a.mp4"]), 0).await.unwrap();
    assert_eq!(loaded.len(), 1);
}

#[tokio::test]
async fn first_unreadable_file_aborts_load() {
    init_logging();
    let source = memory_source(&[("a.mp4", b"A" as &[u8]), ("c.mp4", b"C" as &[u8])]);

    let err = load(&source, &descriptors(&["a.mp4", "b.mp4", "c.mp4"]), 4)
        .await
        .unwrap_err();

    assert_eq!(err.descriptor.name, "b.mp4");
    assert_eq!(err.cause.kind(), io::ErrorKind::NotFound);
    assert!(err.to_string().starts_with("failed to read b.mp4"));
}

#[tokio::test]
async fn directory_source_reads_files() {
    init_logging();
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("a.mp4"), b"first").unwrap();
    std::fs::write(temp.path().join("b.mp4"), b"second").unwrap();
    let source = DirectorySource::new(temp.path());

    let loaded = load(&source, &descriptors(&["b.mp4", "a.mp4"]), 2)
        .await
        .unwrap();

    assert_eq!(loaded[0].bytes, Bytes::from_static(b"first"));
    assert_eq!(loaded[1].bytes, Bytes::from_static(b"second"));
}

#[tokio::test]
async fn directory_source_rejects_paths() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let source = DirectorySource::new(temp.path());
    let descriptor = FileDescriptor {
        name: "../escape.mp4".to_string(),
        order: 0,
        media_type: "video/mp4".to_string(),
    };

    let err = source.read(&descriptor).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}
