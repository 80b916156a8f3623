use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use merger_core::FileDescriptor;

/// Where the Content Loader reads file bytes from.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn read(&self, descriptor: &FileDescriptor) -> io::Result<Bytes>;
}

/// Reads descriptors as plain file names inside one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a plain file name: {name}"),
            )),
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for DirectorySource {
    async fn read(&self, descriptor: &FileDescriptor) -> io::Result<Bytes> {
        let path = self.resolve(&descriptor.name)?;
        tokio::fs::read(&path).await.map(Bytes::from)
    }
}

/// In-memory files keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Bytes>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Bytes>) {
        self.files.insert(name.into(), bytes.into());
    }
}

#[async_trait::async_trait]
impl ContentSource for MemorySource {
    async fn read(&self, descriptor: &FileDescriptor) -> io::Result<Bytes> {
        self.files.get(&descriptor.name).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no content for {}", descriptor.name),
            )
        })
    }
}
