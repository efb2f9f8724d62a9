//! Content stores backing [`super::StoreResolver`]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, trace};

use super::ResourceId;
use crate::{Result, SpliceError};

/// Read-only source of resource text
///
/// `Ok(None)` means "no such resource"; `Err` is reserved for faults of the
/// store itself.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn load(&self, id: &ResourceId) -> Result<Option<String>>;
}

#[async_trait::async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn load(&self, id: &ResourceId) -> Result<Option<String>> {
        (**self).load(id).await
    }
}

/// In-memory store, safe to fill while resolvers read from it
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<ResourceId, Arc<str>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: ResourceId, content: impl Into<Arc<str>>) {
        self.entries.insert(id, content.into());
    }

    /// Insert under a canonical `namespace:path` key; invalid keys are ignored
    pub fn insert_str(&self, id: &str, content: impl Into<Arc<str>>) {
        match id.parse::<ResourceId>() {
            Ok(id) => self.insert(id, content),
            Err(diagnostic) => tracing::warn!("Ignoring store entry: {}", diagnostic),
        }
    }

    pub fn remove(&self, id: &ResourceId) -> Option<Arc<str>> {
        self.entries.remove(id).map(|(_, content)| content)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn load(&self, id: &ResourceId) -> Result<Option<String>> {
        Ok(self.entries.get(id).map(|entry| entry.value().to_string()))
    }
}

/// Filesystem store mapping each namespace to a directory root
#[derive(Debug, Clone, Default)]
pub struct FsStore {
    roots: IndexMap<String, PathBuf>,
}

impl FsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, namespace: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.add_root(namespace, dir);
        self
    }

    pub fn add_root(&mut self, namespace: impl Into<String>, dir: impl Into<PathBuf>) {
        self.roots.insert(namespace.into(), dir.into());
    }

    pub fn root(&self, namespace: &str) -> Option<&Path> {
        self.roots.get(namespace).map(PathBuf::as_path)
    }

    /// File backing `id`, if its namespace has a root
    pub fn path_for(&self, id: &ResourceId) -> Option<PathBuf> {
        let root = self.root(id.namespace())?;
        Some(id.path().split('/').fold(root.to_path_buf(), |dir, segment| dir.join(segment)))
    }
}

#[async_trait::async_trait]
impl ContentStore for FsStore {
    async fn load(&self, id: &ResourceId) -> Result<Option<String>> {
        let Some(path) = self.path_for(id) else {
            trace!("No root configured for namespace '{}'", id.namespace());
            return Ok(None);
        };
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => {
                debug!("{} is a directory, not an import", path.display());
                return Ok(None);
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(SpliceError::io_error(path, err)),
        }
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(SpliceError::io_error(path, err)),
        };
        match String::from_utf8(bytes) {
            Ok(content) => Ok(Some(content)),
            Err(err) => {
                // invalid sequences become U+FFFD for the ASCII pass to strip
                debug!("{} is not valid UTF-8, decoding lossily", path.display());
                Ok(Some(String::from_utf8_lossy(err.as_bytes()).into_owned()))
            }
        }
    }
}
