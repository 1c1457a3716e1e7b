use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ensure_not_cancelled, normalized_segments, StorageService};
use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
struct StoredFile {
    content: Vec<u8>,
    content_type: Option<String>,
}

/// In-process storage; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    files: Arc<RwLock<HashMap<String, StoredFile>>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    fn key(container: &str, path: &str) -> AppResult<String> {
        Ok(normalized_segments(container, path)?.join("/"))
    }

    pub fn len(&self) -> usize { self.files.read().len() }

    pub fn is_empty(&self) -> bool { self.files.read().is_empty() }

    pub fn content_type(&self, container: &str, path: &str) -> Option<String> {
        let key = Self::key(container, path).ok()?;
        self.files.read().get(&key).and_then(|f| f.content_type.clone())
    }
}

#[async_trait]
impl StorageService for MemoryStorage {
    async fn file_exists(&self, container: &str, path: &str, cancel: &CancellationToken) -> AppResult<bool> {
        ensure_not_cancelled(cancel)?;
        let key = Self::key(container, path)?;
        Ok(self.files.read().contains_key(&key))
    }

    async fn read_file(&self, container: &str, path: &str, cancel: &CancellationToken) -> AppResult<Vec<u8>> {
        ensure_not_cancelled(cancel)?;
        let key = Self::key(container, path)?;
        match self.files.read().get(&key) {
            Some(f) => Ok(f.content.clone()),
            None => Err(AppError::not_found("storage_not_found", format!("File [{}] not found in container [{}]", path, container))),
        }
    }

    async fn write_file(
        &self,
        container: &str,
        path: &str,
        content: &[u8],
        content_type: Option<&str>,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        ensure_not_cancelled(cancel)?;
        let key = Self::key(container, path)?;
        debug!(target: "fllm::storage", "memory write {} ({} bytes)", key, content.len());
        self.files.write().insert(key, StoredFile { content: content.to_vec(), content_type: content_type.map(|s| s.to_string()) });
        Ok(())
    }

    fn name(&self) -> &'static str { "memory" }
}
