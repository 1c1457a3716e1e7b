//!
//! fllm storage module
//! -------------------
//! Narrow blob-style storage abstraction consumed by the resource reference stores and
//! the authorization core. A file is addressed by `(container, path)` where the path
//! always starts with `/` (for example `/FoundationaLLM.Agent/_resource-references.json`).
//!
//! Two backends are provided:
//! - `MemoryStorage`: a cloneable in-process map, shared between handles so that tests
//!   can simulate several replicas of the same resource provider.
//! - `FileSystemStorage`: files under `{root}/{container}/{path}` using `tokio::fs`.
//!
//! Every call takes a `CancellationToken`; a cancelled call returns `AppError::Cancelled`
//! and leaves no partial state behind in memory.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

mod fs;
mod memory;

pub use fs::FileSystemStorage;
pub use memory::MemoryStorage;

/// Default content type written alongside JSON documents.
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[async_trait]
pub trait StorageService: Send + Sync {
    async fn file_exists(&self, container: &str, path: &str, cancel: &CancellationToken) -> AppResult<bool>;

    /// Missing files surface as `AppError::NotFound` with code `storage_not_found`.
    async fn read_file(&self, container: &str, path: &str, cancel: &CancellationToken) -> AppResult<Vec<u8>>;

    /// Full replace of the file contents.
    async fn write_file(
        &self,
        container: &str,
        path: &str,
        content: &[u8],
        content_type: Option<&str>,
        cancel: &CancellationToken,
    ) -> AppResult<()>;

    fn name(&self) -> &'static str;
}

pub type SharedStorage = Arc<dyn StorageService>;

/// Split a storage path into segments, rejecting traversal and empty names.
pub(crate) fn normalized_segments<'a>(container: &'a str, path: &'a str) -> AppResult<Vec<&'a str>> {
    let container = container.trim();
    if container.is_empty() || container.contains('/') || container == "." || container == ".." {
        return Err(AppError::user("invalid_storage_path", format!("Invalid storage container [{}]", container)));
    }
    let mut parts = vec![container];
    for seg in path.split('/').filter(|s| !s.is_empty()) {
        if seg == "." || seg == ".." || seg.contains('\\') {
            return Err(AppError::user("invalid_storage_path", format!("Invalid storage path [{}]", path)));
        }
        parts.push(seg);
    }
    if parts.len() < 2 {
        return Err(AppError::user("invalid_storage_path", format!("Invalid storage path [{}]", path)));
    }
    Ok(parts)
}

pub(crate) fn ensure_not_cancelled(cancel: &CancellationToken) -> AppResult<()> {
    if cancel.is_cancelled() {
        return Err(AppError::cancelled("storage operation cancelled"));
    }
    Ok(())
}
