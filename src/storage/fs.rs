use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ensure_not_cancelled, normalized_segments, StorageService};
use crate::error::{AppError, AppResult};

/// Local directory tree laid out as `{root}/{container}/{path}`.
#[derive(Clone, Debug)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self { Self { root: root.as_ref().to_path_buf() } }

    pub fn root(&self) -> &Path { &self.root }

    fn resolve(&self, container: &str, path: &str) -> AppResult<PathBuf> {
        let mut full = self.root.clone();
        for seg in normalized_segments(container, path)? {
            full.push(seg);
        }
        Ok(full)
    }
}

fn staging_path(full: &Path) -> PathBuf {
    let file_name = full.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    full.with_file_name(format!("{}.{}.tmp", file_name, uuid::Uuid::new_v4()))
}

async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> AppResult<T>
where
    F: std::future::Future<Output = AppResult<T>>,
{
    ensure_not_cancelled(cancel)?;
    tokio::select! {
        _ = cancel.cancelled() => Err(AppError::cancelled("storage operation cancelled")),
        r = fut => r,
    }
}

#[async_trait]
impl StorageService for FileSystemStorage {
    async fn file_exists(&self, container: &str, path: &str, cancel: &CancellationToken) -> AppResult<bool> {
        let full = self.resolve(container, path)?;
        cancellable(cancel, async move {
            match tokio::fs::metadata(&full).await {
                Ok(m) => Ok(m.is_file()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn read_file(&self, container: &str, path: &str, cancel: &CancellationToken) -> AppResult<Vec<u8>> {
        let full = self.resolve(container, path)?;
        cancellable(cancel, async move { Ok(tokio::fs::read(&full).await?) }).await
    }

    async fn write_file(
        &self,
        container: &str,
        path: &str,
        content: &[u8],
        _content_type: Option<&str>,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let full = self.resolve(container, path)?;
        cancellable(cancel, async move {
            if let Some(parent) = full.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            // Each write stages its own sibling file; the rename publishes it whole.
            let tmp = staging_path(&full);
            tokio::fs::write(&tmp, content).await?;
            if let Err(e) = tokio::fs::rename(&tmp, &full).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(AppError::io("storage_io", format!("Failed to replace [{}]: {}", full.display(), e)));
            }
            debug!(target: "fllm::storage", "fs write {} ({} bytes)", full.display(), content.len());
            Ok(())
        })
        .await
    }

    fn name(&self) -> &'static str { "filesystem" }
}
