//! Storage-backed index of resource references for one resource provider.
//!
//! The whole index lives in a single JSON document `/{provider}/_resource-references.json`
//! inside the provider's storage container. Every replica of a provider keeps its own
//! in-memory copy and merges the document into it on demand:
//! - merging only adds names that are not present locally, so local entries always win;
//! - a lookup miss waits briefly and merges again, to pick up entries another replica
//!   has just written;
//! - writes always replace the whole document.
//!
//! All operations run under one async mutex, readers included. The merge rules above
//! rely on that full serialization.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::reference::{ResourceReference, ResourceReferenceList};
use crate::config::ReferenceStoreSettings;
use crate::error::{AppError, AppResult};
use crate::storage::{SharedStorage, JSON_CONTENT_TYPE};

pub const RESOURCE_REFERENCES_FILE_NAME: &str = "_resource-references.json";

const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(10);

type ReferenceMap<T> = BTreeMap<String, T>;

pub struct ResourceProviderResourceReferenceStore<T: ResourceReference> {
    provider_name: String,
    storage_container: String,
    storage: SharedStorage,
    cancel: CancellationToken,
    reload_delay: Duration,
    references: Mutex<ReferenceMap<T>>,
}

fn already_exists(name: &str) -> AppError {
    AppError::user("resource_reference_exists", format!("A resource reference for the resource {} already exists.", name))
}

fn missing(name: &str) -> AppError {
    AppError::not_found("resource_reference_missing", format!("The resource reference for the resource {} was not found.", name))
}

/// Entry lookup that treats a deleted-but-not-purged entry as an error, not a miss.
fn lookup<T: ResourceReference>(map: &ReferenceMap<T>, name: &str) -> AppResult<Option<T>> {
    match map.get(name) {
        Some(r) if r.deleted() => Err(AppError::user(
            "resource_reference_deleted",
            format!(
                "The resource reference for the resource {} cannot be retrieved. It points to a resource that has been deleted but not purged yet.",
                name
            ),
        )),
        Some(r) => Ok(Some(r.clone())),
        None => Ok(None),
    }
}

impl<T: ResourceReference> ResourceProviderResourceReferenceStore<T> {
    pub fn new<P: Into<String>, C: Into<String>>(provider_name: P, storage_container: C, storage: SharedStorage, cancel: CancellationToken) -> Self {
        Self {
            provider_name: provider_name.into(),
            storage_container: storage_container.into(),
            storage,
            cancel,
            reload_delay: DEFAULT_RELOAD_DELAY,
            references: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_settings(provider_name: &str, settings: &ReferenceStoreSettings, storage: SharedStorage, cancel: CancellationToken) -> Self {
        Self::new(provider_name, settings.storage_container.clone(), storage, cancel)
            .with_reload_delay(settings.reload_delay())
    }

    pub fn with_reload_delay(mut self, delay: Duration) -> Self { self.reload_delay = delay; self }

    pub fn provider_name(&self) -> &str { &self.provider_name }

    pub fn file_path(&self) -> String { format!("/{}/{}", self.provider_name, RESOURCE_REFERENCES_FILE_NAME) }

    /// Merge the stored document into memory, creating the document when it is missing.
    /// Best effort: failures are logged and the store stays usable.
    pub async fn load_resource_references(&self) {
        info!(target: "fllm::references", "Starting to load the references for the {} resource provider...", self.provider_name);
        let mut map = self.references.lock().await;
        let result = match self.storage.file_exists(&self.storage_container, &self.file_path(), &self.cancel).await {
            Ok(true) => self.load_and_merge(&mut map).await,
            Ok(false) => self.save(&map).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => info!(target: "fllm::references", "The references for the {} resource provider were successfully loaded ({} entries).", self.provider_name, map.len()),
            Err(e) => error!(target: "fllm::references", "There was an error while loading the resource references for the {} resource provider: {}", self.provider_name, e),
        }
    }

    /// Look up `name`, reloading once from storage on a local miss.
    /// `Ok(None)` means the name is unknown everywhere; a soft-deleted entry is an error.
    pub async fn get_resource_reference(&self, name: &str) -> AppResult<Option<T>> {
        let mut map = self.references.lock().await;
        if let Some(found) = lookup(&*map, name)? {
            return Ok(Some(found));
        }

        // Another replica may have created it moments ago.
        tokio::select! {
            _ = self.cancel.cancelled() => return Err(AppError::cancelled("resource reference lookup cancelled")),
            _ = tokio::time::sleep(self.reload_delay) => {}
        }
        debug!(target: "fllm::references", "reference {} not cached for {}; reloading", name, self.provider_name);
        self.load_and_merge(&mut map).await?;
        lookup(&*map, name)
    }

    /// Live entries matching `predicate`, from memory only.
    pub async fn get_resource_references_where<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let map = self.references.lock().await;
        map.values().filter(|r| !r.deleted() && predicate(*r)).cloned().collect()
    }

    /// Live entries for `names`, in request order; unknown or deleted names are skipped.
    pub async fn get_resource_references<S: AsRef<str>>(&self, names: &[S]) -> AppResult<Vec<T>> {
        let mut map = self.references.lock().await;
        if names.iter().any(|n| !map.contains_key(n.as_ref())) {
            self.load_and_merge(&mut map).await?;
        }
        Ok(names
            .iter()
            .filter_map(|n| map.get(n.as_ref()))
            .filter(|r| !r.deleted())
            .cloned()
            .collect())
    }

    pub async fn get_all_resource_references(&self) -> Vec<T> {
        let map = self.references.lock().await;
        map.values().filter(|r| !r.deleted()).cloned().collect()
    }

    /// Insert a new entry and persist. Names held by soft-deleted entries stay blocked
    /// until purged.
    pub async fn add_resource_reference(&self, reference: T) -> AppResult<()> {
        self.add_resource_references(vec![reference]).await
    }

    /// All-or-nothing: any clash rejects the whole batch before anything is written.
    pub async fn add_resource_references(&self, references: Vec<T>) -> AppResult<()> {
        let mut map = self.references.lock().await;
        let mut batch: ReferenceMap<T> = BTreeMap::new();
        for r in references {
            if map.contains_key(r.name()) || batch.contains_key(r.name()) {
                return Err(already_exists(r.name()));
            }
            batch.insert(r.name().to_string(), r);
        }
        let names: Vec<String> = batch.keys().cloned().collect();
        map.extend(batch);
        if let Err(e) = self.save(&map).await {
            for n in &names {
                map.remove(n);
            }
            return Err(e);
        }
        debug!(target: "fllm::references", "added {} reference(s) to {}", names.len(), self.provider_name);
        Ok(())
    }

    /// Soft delete: flag the entry and persist. The name stays reserved until purged.
    pub async fn delete_resource_reference(&self, reference: &T) -> AppResult<()> {
        let mut map = self.references.lock().await;
        let name = reference.name().to_string();
        let previous = match map.get_mut(&name) {
            Some(entry) => {
                let was = entry.deleted();
                entry.set_deleted(true);
                was
            }
            None => return Err(missing(&name)),
        };
        if let Err(e) = self.save(&map).await {
            if let Some(entry) = map.get_mut(&name) {
                entry.set_deleted(previous);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove a soft-deleted entry for good so its name can be reused.
    pub async fn purge_resource_reference(&self, name: &str) -> AppResult<()> {
        let mut map = self.references.lock().await;
        match map.get(name).map(|r| r.deleted()) {
            None => return Err(missing(name)),
            Some(false) => {
                return Err(AppError::user(
                    "resource_reference_not_deleted",
                    format!("The resource reference for the resource {} must be deleted before it can be purged.", name),
                ))
            }
            Some(true) => {}
        }
        let removed = map.remove(name);
        if let Err(e) = self.save(&map).await {
            if let Some(r) = removed {
                map.insert(name.to_string(), r);
            }
            return Err(e);
        }
        Ok(())
    }

    // Callers must hold the lock; the guard is passed in as the map.
    async fn load_and_merge(&self, map: &mut ReferenceMap<T>) -> AppResult<()> {
        let bytes = match self.storage.read_file(&self.storage_container, &self.file_path(), &self.cancel).await {
            Ok(b) => b,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        let persisted: ResourceReferenceList<T> = serde_json::from_slice(&bytes)?;
        // TODO: surface a conflict when a persisted entry differs from the local one of the same name.
        for r in persisted.resource_references {
            if !map.contains_key(r.name()) {
                map.insert(r.name().to_string(), r);
            }
        }
        Ok(())
    }

    async fn save(&self, map: &ReferenceMap<T>) -> AppResult<()> {
        let doc = ResourceReferenceList { resource_references: map.values().cloned().collect::<Vec<T>>() };
        let bytes = serde_json::to_vec(&doc)?;
        self.storage
            .write_file(&self.storage_container, &self.file_path(), &bytes, Some(JSON_CONTENT_TYPE), &self.cancel)
            .await
    }
}

#[cfg(test)]
#[path = "reference_store_tests.rs"]
mod reference_store_tests;
