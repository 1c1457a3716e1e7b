use super::*;
use std::sync::Arc;

use crate::resource::reference::ResourceReferenceRecord;
use crate::storage::{MemoryStorage, StorageService};

const CONTAINER: &str = "resource-provider";
const PROVIDER: &str = "FoundationaLLM.Agent";

fn store_on(storage: &MemoryStorage) -> ResourceProviderResourceReferenceStore<ResourceReferenceRecord> {
    ResourceProviderResourceReferenceStore::new(PROVIDER, CONTAINER, Arc::new(storage.clone()), CancellationToken::new())
        .with_reload_delay(Duration::from_millis(1))
}

fn agent(name: &str) -> ResourceReferenceRecord {
    ResourceReferenceRecord::new(name, format!("/{}/{}.json", PROVIDER, name), "knowledge-management")
}

async fn stored_names(storage: &MemoryStorage) -> Vec<String> {
    let bytes = storage
        .read_file(CONTAINER, "/FoundationaLLM.Agent/_resource-references.json", &CancellationToken::new())
        .await
        .unwrap();
    let doc: ResourceReferenceList<ResourceReferenceRecord> = serde_json::from_slice(&bytes).unwrap();
    doc.resource_references.into_iter().map(|r| r.name).collect()
}

#[tokio::test]
async fn load_creates_missing_document() {
    let storage = MemoryStorage::new();
    let store = store_on(&storage);
    assert_eq!(store.file_path(), "/FoundationaLLM.Agent/_resource-references.json");
    store.load_resource_references().await;
    assert!(stored_names(&storage).await.is_empty());
}

#[tokio::test]
async fn add_persists_and_rejects_duplicates() {
    let storage = MemoryStorage::new();
    let store = store_on(&storage);
    store.add_resource_reference(agent("a1")).await.unwrap();
    assert_eq!(stored_names(&storage).await, vec!["a1".to_string()]);

    let err = store.add_resource_reference(agent("a1")).await.unwrap_err();
    assert_eq!(err.code_str(), "resource_reference_exists");
    assert_eq!(err.http_status(), 400);
    assert!(err.message().contains("a1"));
}

#[tokio::test]
async fn batch_add_is_all_or_nothing() {
    let storage = MemoryStorage::new();
    let store = store_on(&storage);
    store.add_resource_reference(agent("a1")).await.unwrap();

    assert!(store.add_resource_references(vec![agent("a2"), agent("a1")]).await.is_err());
    assert!(store.add_resource_references(vec![agent("a3"), agent("a3")]).await.is_err());
    assert_eq!(store.get_all_resource_references().await.len(), 1);

    store.add_resource_references(vec![agent("a2"), agent("a3")]).await.unwrap();
    assert_eq!(stored_names(&storage).await, vec!["a1", "a2", "a3"]);
}

#[tokio::test]
async fn soft_delete_hides_entry_but_lookup_fails() {
    let storage = MemoryStorage::new();
    let store = store_on(&storage);
    let r = agent("a1");
    store.add_resource_reference(r.clone()).await.unwrap();
    store.add_resource_reference(agent("a2")).await.unwrap();
    store.delete_resource_reference(&r).await.unwrap();

    let all: Vec<String> = store.get_all_resource_references().await.into_iter().map(|r| r.name).collect();
    assert_eq!(all, vec!["a2".to_string()]);

    let err = store.get_resource_reference("a1").await.unwrap_err();
    assert_eq!(err.code_str(), "resource_reference_deleted");
    assert_eq!(err.http_status(), 400);

    // Still reserved until purged
    assert!(store.add_resource_reference(agent("a1")).await.is_err());
    assert!(store.get_resource_references(&["a1", "a2"]).await.unwrap().iter().all(|r| r.name == "a2"));
}

#[tokio::test]
async fn delete_unknown_reference_is_not_found() {
    let store = store_on(&MemoryStorage::new());
    let err = store.delete_resource_reference(&agent("ghost")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.code_str(), "resource_reference_missing");
}

#[tokio::test]
async fn purge_frees_the_name() {
    let storage = MemoryStorage::new();
    let store = store_on(&storage);
    let r = agent("a1");
    store.add_resource_reference(r.clone()).await.unwrap();

    let err = store.purge_resource_reference("a1").await.unwrap_err();
    assert_eq!(err.code_str(), "resource_reference_not_deleted");
    assert!(store.purge_resource_reference("nope").await.unwrap_err().is_not_found());

    store.delete_resource_reference(&r).await.unwrap();
    store.purge_resource_reference("a1").await.unwrap();
    assert!(stored_names(&storage).await.is_empty());
    assert!(store.get_resource_reference("a1").await.unwrap().is_none());
    store.add_resource_reference(agent("a1")).await.unwrap();
}

#[tokio::test]
async fn miss_reloads_from_storage() {
    let storage = MemoryStorage::new();
    let writer = store_on(&storage);
    let reader = store_on(&storage);
    reader.load_resource_references().await;

    writer.add_resource_reference(agent("a1")).await.unwrap();
    // reader has never seen a1 locally; the miss path picks it up
    let got = reader.get_resource_reference("a1").await.unwrap();
    assert_eq!(got, Some(agent("a1")));
    assert!(reader.get_resource_reference("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn names_lookup_reloads_and_skips_unknown() {
    let storage = MemoryStorage::new();
    let writer = store_on(&storage);
    let reader = store_on(&storage);
    writer.add_resource_references(vec![agent("a1"), agent("a2")]).await.unwrap();

    let got: Vec<String> = reader.get_resource_references(&["a2", "zz", "a1"]).await.unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(got, vec!["a2".to_string(), "a1".to_string()]);
}

#[tokio::test]
async fn predicate_filters_live_entries() {
    let store = store_on(&MemoryStorage::new());
    store
        .add_resource_references(vec![agent("a1"), agent("b1").with_object_id("/x/b1"), agent("b2")])
        .await
        .unwrap();
    store.delete_resource_reference(&agent("b2")).await.unwrap();
    let got = store.get_resource_references_where(|r| r.name.starts_with('b')).await;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].object_id.as_deref(), Some("/x/b1"));
}

#[tokio::test]
async fn merge_keeps_local_entry_on_name_clash() {
    let storage = MemoryStorage::new();
    let first = store_on(&storage);
    let second = store_on(&storage);

    // Both replicas create "a1" before seeing each other; last writer wins in storage.
    let mut mine = agent("a1");
    mine.filename = "/FoundationaLLM.Agent/mine.json".into();
    first.add_resource_reference(mine.clone()).await.unwrap();
    second.add_resource_reference(agent("a1")).await.unwrap();

    first.load_resource_references().await;
    let seen = first.get_resource_reference("a1").await.unwrap().unwrap();
    assert_eq!(seen.filename, "/FoundationaLLM.Agent/mine.json");
}

#[tokio::test]
async fn cancelled_store_reports_cancellation() {
    let cancel = CancellationToken::new();
    let store: ResourceProviderResourceReferenceStore<ResourceReferenceRecord> =
        ResourceProviderResourceReferenceStore::new(PROVIDER, CONTAINER, Arc::new(MemoryStorage::new()), cancel.clone());
    cancel.cancel();
    assert_eq!(store.get_resource_reference("a1").await.unwrap_err().http_status(), 499);
    assert!(store.add_resource_reference(agent("a1")).await.is_err());
    // Failed save rolled back the insert; the lock was released on every path.
    assert!(store.get_all_resource_references().await.is_empty());
}

#[tokio::test]
async fn corrupt_document_is_logged_not_fatal() {
    let storage = MemoryStorage::new();
    storage
        .write_file(CONTAINER, "/FoundationaLLM.Agent/_resource-references.json", b"{ nope", None, &CancellationToken::new())
        .await
        .unwrap();
    let store = store_on(&storage);
    store.load_resource_references().await;
    assert!(store.get_all_resource_references().await.is_empty());
    assert!(store.get_resource_reference("a1").await.is_err());
}
