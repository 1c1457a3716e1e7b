use super::*;
use std::sync::Arc;

use crate::authz::assignments::PrincipalType;
use crate::authz::roles::{role_definition_object_id, CONTRIBUTOR, READER, RBAC_ADMINISTRATOR};
use crate::storage::{MemoryStorage, StorageService};

const INSTANCE: &str = "6fa496ce-d5c0-4e02-9223-06a98c9c0176";
const OTHER: &str = "2c3a4f9e-0b7d-4f47-a3f6-6f0d3c1b8a11";

fn settings(ids: &[&str]) -> AuthorizationSettings {
    AuthorizationSettings { instance_ids: ids.iter().map(|s| s.to_string()).collect(), ..AuthorizationSettings::default() }
}

fn core_on(storage: &MemoryStorage, ids: &[&str]) -> AuthorizationCore {
    AuthorizationCore::new(settings(ids), Arc::new(storage.clone()), CancellationToken::new())
}

fn agent_path(instance: &str, name: &str) -> String {
    format!("/instances/{}/providers/FoundationaLLM.Agent/agents/{}", instance, name)
}

fn reader_at_instance(principal: &str) -> RoleAssignment {
    RoleAssignment::new("reader-1", role_definition_object_id(READER), principal, PrincipalType::User, format!("/instances/{}", INSTANCE))
}

#[tokio::test]
async fn not_initialized_denies() {
    let core = core_on(&MemoryStorage::new(), &[INSTANCE]);
    let req = ActionAuthorizationRequest::new("FoundationaLLM.Agent/agents/read", agent_path(INSTANCE, "a"), "u1");
    assert_eq!(core.authorize(INSTANCE, &req).unwrap_err().code_str(), "not_initialized");
    assert!(!core.process_authorization_request(INSTANCE, &req).authorized);
}

#[tokio::test]
async fn initialize_creates_missing_store_documents() {
    let storage = MemoryStorage::new();
    let upper = INSTANCE.to_uppercase();
    let core = core_on(&storage, &[upper.as_str()]);
    core.initialize().await.unwrap();
    assert!(core.is_initialized());

    let bytes = storage.read_file("role-assignments", &format!("/{}.json", INSTANCE), &CancellationToken::new()).await.unwrap();
    let doc: RoleAssignmentStore = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc.instance_id, upper);
    assert!(doc.role_assignments.is_empty());
}

#[tokio::test]
async fn reader_scenario_end_to_end() {
    let storage = MemoryStorage::new();
    let core = core_on(&storage, &[INSTANCE]);
    core.initialize().await.unwrap();
    let saved = core.upsert_role_assignment(INSTANCE, reader_at_instance("u1")).await.unwrap();
    assert_eq!(saved.object_id, format!("/instances/{}/providers/FoundationaLLM.Authorization/roleAssignments/reader-1", INSTANCE));

    let read = ActionAuthorizationRequest::new("FoundationaLLM.Agent/agents/read", agent_path(INSTANCE, "X"), "u1");
    let write = ActionAuthorizationRequest::new("FoundationaLLM.Agent/agents/write", agent_path(INSTANCE, "X"), "u1");
    assert!(core.authorize(INSTANCE, &read).unwrap());
    assert!(!core.authorize(INSTANCE, &write).unwrap());
    assert!(core.process_authorization_request(INSTANCE, &read).authorized);

    // A second core over the same storage sees the persisted assignment
    let replica = core_on(&storage, &[INSTANCE]);
    replica.initialize().await.unwrap();
    assert!(replica.authorize(INSTANCE, &read).unwrap());
}

#[tokio::test]
async fn invalid_requests_are_errors_but_denials_when_processed() {
    let storage = MemoryStorage::new();
    let core = core_on(&storage, &[INSTANCE, OTHER]);
    core.initialize().await.unwrap();

    let bad_path = ActionAuthorizationRequest::new("FoundationaLLM.Agent/agents/read", "/instances/nope", "u1");
    assert_eq!(core.authorize(INSTANCE, &bad_path).unwrap_err().http_status(), 400);
    assert!(!core.process_authorization_request(INSTANCE, &bad_path).authorized);

    let other_route = ActionAuthorizationRequest::new("FoundationaLLM.Agent/agents/read", agent_path(OTHER, "a"), "u1");
    assert_eq!(core.authorize(INSTANCE, &other_route).unwrap_err().code_str(), "instance_mismatch");

    let empty_action = ActionAuthorizationRequest::new(" ", agent_path(INSTANCE, "a"), "u1");
    assert!(core.authorize(INSTANCE, &empty_action).is_err());
}

#[tokio::test]
async fn foreign_store_document_is_skipped() {
    let storage = MemoryStorage::new();
    let doc = serde_json::to_vec(&RoleAssignmentStore::new(OTHER)).unwrap();
    storage
        .write_file("role-assignments", &format!("/{}.json", INSTANCE), &doc, None, &CancellationToken::new())
        .await
        .unwrap();

    let core = core_on(&storage, &[INSTANCE]);
    core.initialize().await.unwrap();
    assert!(core.get_role_assignments(INSTANCE).unwrap_err().is_not_found());
    let req = ActionAuthorizationRequest::new("FoundationaLLM.Agent/agents/read", agent_path(INSTANCE, "a"), "u1");
    assert!(!core.authorize(INSTANCE, &req).unwrap());
}

#[tokio::test]
async fn request_processing_gate_follows_role_assignment_read() {
    let core = core_on(&MemoryStorage::new(), &[INSTANCE]);
    core.initialize().await.unwrap();
    assert!(!core.allow_authorization_requests_processing(INSTANCE, "svc"));

    let admin = RoleAssignment::new("rbac", role_definition_object_id(RBAC_ADMINISTRATOR), "svc", PrincipalType::ServicePrincipal, "/");
    core.upsert_role_assignment(INSTANCE, admin).await.unwrap();
    assert!(core.allow_authorization_requests_processing(INSTANCE, "svc"));
    assert!(!core.allow_authorization_requests_processing("not-a-guid", "svc"));
}

#[tokio::test]
async fn upsert_validates_and_replaces() {
    let core = core_on(&MemoryStorage::new(), &[INSTANCE]);
    core.initialize().await.unwrap();

    let mut unknown = reader_at_instance("u1");
    unknown.role_definition_id = role_definition_object_id("00000000-0000-0000-0000-000000000000");
    assert_eq!(core.upsert_role_assignment(INSTANCE, unknown).await.unwrap_err().code_str(), "unknown_role_definition");

    let foreign = RoleAssignment::new("x", role_definition_object_id(READER), "u1", PrincipalType::User, format!("/instances/{}", OTHER));
    assert_eq!(core.upsert_role_assignment(INSTANCE, foreign).await.unwrap_err().http_status(), 400);
    assert!(core.upsert_role_assignment(OTHER, reader_at_instance("u1")).await.unwrap_err().is_not_found());

    let first = core.upsert_role_assignment(INSTANCE, reader_at_instance("u1")).await.unwrap();
    let mut promoted = reader_at_instance("u1");
    promoted.role_definition_id = role_definition_object_id(CONTRIBUTOR);
    let second = core.upsert_role_assignment(INSTANCE, promoted).await.unwrap();
    assert_eq!(second.created_on, first.created_on);

    let all = core.get_role_assignments(INSTANCE).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].role_definition_id, role_definition_object_id(CONTRIBUTOR));

    let write = ActionAuthorizationRequest::new("FoundationaLLM.Agent/agents/write", agent_path(INSTANCE, "X"), "u1");
    assert!(core.authorize(INSTANCE, &write).unwrap());
}

#[tokio::test]
async fn delete_removes_from_document_and_cache() {
    let storage = MemoryStorage::new();
    let core = core_on(&storage, &[INSTANCE]);
    core.initialize().await.unwrap();
    let saved = core.upsert_role_assignment(INSTANCE, reader_at_instance("u1")).await.unwrap();

    core.delete_role_assignment(INSTANCE, &saved.object_id).await.unwrap();
    let read = ActionAuthorizationRequest::new("FoundationaLLM.Agent/agents/read", agent_path(INSTANCE, "X"), "u1");
    assert!(!core.authorize(INSTANCE, &read).unwrap());
    assert!(core.get_role_assignments(INSTANCE).unwrap().is_empty());
    assert_eq!(core.delete_role_assignment(INSTANCE, &saved.object_id).await.unwrap_err().code_str(), "role_assignment_missing");
}

#[tokio::test]
async fn summary_lists_effective_roles() {
    let core = core_on(&MemoryStorage::new(), &[INSTANCE]);
    core.initialize().await.unwrap();
    core.upsert_role_assignment(INSTANCE, reader_at_instance("u1")).await.unwrap();
    let group = RoleAssignment::new("grp", role_definition_object_id(CONTRIBUTOR), "g1", PrincipalType::Group, "/");
    core.upsert_role_assignment(INSTANCE, group).await.unwrap();

    let got = core.roles_with_actions(INSTANCE, "u1", &["g1".to_string()], &agent_path(INSTANCE, "X")).unwrap();
    assert_eq!(got.roles.len(), 2);
    assert!(got.actions.contains("FoundationaLLM.Agent/agents/delete"));
    assert!(!got.actions.contains("FoundationaLLM.Authorization/roleAssignments/write"));
}
