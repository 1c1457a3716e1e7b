//! Authorization integration tests over file-backed role assignment stores:
//! the Reader scenario, group grants, persistence across restarts and the request gate.

use std::sync::Arc;

use anyhow::Result;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use fllm_authz::authz::roles::{role_definition_object_id, CONTRIBUTOR, OWNER, READER};
use fllm_authz::authz::{ActionAuthorizationRequest, AuthorizationCore, PrincipalType, RoleAssignment, RoleAssignmentStore};
use fllm_authz::config::AuthorizationSettings;
use fllm_authz::storage::FileSystemStorage;

const INSTANCE: &str = "6fa496ce-d5c0-4e02-9223-06a98c9c0176";

fn core_at(root: &std::path::Path) -> AuthorizationCore {
    let settings = AuthorizationSettings { instance_ids: vec![INSTANCE.to_string()], ..AuthorizationSettings::default() };
    AuthorizationCore::new(settings, Arc::new(FileSystemStorage::new(root)), CancellationToken::new())
}

fn agent_request(action: &str, principal: &str) -> ActionAuthorizationRequest {
    ActionAuthorizationRequest::new(
        action,
        format!("/instances/{}/providers/FoundationaLLM.Agent/agents/X", INSTANCE),
        principal,
    )
}

#[tokio::test]
async fn reader_at_instance_scope_reads_agents_only() -> Result<()> {
    let tmp = tempdir()?;
    let core = core_at(tmp.path());
    core.initialize().await?;
    let reader = RoleAssignment::new("r1", role_definition_object_id(READER), "alice", PrincipalType::User, format!("/instances/{}", INSTANCE));
    core.upsert_role_assignment(INSTANCE, reader).await?;

    assert!(core.process_authorization_request(INSTANCE, &agent_request("FoundationaLLM.Agent/agents/read", "alice")).authorized);
    assert!(!core.process_authorization_request(INSTANCE, &agent_request("FoundationaLLM.Agent/agents/write", "alice")).authorized);
    assert!(!core.process_authorization_request(INSTANCE, &agent_request("FoundationaLLM.Agent/agents/read", "bob")).authorized);
    Ok(())
}

#[tokio::test]
async fn assignments_survive_restart() -> Result<()> {
    let tmp = tempdir()?;
    {
        let core = core_at(tmp.path());
        core.initialize().await?;
        let owner = RoleAssignment::new("o1", role_definition_object_id(OWNER), "admins", PrincipalType::Group, "/");
        core.upsert_role_assignment(INSTANCE, owner).await?;
    }

    let file = tmp.path().join("role-assignments").join(format!("{}.json", INSTANCE));
    let doc: RoleAssignmentStore = serde_json::from_slice(&std::fs::read(&file)?)?;
    assert_eq!(doc.role_assignments.len(), 1);
    assert_eq!(doc.role_assignments[0].scope, "/");

    let restarted = core_at(tmp.path());
    restarted.initialize().await?;
    let delete = agent_request("FoundationaLLM.Agent/agents/delete", "carol").with_groups(["admins"]);
    assert!(restarted.authorize(INSTANCE, &delete)?);
    assert!(restarted.allow_authorization_requests_processing(INSTANCE, "admins"));
    Ok(())
}

#[tokio::test]
async fn contributor_cannot_manage_role_assignments() -> Result<()> {
    let tmp = tempdir()?;
    let core = core_at(tmp.path());
    core.initialize().await?;
    let contributor = RoleAssignment::new("c1", role_definition_object_id(CONTRIBUTOR), "dave", PrincipalType::User, "/");
    core.upsert_role_assignment(INSTANCE, contributor).await?;

    let path = format!("/instances/{}/providers/FoundationaLLM.Authorization/roleAssignments", INSTANCE);
    let read = ActionAuthorizationRequest::new("FoundationaLLM.Authorization/roleAssignments/read", path.as_str(), "dave");
    let write = ActionAuthorizationRequest::new("FoundationaLLM.Authorization/roleAssignments/write", path.as_str(), "dave");
    assert!(core.authorize(INSTANCE, &read)?);
    assert!(!core.authorize(INSTANCE, &write)?);
    assert!(core.allow_authorization_requests_processing(INSTANCE, "dave"));
    Ok(())
}

#[tokio::test]
async fn hand_edited_document_with_unknown_role_is_tolerated() -> Result<()> {
    let tmp = tempdir()?;
    let dir = tmp.path().join("role-assignments");
    std::fs::create_dir_all(&dir)?;
    let doc = serde_json::json!({
        "instance_id": INSTANCE,
        "role_assignments": [
            {
                "name": "ghost",
                "object_id": "/ra/ghost",
                "role_definition_id": "/providers/FoundationaLLM.Authorization/roleDefinitions/ffffffff-ffff-ffff-ffff-ffffffffffff",
                "principal_id": "erin",
                "principal_type": "User",
                "scope": "/"
            },
            {
                "name": "reader",
                "object_id": "/ra/reader",
                "role_definition_id": role_definition_object_id(READER),
                "principal_id": "erin",
                "principal_type": "User",
                "scope": format!("/instances/{}/providers/FoundationaLLM.Agent/agents", INSTANCE)
            }
        ]
    });
    std::fs::write(dir.join(format!("{}.json", INSTANCE)), serde_json::to_vec(&doc)?)?;

    let core = core_at(tmp.path());
    core.initialize().await?;
    assert_eq!(core.get_role_assignments(INSTANCE)?.len(), 2);

    let list = ActionAuthorizationRequest::new(
        "FoundationaLLM.Agent/agents/read",
        format!("/instances/{}/providers/FoundationaLLM.Agent/agents", INSTANCE),
        "erin",
    );
    assert!(core.authorize(INSTANCE, &list)?);
    assert!(!core.authorize(INSTANCE, &agent_request("FoundationaLLM.Agent/agents/write", "erin"))?);
    Ok(())
}
