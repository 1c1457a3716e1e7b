//! Role definitions: permission blocks, effective action sets and the built-in roles.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::actions::get_matching_actions;

pub const ROLE_DEFINITION_TYPE: &str = "FoundationaLLM.Authorization/roleDefinitions";

pub const RBAC_ADMINISTRATOR: &str = "17ca4b59-3aee-497d-b43b-95dd7d916f99";
pub const READER: &str = "00a53e72-f66e-4c03-8f81-7e885fd2eb35";
pub const CONTRIBUTOR: &str = "a9f0020f-6e3a-49bf-8d1d-35fd53058edf";
pub const USER_ACCESS_ADMINISTRATOR: &str = "fb8e0fd0-f7e2-4957-89d6-19f44f7d6618";
pub const OWNER: &str = "1301f8d4-3bea-4880-945f-315dbd2ddb46";
pub const ATTACHMENTS_CONTRIBUTOR: &str = "8e77fb6a-7a78-43e1-b628-d9e2285fe25a";

/// `/providers/FoundationaLLM.Authorization/roleDefinitions/{guid}`
pub fn role_definition_object_id(guid: &str) -> String { format!("/providers/{}/{}", ROLE_DEFINITION_TYPE, guid) }

/// One allow/deny block. Every entry may be a wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleDefinitionPermissions {
    pub actions: Vec<String>,
    pub not_actions: Vec<String>,
    pub data_actions: Vec<String>,
    pub not_data_actions: Vec<String>,
}

fn expand(patterns: &[String]) -> BTreeSet<&'static str> {
    patterns.iter().flat_map(|p| get_matching_actions(p)).collect()
}

impl RoleDefinitionPermissions {
    pub fn allow(actions: &[&str]) -> Self {
        Self { actions: actions.iter().map(|s| s.to_string()).collect(), ..Self::default() }
    }

    pub fn deny(mut self, not_actions: &[&str]) -> Self {
        self.not_actions.extend(not_actions.iter().map(|s| s.to_string()));
        self
    }

    /// ((actions - not_actions) + data_actions) - not_data_actions, each list expanded first.
    /// Deny lists only act on this block.
    pub fn get_allowed_actions(&self) -> BTreeSet<&'static str> {
        let not_actions = expand(&self.not_actions);
        let mut allowed: BTreeSet<&'static str> = expand(&self.actions).difference(&not_actions).copied().collect();
        allowed.extend(expand(&self.data_actions));
        let not_data_actions = expand(&self.not_data_actions);
        allowed.retain(|a| !not_data_actions.contains(a));
        allowed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub object_id: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub assignable_scopes: Vec<String>,
    pub permissions: Vec<RoleDefinitionPermissions>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl RoleDefinition {
    /// Union of every block's effective actions.
    pub fn get_allowed_actions(&self) -> BTreeSet<&'static str> {
        self.permissions.iter().flat_map(|p| p.get_allowed_actions()).collect()
    }
}

fn built_in(guid: &str, display_name: &str, description: &str, permissions: RoleDefinitionPermissions) -> RoleDefinition {
    let seeded = Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).single().unwrap_or_default();
    RoleDefinition {
        name: guid.to_string(),
        resource_type: ROLE_DEFINITION_TYPE.to_string(),
        object_id: role_definition_object_id(guid),
        display_name: display_name.to_string(),
        description: Some(description.to_string()),
        assignable_scopes: vec!["/".to_string()],
        permissions: vec![permissions],
        created_on: seeded,
        updated_on: seeded,
        created_by: None,
        updated_by: None,
    }
}

static BUILT_IN: Lazy<BTreeMap<String, RoleDefinition>> = Lazy::new(|| {
    let roles = [
        built_in(
            RBAC_ADMINISTRATOR,
            "Role Based Access Control Administrator",
            "Manage access to FoundationaLLM resources by assigning roles using FoundationaLLM RBAC.",
            RoleDefinitionPermissions::allow(&[
                "FoundationaLLM.Authorization/roleAssignments/read",
                "FoundationaLLM.Authorization/roleAssignments/write",
                "FoundationaLLM.Authorization/roleAssignments/delete",
                "FoundationaLLM.Authorization/roleDefinitions/read",
            ]),
        ),
        built_in(
            READER,
            "Reader",
            "View all resources without the possiblity of making any changes.",
            RoleDefinitionPermissions::allow(&["*/read"]),
        ),
        built_in(
            CONTRIBUTOR,
            "Contributor",
            "Full access to manage all resources without the possiblity of assigning roles in FoundationaLLM RBAC.",
            RoleDefinitionPermissions::allow(&["*"])
                .deny(&["FoundationaLLM.Authorization/*/write", "FoundationaLLM.Authorization/*/delete"]),
        ),
        built_in(
            USER_ACCESS_ADMINISTRATOR,
            "User Access Administrator",
            "Manage access to FoundationaLLM resources.",
            RoleDefinitionPermissions::allow(&["*/read", "FoundationaLLM.Authorization/*"]),
        ),
        built_in(
            OWNER,
            "Owner",
            "Full access to manage all resources, including the ability to assign roles in FoundationaLLM RBAC.",
            RoleDefinitionPermissions::allow(&["*"]),
        ),
        built_in(
            ATTACHMENTS_CONTRIBUTOR,
            "Attachments Contributor",
            "Upload attachments including uploading to Azure OpenAI file store.",
            RoleDefinitionPermissions::allow(&[
                "FoundationaLLM.Attachment/attachments/read",
                "FoundationaLLM.Attachment/attachments/write",
                "FoundationaLLM.AzureOpenAI/assistantUserContexts/read",
                "FoundationaLLM.AzureOpenAI/assistantUserContexts/write",
                "FoundationaLLM.AzureOpenAI/fileUserContexts/read",
                "FoundationaLLM.AzureOpenAI/fileUserContexts/write",
                "FoundationaLLM.Configuration/apiEndpointConfigurations/read",
                "FoundationaLLM.AIModel/aiModels/read",
            ]),
        ),
    ];
    roles.into_iter().map(|r| (r.object_id.clone(), r)).collect()
});

/// Built-in roles keyed by object id.
pub fn built_in_role_definitions() -> &'static BTreeMap<String, RoleDefinition> { &BUILT_IN }

pub fn get_role_definition(object_id: &str) -> Option<&'static RoleDefinition> { BUILT_IN.get(object_id) }

#[cfg(test)]
#[path = "roles_tests.rs"]
mod roles_tests;
