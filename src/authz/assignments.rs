//! Role assignments, the per-instance store document and the lookup cache.
//!
//! The store is persisted as one JSON document per instance
//! (`{ "instance_id": ..., "role_assignments": [...] }`). Derived fields (parsed scope,
//! effective actions) are not persisted; `enrich_role_assignments` recomputes them after
//! every load.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::request::parse_for_role_assignment_scope;
use super::roles::get_role_definition;
use crate::error::{AppError, AppResult};
use crate::resource::ResourcePath;

pub const ROLE_ASSIGNMENT_TYPE: &str = "FoundationaLLM.Authorization/roleAssignments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrincipalType {
    User,
    Group,
    ServicePrincipal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub name: String,
    #[serde(rename = "type", default = "role_assignment_type")]
    pub resource_type: String,
    #[serde(default)]
    pub object_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub role_definition_id: String,
    pub principal_id: String,
    pub principal_type: PrincipalType,
    pub scope: String,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,

    #[serde(skip)]
    scope_resource_path: Option<ResourcePath>,
    #[serde(skip)]
    allowed_actions: BTreeSet<&'static str>,
}

fn role_assignment_type() -> String { ROLE_ASSIGNMENT_TYPE.to_string() }

impl PartialEq for RoleAssignment {
    // Calculated fields follow from the persisted ones.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.resource_type == other.resource_type
            && self.object_id == other.object_id
            && self.display_name == other.display_name
            && self.description == other.description
            && self.role_definition_id == other.role_definition_id
            && self.principal_id == other.principal_id
            && self.principal_type == other.principal_type
            && self.scope == other.scope
            && self.created_on == other.created_on
            && self.updated_on == other.updated_on
            && self.created_by == other.created_by
            && self.updated_by == other.updated_by
    }
}

impl RoleAssignment {
    pub fn new<N: Into<String>, R: Into<String>, P: Into<String>, S: Into<String>>(
        name: N,
        role_definition_id: R,
        principal_id: P,
        principal_type: PrincipalType,
        scope: S,
    ) -> Self {
        Self {
            name: name.into(),
            resource_type: role_assignment_type(),
            object_id: String::new(),
            display_name: None,
            description: None,
            role_definition_id: role_definition_id.into(),
            principal_id: principal_id.into(),
            principal_type,
            scope: scope.into(),
            created_on: None,
            updated_on: None,
            created_by: None,
            updated_by: None,
            scope_resource_path: None,
            allowed_actions: BTreeSet::new(),
        }
    }

    /// Parsed scope; `None` until enriched.
    pub fn scope_resource_path(&self) -> Option<&ResourcePath> { self.scope_resource_path.as_ref() }

    /// Effective actions of the referenced role definition; empty until enriched or when
    /// the definition is unknown.
    pub fn allowed_actions(&self) -> &BTreeSet<&'static str> { &self.allowed_actions }

    pub fn allows(&self, action: &str) -> bool { self.allowed_actions.contains(action) }

    /// Parse the scope against `instance_id` and resolve the role definition.
    pub fn enrich(&mut self, instance_id: &str) -> AppResult<()> {
        let scope = parse_for_role_assignment_scope(&self.scope, &[instance_id])?;
        if let Some(scope_instance) = scope.instance_id() {
            if !scope_instance.eq_ignore_ascii_case(instance_id) {
                return Err(AppError::user(
                    "invalid_role_assignment",
                    format!("The scope of role assignment [{}] does not belong to instance [{}].", self.name, instance_id),
                ));
            }
        }

        self.allowed_actions = match get_role_definition(&self.role_definition_id) {
            Some(def) => def.get_allowed_actions(),
            None => {
                warn!(target: "fllm::authz", "role assignment [{}] references unknown role definition [{}]", self.name, self.role_definition_id);
                BTreeSet::new()
            }
        };
        self.scope_resource_path = Some(scope);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignmentStore {
    pub instance_id: String,
    #[serde(default)]
    pub role_assignments: Vec<RoleAssignment>,
}

impl RoleAssignmentStore {
    pub fn new<S: Into<String>>(instance_id: S) -> Self {
        Self { instance_id: instance_id.into(), role_assignments: Vec::new() }
    }

    /// Enrich every assignment; entries that fail validation are logged and dropped.
    pub fn enrich_role_assignments(&mut self) {
        let instance_id = self.instance_id.clone();
        self.role_assignments.retain_mut(|ra| match ra.enrich(&instance_id) {
            Ok(()) => true,
            Err(e) => {
                error!(target: "fllm::authz", "dropping role assignment [{}] for instance [{}]: {}", ra.name, instance_id, e);
                false
            }
        });
    }
}

/// Enriched assignments indexed by principal id and by object id.
#[derive(Debug, Default)]
pub struct RoleAssignmentCache {
    by_principal: HashMap<String, Vec<RoleAssignment>>,
    by_object_id: HashMap<String, RoleAssignment>,
}

impl RoleAssignmentCache {
    pub fn new(store: &RoleAssignmentStore) -> Self {
        let mut cache = Self::default();
        for ra in &store.role_assignments {
            cache.add_or_update_role_assignment(ra.clone());
        }
        cache
    }

    pub fn add_or_update_role_assignment(&mut self, assignment: RoleAssignment) {
        // An object id may move to a different principal on update.
        if let Some(previous) = self.by_object_id.get(&assignment.object_id) {
            if previous.principal_id != assignment.principal_id {
                let previous_principal = previous.principal_id.clone();
                self.remove_from_principal(&previous_principal, &assignment.object_id);
            }
        }

        let list = self.by_principal.entry(assignment.principal_id.clone()).or_default();
        match list.iter_mut().find(|ra| ra.object_id == assignment.object_id) {
            Some(slot) => *slot = assignment.clone(),
            None => list.push(assignment.clone()),
        }
        self.by_object_id.insert(assignment.object_id.clone(), assignment);
    }

    pub fn remove_role_assignment(&mut self, object_id: &str) -> Option<RoleAssignment> {
        let removed = self.by_object_id.remove(object_id)?;
        self.remove_from_principal(&removed.principal_id, object_id);
        Some(removed)
    }

    pub fn get_role_assignments(&self, principal_id: &str) -> &[RoleAssignment] {
        self.by_principal.get(principal_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_role_assignment(&self, object_id: &str) -> Option<&RoleAssignment> { self.by_object_id.get(object_id) }

    pub fn len(&self) -> usize { self.by_object_id.len() }
    pub fn is_empty(&self) -> bool { self.by_object_id.is_empty() }

    fn remove_from_principal(&mut self, principal_id: &str, object_id: &str) {
        if let Some(list) = self.by_principal.get_mut(principal_id) {
            list.retain(|ra| ra.object_id != object_id);
            if list.is_empty() {
                self.by_principal.remove(principal_id);
            }
        }
    }
}

#[cfg(test)]
#[path = "assignments_tests.rs"]
mod assignments_tests;
