//! Decision logic over an instance's role assignment cache.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::assignments::{RoleAssignment, RoleAssignmentCache};
use super::request::ActionAuthorizationRequest;
use super::roles::get_role_definition;
use crate::resource::ResourcePath;

/// Assignments held by any of `object_ids` whose scope applies at `resource_path`.
/// Assignments pointing at an unknown role definition are skipped with a warning.
fn applicable<'a, I>(cache: &'a RoleAssignmentCache, resource_path: &'a ResourcePath, object_ids: I) -> impl Iterator<Item = &'a RoleAssignment>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: 'a,
{
    object_ids
        .into_iter()
        .flat_map(move |id| cache.get_role_assignments(id).iter())
        .filter(|ra| {
            if get_role_definition(&ra.role_definition_id).is_none() {
                warn!(target: "fllm::authz", "role assignment [{}] references invalid role definition [{}]", ra.name, ra.role_definition_id);
                return false;
            }
            true
        })
        .filter(move |ra| ra.scope_resource_path().map_or(false, |scope| resource_path.includes_resource_path(scope)))
}

/// True when one applicable assignment of the principal or one of its groups grants the action.
pub fn action_allowed(cache: &RoleAssignmentCache, resource_path: &ResourcePath, request: &ActionAuthorizationRequest) -> bool {
    if let Some(ra) = applicable(cache, resource_path, request.object_ids()).find(|ra| ra.allows(&request.action)) {
        debug!(target: "fllm::authz", "action {} on {} granted to {} by role assignment [{}]", request.action, resource_path, request.principal_id, ra.name);
        return true;
    }
    warn!(
        target: "fllm::authz",
        "The action {} is not allowed on the resource {} for the principal {}.",
        request.action, resource_path, request.principal_id
    );
    false
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RolesWithActions {
    /// Display names of the granting role definitions, deduplicated.
    pub roles: BTreeSet<String>,
    pub actions: BTreeSet<&'static str>,
}

/// Everything the principal (and its groups) may do at `resource_path`.
pub fn roles_with_actions<'a, I>(cache: &'a RoleAssignmentCache, resource_path: &'a ResourcePath, object_ids: I) -> RolesWithActions
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: 'a,
{
    let mut out = RolesWithActions::default();
    for ra in applicable(cache, resource_path, object_ids) {
        if let Some(def) = get_role_definition(&ra.role_definition_id) {
            out.roles.insert(def.display_name.clone());
        }
        out.actions.extend(ra.allowed_actions().iter().copied());
    }
    out
}
