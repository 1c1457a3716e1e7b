//! Role based access control: the action catalog, role definitions, role assignments
//! and the per-instance authorization engine.

pub mod actions;
mod assignments;
mod engine;
mod evaluator;
mod request;
pub mod roles;

pub use actions::{get_matching_actions, AuthorizableAction};
pub use assignments::{PrincipalType, RoleAssignment, RoleAssignmentCache, RoleAssignmentStore};
pub use engine::AuthorizationCore;
pub use evaluator::{action_allowed, roles_with_actions, RolesWithActions};
pub use request::{parse_for_authorization_request, parse_for_role_assignment_scope, ActionAuthorizationRequest, ActionAuthorizationResult};
pub use roles::{get_role_definition, RoleDefinition, RoleDefinitionPermissions};
