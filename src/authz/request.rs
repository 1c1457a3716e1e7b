//! Authorization request shapes and the path parsing rules applied to them.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::resource::metadata::allowed_resource_types;
use crate::resource::ResourcePath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAuthorizationRequest {
    pub action: String,
    pub resource_path: String,
    pub principal_id: String,
    #[serde(default)]
    pub security_group_ids: Option<Vec<String>>,
}

impl ActionAuthorizationRequest {
    pub fn new<A: Into<String>, R: Into<String>, P: Into<String>>(action: A, resource_path: R, principal_id: P) -> Self {
        Self { action: action.into(), resource_path: resource_path.into(), principal_id: principal_id.into(), security_group_ids: None }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security_group_ids = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Principal id first, then group ids in request order.
    pub fn object_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.principal_id.as_str())
            .chain(self.security_group_ids.iter().flatten().map(String::as_str))
    }

    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.action.trim().is_empty() {
            return Err(AppError::user("invalid_authorization_request", "The action must not be empty."));
        }
        if self.resource_path.trim().is_empty() {
            return Err(AppError::user("invalid_authorization_request", "The resource path must not be empty."));
        }
        if self.principal_id.trim().is_empty() {
            return Err(AppError::user("invalid_authorization_request", "The principal id must not be empty."));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAuthorizationResult {
    pub authorized: bool,
}

impl ActionAuthorizationResult {
    pub fn denied() -> Self { Self { authorized: false } }
}

/// Target path of an authorization request: must name a served instance, root is rejected.
pub fn parse_for_authorization_request<S: AsRef<str>>(path: &str, allowed_instance_ids: &[S]) -> AppResult<ResourcePath> {
    parse_scoped(path, allowed_instance_ids, false)
}

/// Scope of a role assignment: a served instance path or deeper, or the root `/`.
pub fn parse_for_role_assignment_scope<S: AsRef<str>>(path: &str, allowed_instance_ids: &[S]) -> AppResult<ResourcePath> {
    parse_scoped(path, allowed_instance_ids, true)
}

fn parse_scoped<S: AsRef<str>>(path: &str, allowed_instance_ids: &[S], allow_root: bool) -> AppResult<ResourcePath> {
    if path == "/" {
        return if allow_root {
            Ok(ResourcePath::root())
        } else {
            Err(AppError::user("invalid_resource_path", "A root resource path is not allowed in this context."))
        };
    }

    let served = ResourcePath::try_parse_instance_id(path)
        .map_or(false, |id| allowed_instance_ids.iter().any(|a| a.as_ref().eq_ignore_ascii_case(&id)));
    if !served {
        return Err(AppError::user(
            "invalid_resource_path",
            "The resource path does not contain a valid FoundationaLLM instance identifier.",
        ));
    }

    // The provider is detected from the path itself and its schema is used for validation.
    match ResourcePath::try_parse_resource_provider(path) {
        Some(provider) => ResourcePath::parse(path, &[provider.as_str()], allowed_resource_types(&provider), false),
        None => ResourcePath::parse::<&str>(path, &[], allowed_resource_types(""), false),
    }
}
