//! Resource path parsing and scope containment.
//!
//! Grammar: `/` (root) or
//! `/instances/{guid}/providers/{provider}/{type}[/{id}][/{action}][/{subType}/{subId}[/{action}]]...`.
//! The instance and provider prefixes are optional when the caller already knows them,
//! but a provider is mandatory once an instance id is present. Whether a token after a
//! type name is a resource id or an action is decided by looking it up in the type's
//! action list first.

use std::fmt;

use tracing::debug;

use super::descriptor::ResourceTypeMap;
use super::instance::ResourceTypeInstance;
use super::names::{is_known_provider, INSTANCE_TOKEN, RESOURCE_PROVIDER_TOKEN};
use crate::error::{AppError, AppResult};

/// First rule a path string broke; only used for diagnostics, callers see one error kind.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Violation {
    Blank,
    EmptyToken,
    MissingInstanceId,
    InvalidInstanceId,
    MissingProviderName,
    ProviderNotAllowed(String),
    ProviderRequired,
    NoResourceType,
    UnknownResourceType(String),
    ActionNotAllowed(String),
    TokensAfterAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    instance_id: Option<String>,
    resource_provider: Option<String>,
    resource_type_instances: Vec<ResourceTypeInstance>,
    is_root_path: bool,
}

fn invalid_path(path: &str) -> AppError {
    AppError::user("invalid_resource_path", format!("The resource path [{}] is invalid.", path))
}

fn path_tokens(path: &str) -> Result<Vec<&str>, Violation> {
    if path.trim().is_empty() {
        return Err(Violation::Blank);
    }
    let stripped = path.strip_prefix('/').unwrap_or(path);
    let tokens: Vec<&str> = stripped.split('/').map(str::trim).collect();
    if tokens.iter().any(|t| t.is_empty()) {
        return Err(Violation::EmptyToken);
    }
    Ok(tokens)
}

fn is_guid(s: &str) -> bool { uuid::Uuid::parse_str(s).is_ok() }

impl ResourcePath {
    pub fn root() -> Self {
        Self { instance_id: None, resource_provider: None, resource_type_instances: Vec::new(), is_root_path: true }
    }

    /// Parse and validate `path` against the provider allow-list and the type schema.
    /// Actions are only accepted when `allow_action` is set and the schema permits them
    /// at the position where they appear.
    pub fn parse<P: AsRef<str>>(
        path: &str,
        allowed_providers: &[P],
        allowed_types: &ResourceTypeMap,
        allow_action: bool,
    ) -> AppResult<Self> {
        Self::parse_inner(path, allowed_providers, allowed_types, allow_action).map_err(|v| {
            debug!(target: "fllm::resource_path", "rejected resource path [{}]: {:?}", path, v);
            invalid_path(path)
        })
    }

    pub fn try_parse<P: AsRef<str>>(
        path: &str,
        allowed_providers: &[P],
        allowed_types: &ResourceTypeMap,
        allow_action: bool,
    ) -> Option<Self> {
        Self::parse_inner(path, allowed_providers, allowed_types, allow_action).ok()
    }

    fn parse_inner<P: AsRef<str>>(
        path: &str,
        allowed_providers: &[P],
        allowed_types: &ResourceTypeMap,
        allow_action: bool,
    ) -> Result<Self, Violation> {
        if path == "/" {
            return Ok(Self::root());
        }

        let tokens = path_tokens(path)?;
        let mut instance_id = None;
        let mut resource_provider = None;
        let mut idx = 0usize;

        if tokens[0] == INSTANCE_TOKEN {
            let id = tokens.get(1).ok_or(Violation::MissingInstanceId)?;
            if !is_guid(id) {
                return Err(Violation::InvalidInstanceId);
            }
            instance_id = Some(id.to_string());
            idx = 2;
        }

        if idx >= tokens.len() {
            return Ok(Self { instance_id, resource_provider, resource_type_instances: Vec::new(), is_root_path: false });
        }

        if tokens[idx] == RESOURCE_PROVIDER_TOKEN {
            let name = tokens.get(idx + 1).ok_or(Violation::MissingProviderName)?;
            if !allowed_providers.iter().any(|p| p.as_ref() == *name) {
                return Err(Violation::ProviderNotAllowed(name.to_string()));
            }
            resource_provider = Some(name.to_string());
            idx += 2;
        } else if idx != 0 {
            return Err(Violation::ProviderRequired);
        }

        if idx >= tokens.len() {
            return Err(Violation::NoResourceType);
        }

        let mut segments = Vec::new();
        let mut current = allowed_types;
        while idx < tokens.len() {
            let type_name = tokens[idx];
            let descriptor = current.get(type_name).ok_or_else(|| Violation::UnknownResourceType(type_name.to_string()))?;
            let segment = ResourceTypeInstance::new(type_name);

            let Some(next) = tokens.get(idx + 1) else {
                segments.push(segment);
                break;
            };

            if let Some(action) = descriptor.find_action(next) {
                if !allow_action || !action.allowed_on_resource_type {
                    return Err(Violation::ActionNotAllowed(action.name.clone()));
                }
                if idx + 2 != tokens.len() {
                    return Err(Violation::TokensAfterAction);
                }
                segments.push(segment.with_action(*next));
                break;
            }

            let segment = segment.with_resource_id(*next);
            if let Some(after) = tokens.get(idx + 2) {
                if let Some(action) = descriptor.find_action(after) {
                    if !allow_action || !action.allowed_on_resource {
                        return Err(Violation::ActionNotAllowed(action.name.clone()));
                    }
                    if idx + 3 != tokens.len() {
                        return Err(Violation::TokensAfterAction);
                    }
                    segments.push(segment.with_action(*after));
                    break;
                }
            }

            segments.push(segment);
            current = &descriptor.sub_types;
            idx += 2;
        }

        Ok(Self { instance_id, resource_provider, resource_type_instances: segments, is_root_path: false })
    }

    pub fn instance_id(&self) -> Option<&str> { self.instance_id.as_deref() }
    pub fn resource_provider(&self) -> Option<&str> { self.resource_provider.as_deref() }
    pub fn resource_type_instances(&self) -> &[ResourceTypeInstance] { &self.resource_type_instances }
    pub fn is_root_path(&self) -> bool { self.is_root_path }

    /// Last segment names a type without a resource id (a listing path).
    pub fn is_resource_type_path(&self) -> bool {
        self.resource_type_instances.last().map_or(false, |s| s.resource_id().is_none())
    }

    pub fn main_resource_type(&self) -> Option<&str> { self.resource_type_instances.first().map(|s| s.resource_type()) }

    /// `/instances/{id}` with nothing after it.
    pub fn is_instance_path(&self) -> bool {
        !self.is_root_path && self.instance_id.is_some() && self.resource_provider.is_none() && self.resource_type_instances.is_empty()
    }

    /// Canonical object id `/instances/{i}/providers/{p}/{type}[/{id}]...` (actions excluded).
    /// A path without instance and provider needs both supplied by the caller; a path
    /// carrying either must carry both itself.
    pub fn get_object_id(&self, instance_id: Option<&str>, resource_provider: Option<&str>) -> AppResult<String> {
        let (instance, provider) = match (&self.instance_id, &self.resource_provider) {
            (None, None) => match (instance_id, resource_provider) {
                (Some(i), Some(p)) if !self.resource_type_instances.is_empty() => (i, p),
                _ => {
                    return Err(AppError::user(
                        "invalid_object_id",
                        "The resource path cannot be converted to a fully qualified resource identifier.",
                    ))
                }
            },
            (Some(i), Some(p)) if !self.resource_type_instances.is_empty() => (i.as_str(), p.as_str()),
            _ => {
                return Err(AppError::user(
                    "invalid_object_id",
                    "The resource path does not represent a fully qualified resource identifier.",
                ))
            }
        };
        let segments: Vec<String> = self.resource_type_instances.iter().map(|s| s.object_id_segment()).collect();
        Ok(format!("/{}/{}/{}/{}/{}", INSTANCE_TOKEN, instance, RESOURCE_PROVIDER_TOKEN, provider, segments.join("/")))
    }

    pub fn object_id(instance_id: &str, resource_provider: &str, resource_type: &str, resource_name: &str) -> String {
        format!("/{}/{}/{}/{}/{}/{}", INSTANCE_TOKEN, instance_id, RESOURCE_PROVIDER_TOKEN, resource_provider, resource_type, resource_name)
    }

    /// Instance id of `path` when it starts with `instances/{guid}`; no schema needed.
    pub fn try_parse_instance_id(path: &str) -> Option<String> {
        let tokens = path_tokens(path).ok()?;
        match (tokens.first(), tokens.get(1)) {
            (Some(&INSTANCE_TOKEN), Some(id)) if is_guid(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Provider name of `path` when it is one the platform recognizes.
    pub fn try_parse_resource_provider(path: &str) -> Option<String> {
        let tokens = path_tokens(path).ok()?;
        let start = if tokens[0] == INSTANCE_TOKEN { 2 } else { 0 };
        match (tokens.get(start), tokens.get(start + 1)) {
            (Some(&RESOURCE_PROVIDER_TOKEN), Some(name)) if is_known_provider(name) => Some(name.to_string()),
            _ => None,
        }
    }

    /// Scope containment: does an assignment scoped at `self` apply to `other`?
    pub fn includes_resource_path(&self, other: &ResourcePath) -> bool {
        if self.is_root_path {
            return other.is_root_path;
        }

        if self.is_instance_path() {
            if other.is_root_path {
                return true;
            }
            if other.is_instance_path() {
                return match (&self.instance_id, &other.instance_id) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    (a, b) => a == b,
                };
            }
        }

        if other.is_root_path || other.is_instance_path() {
            return true;
        }

        if other.resource_type_instances.len() > self.resource_type_instances.len() {
            return false;
        }

        self.resource_type_instances
            .iter()
            .zip(other.resource_type_instances.iter())
            .all(|(mine, theirs)| mine.includes(theirs))
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root_path {
            return write!(f, "/");
        }
        if let Some(i) = &self.instance_id {
            write!(f, "/{}/{}", INSTANCE_TOKEN, i)?;
        }
        if let Some(p) = &self.resource_provider {
            write!(f, "/{}/{}", RESOURCE_PROVIDER_TOKEN, p)?;
        }
        for s in &self.resource_type_instances {
            write!(f, "/{}", s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod path_tests;
