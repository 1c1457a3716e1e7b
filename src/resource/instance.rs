use std::fmt;

use serde::{Deserialize, Serialize};

/// One `{type}[/{id}][/{action}]` segment of a parsed resource path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceTypeInstance {
    resource_type: String,
    resource_id: Option<String>,
    action: Option<String>,
}

impl ResourceTypeInstance {
    pub fn new<T: Into<String>>(resource_type: T) -> Self {
        Self { resource_type: resource_type.into(), resource_id: None, action: None }
    }

    pub fn with_resource_id<T: Into<String>>(mut self, id: T) -> Self { self.resource_id = Some(id.into()); self }
    pub fn with_action<T: Into<String>>(mut self, action: T) -> Self { self.action = Some(action.into()); self }

    pub fn resource_type(&self) -> &str { &self.resource_type }
    pub fn resource_id(&self) -> Option<&str> { self.resource_id.as_deref() }
    pub fn action(&self) -> Option<&str> { self.action.as_deref() }

    /// Whether this segment, used as a scope, covers `other`.
    /// A segment without id covers only segments without id; a segment with an id covers
    /// the bare type and the same id. Actions narrow: a segment without action never
    /// covers one that carries an action.
    pub fn includes(&self, other: &ResourceTypeInstance) -> bool {
        if self.resource_type != other.resource_type {
            return false;
        }
        match (&self.resource_id, &self.action) {
            (None, None) => other.resource_id.is_none() && other.action.is_none(),
            (None, Some(a)) => other.resource_id.is_none() && other.action.as_ref().map_or(true, |oa| oa == a),
            (Some(id), None) => other.action.is_none() && other.resource_id.as_ref().map_or(true, |oid| oid == id),
            (Some(id), Some(a)) => match &other.action {
                None => other.resource_id.as_ref().map_or(true, |oid| oid == id),
                Some(oa) => oa == a && other.resource_id.as_ref() == Some(id),
            },
        }
    }

    /// `{type}[/{id}]`, the form used in object ids.
    pub(crate) fn object_id_segment(&self) -> String {
        match &self.resource_id {
            Some(id) => format!("{}/{}", self.resource_type, id),
            None => self.resource_type.clone(),
        }
    }
}

impl fmt::Display for ResourceTypeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object_id_segment())?;
        if let Some(a) = &self.action {
            write!(f, "/{}", a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod instance_tests;
