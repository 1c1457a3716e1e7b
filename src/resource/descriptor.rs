//! Resource type schema: which types, sub-types and actions a provider accepts.
//! Descriptors are plain values assembled with builder methods at registry
//! initialisation and never mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// One accepted HTTP method with its query parameters and payload/result type names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedTypes {
    pub method: HttpMethod,
    pub parameters: Vec<String>,
    pub payload_types: Vec<String>,
    pub result_types: Vec<String>,
}

impl AllowedTypes {
    pub fn new(method: HttpMethod) -> Self {
        Self { method, parameters: Vec::new(), payload_types: Vec::new(), result_types: Vec::new() }
    }

    pub fn get(result: &str) -> Self { Self::new(HttpMethod::Get).returns(result) }
    pub fn post(payload: &str, result: &str) -> Self { Self::new(HttpMethod::Post).accepts(payload).returns(result) }
    pub fn delete() -> Self { Self::new(HttpMethod::Delete) }

    pub fn with_parameter(mut self, p: &str) -> Self { self.parameters.push(p.to_string()); self }
    pub fn accepts(mut self, t: &str) -> Self { if !t.is_empty() { self.payload_types.push(t.to_string()); } self }
    pub fn returns(mut self, t: &str) -> Self { if !t.is_empty() { self.result_types.push(t.to_string()); } self }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTypeAction {
    pub name: String,
    /// Valid right after a resource id (`.../agents/MyAgent/purge`).
    pub allowed_on_resource: bool,
    /// Valid right after the type name (`.../agents/checkname`).
    pub allowed_on_resource_type: bool,
    pub allowed_types: Vec<AllowedTypes>,
}

impl ResourceTypeAction {
    pub fn new(name: &str, allowed_on_resource: bool, allowed_on_resource_type: bool) -> Self {
        Self { name: name.to_string(), allowed_on_resource, allowed_on_resource_type, allowed_types: Vec::new() }
    }

    pub fn on_resource(name: &str) -> Self { Self::new(name, true, false) }
    pub fn on_resource_type(name: &str) -> Self { Self::new(name, false, true) }

    pub fn with_allowed_types(mut self, t: AllowedTypes) -> Self { self.allowed_types.push(t); self }
}

pub type ResourceTypeMap = BTreeMap<String, ResourceTypeDescriptor>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTypeDescriptor {
    pub resource_type: String,
    pub allowed_types: Vec<AllowedTypes>,
    pub actions: Vec<ResourceTypeAction>,
    pub sub_types: ResourceTypeMap,
}

impl ResourceTypeDescriptor {
    pub fn new(resource_type: &str) -> Self {
        Self { resource_type: resource_type.to_string(), allowed_types: Vec::new(), actions: Vec::new(), sub_types: BTreeMap::new() }
    }

    /// Standard get/upsert/delete triple for a resource type holding `model` values.
    pub fn crud(resource_type: &str, model: &str) -> Self {
        Self::new(resource_type)
            .with_allowed_types(AllowedTypes::get(&format!("ResourceProviderGetResult<{}>", model)))
            .with_allowed_types(AllowedTypes::post(model, "ResourceProviderUpsertResult"))
            .with_allowed_types(AllowedTypes::delete())
    }

    pub fn with_allowed_types(mut self, t: AllowedTypes) -> Self { self.allowed_types.push(t); self }
    pub fn with_action(mut self, a: ResourceTypeAction) -> Self { self.actions.push(a); self }

    pub fn with_sub_type(mut self, d: ResourceTypeDescriptor) -> Self {
        self.sub_types.insert(d.resource_type.clone(), d);
        self
    }

    pub fn find_action(&self, name: &str) -> Option<&ResourceTypeAction> { self.actions.iter().find(|a| a.name == name) }
}

/// Build a type map from descriptors, keyed by their type names.
pub fn type_map<I: IntoIterator<Item = ResourceTypeDescriptor>>(descriptors: I) -> ResourceTypeMap {
    descriptors.into_iter().map(|d| (d.resource_type.clone(), d)).collect()
}
