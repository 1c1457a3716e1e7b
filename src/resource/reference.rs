//! Resource reference records kept by resource providers to locate their resources in storage.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named pointer to a stored resource, soft-deletable.
pub trait ResourceReference: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Unique key within the owning provider.
    fn name(&self) -> &str;
    fn deleted(&self) -> bool;
    fn set_deleted(&mut self, deleted: bool);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReferenceRecord {
    pub name: String,
    #[serde(default)]
    pub object_id: Option<String>,
    /// Location of the resource document inside the provider's storage container.
    pub filename: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub deleted: bool,
}

impl ResourceReferenceRecord {
    pub fn new<N: Into<String>, F: Into<String>, T: Into<String>>(name: N, filename: F, resource_type: T) -> Self {
        Self { name: name.into(), object_id: None, filename: filename.into(), resource_type: resource_type.into(), deleted: false }
    }

    pub fn with_object_id<O: Into<String>>(mut self, object_id: O) -> Self { self.object_id = Some(object_id.into()); self }
}

impl ResourceReference for ResourceReferenceRecord {
    fn name(&self) -> &str { &self.name }
    fn deleted(&self) -> bool { self.deleted }
    fn set_deleted(&mut self, deleted: bool) { self.deleted = deleted; }
}

/// Attachment uploads also remember what the client called the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentReference {
    #[serde(flatten)]
    pub base: ResourceReferenceRecord,
    pub original_filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub secondary_provider: Option<String>,
}

impl ResourceReference for AttachmentReference {
    fn name(&self) -> &str { &self.base.name }
    fn deleted(&self) -> bool { self.base.deleted }
    fn set_deleted(&mut self, deleted: bool) { self.base.deleted = deleted; }
}

/// On-storage document: `{ "resource_references": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceReferenceList<T> {
    #[serde(default = "Vec::new")]
    pub resource_references: Vec<T>,
}
