//! Resource path vocabulary shared by authorization and the resource providers:
//! names, per-provider type schemas, path parsing and the reference stores.

pub mod descriptor;
mod instance;
pub mod metadata;
pub mod names;
mod path;
pub mod reference;
mod reference_store;

pub use descriptor::{AllowedTypes, HttpMethod, ResourceTypeAction, ResourceTypeDescriptor, ResourceTypeMap};
pub use instance::ResourceTypeInstance;
pub use path::ResourcePath;
pub use reference::{AttachmentReference, ResourceReference, ResourceReferenceList, ResourceReferenceRecord};
pub use reference_store::{ResourceProviderResourceReferenceStore, RESOURCE_REFERENCES_FILE_NAME};
