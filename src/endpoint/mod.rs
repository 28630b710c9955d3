//! Endpoint descriptors
//!
//! Static configuration for each API resource type: which fields survive
//! projection, where objects are stored, which sub-objects are flattened and
//! whether the resource carries custom field values.

mod catalog;
mod types;

pub use catalog::{EndpointCatalog, BUILTIN_CATALOG};
pub use types::{
    CustomFieldDefinition, CustomFieldDescriptor, EndpointDefinition, EndpointDescriptor,
    ADMISSIONS, FOLLOWINGS, STUDENTS, UNIVERSITIES,
};
