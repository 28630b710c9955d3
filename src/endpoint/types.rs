//! Endpoint descriptor types
//!
//! Raw definitions are deserialized from YAML and then validated into
//! immutable descriptors.

use crate::error::{Error, Result};
use crate::output::object_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Endpoint name of the deferred university lookup
pub const UNIVERSITIES: &str = "universities";

/// Endpoint name of the primary entity that cascades on delete
pub const STUDENTS: &str = "students";

/// Endpoint name of student admissions
pub const ADMISSIONS: &str = "admissions";

/// Endpoint name of student followings
pub const FOLLOWINGS: &str = "followings";

fn default_join_key() -> String {
    "id".to_string()
}

// ============================================================================
// Raw Definitions (YAML)
// ============================================================================

/// Endpoint definition as written in the catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointDefinition {
    pub name: String,
    #[serde(alias = "gcs_folder")]
    pub folder: String,
    pub file_name_prefix: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub has_university_id: bool,
    #[serde(default, alias = "supports_date_filter")]
    pub date_filter: bool,
    #[serde(default)]
    pub has_grad_year: bool,
    #[serde(default)]
    pub nested_fields: Option<Vec<String>>,
    #[serde(default)]
    pub custom_field: Option<CustomFieldDefinition>,
}

/// Custom field definition as written in the catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomFieldDefinition {
    pub field_name: String,
    #[serde(alias = "gcs_folder")]
    pub folder: String,
    pub file_name_prefix: String,
    pub fields: Vec<String>,
    /// Column carrying the parent record id on every row
    #[serde(default = "default_join_key", alias = "parent_id_key")]
    pub join_key: String,
}

// ============================================================================
// Validated Descriptors
// ============================================================================

/// Static description of one API resource type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub name: String,
    pub folder: String,
    pub file_name_prefix: String,
    pub fields: BTreeSet<String>,
    pub has_university_id: bool,
    pub supports_date_filter: bool,
    pub has_grad_year: bool,
    pub nested_fields: Vec<String>,
    pub custom_field: Option<CustomFieldDescriptor>,
}

/// Shape of the custom field array carried by an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldDescriptor {
    pub field_name: String,
    pub folder: String,
    pub file_name_prefix: String,
    pub fields: BTreeSet<String>,
    pub join_key: String,
}

impl EndpointDescriptor {
    /// Storage path of one record's object.
    ///
    /// The year segment is only written for grad-year scoped endpoints.
    pub fn object_path(&self, record_id: &str, grad_year: Option<u16>) -> String {
        object_path(
            &self.folder,
            self.scoped_year(grad_year),
            &self.file_name_prefix,
            record_id,
        )
    }

    /// Storage path of a record's custom field rows, if the endpoint has any
    pub fn custom_field_path(&self, record_id: &str, grad_year: Option<u16>) -> Option<String> {
        let year = self.scoped_year(grad_year);
        self.custom_field
            .as_ref()
            .map(|cf| object_path(&cf.folder, year, &cf.file_name_prefix, record_id))
    }

    /// Whether this is the deferred university lookup endpoint
    pub fn is_lookup(&self) -> bool {
        self.name == UNIVERSITIES
    }

    fn scoped_year(&self, grad_year: Option<u16>) -> Option<u16> {
        if self.has_grad_year {
            grad_year
        } else {
            None
        }
    }
}

impl TryFrom<EndpointDefinition> for EndpointDescriptor {
    type Error = Error;

    fn try_from(def: EndpointDefinition) -> Result<Self> {
        if def.name.trim().is_empty() {
            return Err(Error::invalid_endpoint("<unnamed>", "name is empty"));
        }
        if def.folder.trim().is_empty() {
            return Err(Error::invalid_endpoint(&def.name, "folder is empty"));
        }

        let fields = unique_fields(&def.name, "fields", def.fields)?;
        if !fields.contains("id") {
            return Err(Error::invalid_endpoint(&def.name, "fields must include 'id'"));
        }

        let custom_field = def
            .custom_field
            .map(|cf| {
                let join_key = cf.join_key;
                let cf_fields = unique_fields(&def.name, "custom_field.fields", cf.fields)?;
                if !cf_fields.contains(&join_key) {
                    return Err(Error::invalid_endpoint(
                        &def.name,
                        format!("custom_field.fields must include join key '{join_key}'"),
                    ));
                }
                Ok(CustomFieldDescriptor {
                    field_name: cf.field_name,
                    folder: cf.folder,
                    file_name_prefix: cf.file_name_prefix,
                    fields: cf_fields,
                    join_key,
                })
            })
            .transpose()?;

        Ok(Self {
            name: def.name,
            folder: def.folder,
            file_name_prefix: def.file_name_prefix,
            fields,
            has_university_id: def.has_university_id,
            supports_date_filter: def.date_filter,
            has_grad_year: def.has_grad_year,
            nested_fields: def.nested_fields.unwrap_or_default(),
            custom_field,
        })
    }
}

fn unique_fields(endpoint: &str, what: &str, fields: Vec<String>) -> Result<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for field in fields {
        if !set.insert(field.clone()) {
            return Err(Error::invalid_endpoint(
                endpoint,
                format!("duplicate entry '{field}' in {what}"),
            ));
        }
    }
    Ok(set)
}
