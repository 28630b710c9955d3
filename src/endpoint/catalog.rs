//! Endpoint catalog loading
//!
//! The built-in catalog is embedded in the binary; a YAML file can replace it.

use super::types::{EndpointDefinition, EndpointDescriptor};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Built-in Overgrad catalog YAML
pub const BUILTIN_CATALOG: &str = include_str!("../../catalog/overgrad.yaml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    endpoints: Vec<EndpointDefinition>,
}

/// Ordered, validated set of endpoint descriptors
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    endpoints: Vec<EndpointDescriptor>,
}

impl EndpointCatalog {
    /// Load the embedded catalog
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let endpoints = file
            .endpoints
            .into_iter()
            .map(EndpointDescriptor::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::new(endpoints)
    }

    /// Load a catalog file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Build a catalog from descriptors, rejecting duplicate names
    pub fn new(endpoints: Vec<EndpointDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for endpoint in &endpoints {
            if !seen.insert(endpoint.name.as_str()) {
                return Err(Error::invalid_endpoint(
                    &endpoint.name,
                    "endpoint declared more than once",
                ));
            }
        }
        Ok(Self { endpoints })
    }

    /// Look up an endpoint by name
    pub fn get(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Look up an endpoint by name, failing if it is unknown
    pub fn require(&self, name: &str) -> Result<&EndpointDescriptor> {
        self.get(name).ok_or_else(|| Error::UnknownEndpoint {
            name: name.to_string(),
        })
    }

    /// Restrict to the named endpoints, keeping catalog order.
    ///
    /// An empty selection keeps everything.
    pub fn select(&self, names: &[String]) -> Result<Vec<&EndpointDescriptor>> {
        for name in names {
            self.require(name)?;
        }
        Ok(self
            .endpoints
            .iter()
            .filter(|e| names.is_empty() || names.contains(&e.name))
            .collect())
    }

    /// All endpoints in catalog order
    pub fn endpoints(&self) -> &[EndpointDescriptor] {
        &self.endpoints
    }

    /// Number of endpoints
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
