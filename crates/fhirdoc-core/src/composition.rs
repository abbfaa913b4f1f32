//! The `Composition` resource: a set of healthcare-related information
//! assembled into a single logical document.
//!
//! Only the elements the server reads or seeds are typed; everything else a
//! client sends is kept verbatim in [`Composition::extra`] and written back
//! on output.

use crate::{FhirDateTime, ResourceId, ResourceMeta, ResourceType, Versioned};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A business identifier (`Identifier` datatype). `system` and `value` are
/// typed; `use`, `type`, `period` and `assigner` ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Identifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            value: Some(value.into()),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(rename = "resourceType")]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "ResourceMeta::is_empty")]
    pub meta: ResourceMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// FHIR `dateTime`: `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or a full instant,
    /// stored as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Composition {
    pub fn new() -> Self {
        Self {
            resource_type: ResourceType::Composition,
            id: None,
            meta: ResourceMeta::new(),
            identifier: None,
            status: None,
            date: None,
            title: None,
            extra: Map::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.identifier = Some(identifier);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: Value) {
        self.extra.insert(key.into(), value);
    }

    pub fn get_field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Value of the business identifier, if any.
    pub fn identifier_value(&self) -> Option<&str> {
        self.identifier.as_ref().and_then(|i| i.value.as_deref())
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

impl Versioned for Composition {
    fn resource_type() -> ResourceType {
        ResourceType::Composition
    }

    fn declared_type(&self) -> &ResourceType {
        &self.resource_type
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn version_id(&self) -> Option<&str> {
        self.meta.version_id.as_deref()
    }

    fn last_updated(&self) -> Option<FhirDateTime> {
        self.meta.last_updated
    }

    fn stamp(&mut self, id: ResourceId, version_id: String, last_updated: FhirDateTime) {
        self.id = Some(id.to_string());
        self.meta.version_id = Some(version_id);
        self.meta.last_updated = Some(last_updated);
    }
}
