use crate::{FhirDateTime, ResourceId, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resource `meta`. The store owns `versionId` and `lastUpdated`; profiles,
/// tags, security labels and extensions are kept as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResourceMeta {
    #[serde(rename = "versionId", skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<FhirDateTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    pub fn with_last_updated(mut self, last_updated: FhirDateTime) -> Self {
        self.last_updated = Some(last_updated);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.version_id.is_none() && self.last_updated.is_none() && self.extra.is_empty()
    }
}

/// A resource that can live in a version history.
///
/// The store assigns identity: it calls [`Versioned::stamp`] exactly once per
/// stored version, before the value becomes visible to readers.
pub trait Versioned: Clone + Send + Sync + 'static {
    /// The type every instance must declare.
    fn resource_type() -> ResourceType;

    /// The `resourceType` this instance actually carries.
    fn declared_type(&self) -> &ResourceType;

    fn id(&self) -> Option<&str>;

    fn version_id(&self) -> Option<&str>;

    fn last_updated(&self) -> Option<FhirDateTime>;

    fn stamp(&mut self, id: ResourceId, version_id: String, last_updated: FhirDateTime);
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_resource_meta_new_is_empty() {
        let meta = ResourceMeta::new();
        assert!(meta.is_empty());
        assert!(meta.version_id.is_none());
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn test_resource_meta_builders() {
        let ts = FhirDateTime::new(datetime!(2024-01-02 03:04:05 UTC));
        let meta = ResourceMeta::new()
            .with_version_id("3")
            .with_last_updated(ts);
        assert_eq!(meta.version_id.as_deref(), Some("3"));
        assert_eq!(meta.last_updated, Some(ts));
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_resource_meta_serialization() {
        let meta = ResourceMeta::new()
            .with_version_id("1")
            .with_last_updated(FhirDateTime::new(datetime!(2024-01-02 03:04:05 UTC)));
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["versionId"], "1");
        assert_eq!(json["lastUpdated"], "2024-01-02T03:04:05Z");
        assert!(json.get("profile").is_none());
        assert!(json.get("source").is_none());
    }

    #[test]
    fn test_resource_meta_keeps_untyped_elements() {
        let body = serde_json::json!({
            "versionId": "2",
            "profile": ["http://example.org/profile"],
            "tag": [{"code": "draft"}],
            "extension": [{"url": "http://example.org/ext", "valueBoolean": true}]
        });
        let meta: ResourceMeta = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(meta.version_id.as_deref(), Some("2"));
        assert_eq!(meta.extra.len(), 3);
        assert!(!meta.is_empty());
        assert_eq!(serde_json::to_value(&meta).unwrap(), body);
    }

    #[test]
    fn test_resource_meta_deserializes_partial() {
        let meta: ResourceMeta = serde_json::from_str(r#"{"versionId":"7"}"#).unwrap();
        assert_eq!(meta.version_id.as_deref(), Some("7"));
        assert!(meta.last_updated.is_none());
    }
}
