//! JSON adapter over typed resource providers.
//!
//! Handlers speak `serde_json::Value`; providers speak their own resource
//! type. [`ProviderAdapter`] bridges the two so providers of different
//! resource types can sit behind one object-safe trait in the
//! [`ProviderRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fhirdoc_core::{FhirDateTime, ResourceType, Versioned};
use fhirdoc_storage::{DynProvider, HistoryMethod, SearchParams, StorageError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One stored version, serialized for the wire.
#[derive(Debug, Clone)]
pub struct StoredJson {
    pub id: String,
    pub version_id: String,
    pub last_updated: Option<FhirDateTime>,
    pub body: Value,
}

/// Object-safe view of a provider used by the HTTP handlers.
#[async_trait]
pub trait JsonProvider: Send + Sync {
    fn resource_type(&self) -> ResourceType;
    fn backend_name(&self) -> &'static str;

    async fn read(&self, id: &str, version: Option<&str>) -> Result<StoredJson, StorageError>;
    async fn search(&self, params: &SearchParams) -> Result<Vec<StoredJson>, StorageError>;
    async fn create(&self, body: Value) -> Result<StoredJson, StorageError>;
    async fn update(
        &self,
        id: &str,
        body: Value,
        if_match: Option<&str>,
    ) -> Result<StoredJson, StorageError>;
    async fn history(&self, id: &str) -> Result<Vec<(StoredJson, HistoryMethod)>, StorageError>;
}

/// Adapter that wraps a typed provider and implements [`JsonProvider`].
pub struct ProviderAdapter<R> {
    inner: DynProvider<R>,
}

impl<R> ProviderAdapter<R>
where
    R: Versioned + Serialize + DeserializeOwned,
{
    pub fn new(inner: DynProvider<R>) -> Self {
        Self { inner }
    }

    fn decode(&self, body: Value) -> Result<R, StorageError> {
        serde_json::from_value(body).map_err(|e| {
            StorageError::invalid_resource(format!(
                "Failed to parse {} body: {e}",
                R::resource_type()
            ))
        })
    }

    fn encode(resource: &R) -> Result<StoredJson, StorageError> {
        let body = serde_json::to_value(resource)
            .map_err(|e| StorageError::internal(format!("Failed to serialize resource: {e}")))?;
        Ok(StoredJson {
            id: resource.id().unwrap_or_default().to_string(),
            version_id: resource.version_id().unwrap_or_default().to_string(),
            last_updated: resource.last_updated(),
            body,
        })
    }
}

impl<R> std::fmt::Debug for ProviderAdapter<R>
where
    R: Versioned + Serialize + DeserializeOwned,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("backend", &self.inner.backend_name())
            .finish()
    }
}

#[async_trait]
impl<R> JsonProvider for ProviderAdapter<R>
where
    R: Versioned + Serialize + DeserializeOwned,
{
    fn resource_type(&self) -> ResourceType {
        self.inner.resource_type()
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    async fn read(&self, id: &str, version: Option<&str>) -> Result<StoredJson, StorageError> {
        let resource = self.inner.read(id, version).await?;
        Self::encode(&resource)
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<StoredJson>, StorageError> {
        self.inner
            .search(params)
            .await?
            .iter()
            .map(Self::encode)
            .collect()
    }

    async fn create(&self, body: Value) -> Result<StoredJson, StorageError> {
        let resource = self.decode(body)?;
        let created = self.inner.create(resource).await?;
        Self::encode(&created)
    }

    async fn update(
        &self,
        id: &str,
        body: Value,
        if_match: Option<&str>,
    ) -> Result<StoredJson, StorageError> {
        let resource = self.decode(body)?;
        let updated = self.inner.update(id, resource, if_match).await?;
        Self::encode(&updated)
    }

    async fn history(&self, id: &str) -> Result<Vec<(StoredJson, HistoryMethod)>, StorageError> {
        self.inner
            .history(id)
            .await?
            .iter()
            .map(|entry| Ok((Self::encode(&entry.resource)?, entry.method)))
            .collect()
    }
}

/// Providers keyed by the resource type they serve.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ResourceType, Arc<dyn JsonProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed provider under the type it reports. A later
    /// registration for the same type replaces the earlier one.
    pub fn register<R>(&mut self, provider: DynProvider<R>) -> &mut Self
    where
        R: Versioned + Serialize + DeserializeOwned,
    {
        let adapter = ProviderAdapter::new(provider);
        let resource_type = JsonProvider::resource_type(&adapter);
        tracing::info!(
            resource_type = %resource_type,
            backend = adapter.backend_name(),
            "registered resource provider"
        );
        self.providers.insert(resource_type, Arc::new(adapter));
        self
    }

    pub fn get(&self, resource_type: &ResourceType) -> Option<Arc<dyn JsonProvider>> {
        self.providers.get(resource_type).cloned()
    }

    /// Registered resource types in name order.
    pub fn resource_types(&self) -> Vec<ResourceType> {
        let mut types: Vec<ResourceType> = self.providers.keys().cloned().collect();
        types.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        types
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("resource_types", &self.resource_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirdoc_db_memory::{StorageConfig, create_composition_provider};
    use serde_json::json;

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(create_composition_provider(&StorageConfig::default()));
        registry
    }

    #[test]
    fn registry_lookup_by_type() {
        let registry = registry();
        assert!(registry.get(&ResourceType::Composition).is_some());
        assert!(registry.get(&ResourceType::Custom("Patient".into())).is_none());
        assert_eq!(registry.resource_types(), vec![ResourceType::Composition]);
        assert!(!registry.is_empty());
    }

    #[tokio::test]
    async fn adapter_round_trips_json() {
        let registry = registry();
        let provider = registry.get(&ResourceType::Composition).unwrap();

        let seed = provider.read("1", None).await.unwrap();
        assert_eq!(seed.id, "1");
        assert_eq!(seed.version_id, "1");
        assert_eq!(seed.body["identifier"]["value"], "00002");

        let created = provider
            .create(json!({"resourceType": "Composition", "title": "Note", "section": []}))
            .await
            .unwrap();
        assert_eq!(created.id, "2");
        assert_eq!(created.body["meta"]["versionId"], "1");
        assert!(created.body["section"].is_array());

        let history = provider.history("2").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].1, HistoryMethod::Create);
    }

    #[tokio::test]
    async fn adapter_rejects_unparseable_body() {
        let registry = registry();
        let provider = registry.get(&ResourceType::Composition).unwrap();

        let err = provider.create(json!({"title": "no type"})).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidResource { .. }));

        let err = provider
            .create(json!({"resourceType": "Patient"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidResource { .. }));
    }
}
