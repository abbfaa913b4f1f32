//! The Composition provider.

use async_trait::async_trait;
use fhirdoc_core::{Composition, Identifier, ResourceId, ResourceType, now_utc_seconds};
use fhirdoc_storage::{HistoryEntry, ResourceProvider, SearchParams, StorageError};

use crate::store::VersionedStore;

/// Identifier system of the pre-seeded record.
pub const SEED_IDENTIFIER_SYSTEM: &str = "urn:hapitest:mrns";
/// Identifier value of the pre-seeded record.
pub const SEED_IDENTIFIER_VALUE: &str = "00002";
/// Title of the pre-seeded record, spelling included.
pub const SEED_TITLE: &str = "A Generic Diagonistic Explanatory Document";

/// The record present in every seeded provider at id 1.
pub fn seed_composition() -> Composition {
    Composition::new()
        .with_identifier(Identifier::new(SEED_IDENTIFIER_SYSTEM, SEED_IDENTIFIER_VALUE))
        .with_title(SEED_TITLE)
        .with_status("final")
        .with_date(now_utc_seconds().to_string())
}

/// Serves `Composition` from an in-memory [`VersionedStore`].
#[derive(Debug)]
pub struct CompositionProvider {
    store: VersionedStore<Composition>,
}

impl CompositionProvider {
    /// A provider holding the seed record as `Composition/1`, version 1.
    pub fn new() -> Self {
        let provider = Self::empty();
        let seeded = provider.store.insert_new(seed_composition());
        tracing::info!(
            resource.id = seeded.id.as_deref().unwrap_or_default(),
            "seeded Composition store"
        );
        provider
    }

    /// A provider with nothing stored; the first create receives id 1.
    pub fn empty() -> Self {
        Self {
            store: VersionedStore::new(),
        }
    }

    pub fn store(&self) -> &VersionedStore<Composition> {
        &self.store
    }
}

impl Default for CompositionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceProvider for CompositionProvider {
    type Resource = Composition;

    fn resource_type(&self) -> ResourceType {
        ResourceType::Composition
    }

    async fn read(&self, id: &str, version: Option<&str>) -> Result<Composition, StorageError> {
        self.store.read(id, version)
    }

    async fn search(&self, _params: &SearchParams) -> Result<Vec<Composition>, StorageError> {
        Ok(self.store.search_all())
    }

    async fn create(&self, resource: Composition) -> Result<Composition, StorageError> {
        self.store.create(resource)
    }

    async fn update(
        &self,
        id: &str,
        resource: Composition,
        if_match: Option<&str>,
    ) -> Result<Composition, StorageError> {
        let id: ResourceId = id.parse()?;
        self.store.update(id, resource, if_match)
    }

    async fn history(&self, id: &str) -> Result<Vec<HistoryEntry<Composition>>, StorageError> {
        let id: ResourceId = id.parse()?;
        self.store.history(id)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
