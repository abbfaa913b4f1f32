use std::fmt;
use std::sync::Arc;

use fhirdoc_core::{IdSequence, ResourceId, ResourceType, Versioned, now_utc};
use fhirdoc_storage::{HistoryEntry, HistoryMethod, StorageError};
use papaya::HashMap as PapayaHashMap;
use parking_lot::RwLock;

/// All stored versions of one resource, oldest first. Never empty.
type History<R> = Arc<RwLock<Vec<R>>>;

/// In-memory store of version histories keyed by numeric resource id.
///
/// This store provides:
/// - Lock-free id lookup via papaya::HashMap
/// - A per-resource lock so versions of one resource append in order
/// - Monotonic id allocation; ids are never reused
/// - Reads of the latest or of a specific version, plus full history
///
/// Version ids are assigned here: `"1"` for the first version, then the
/// position of the new version in its history (1-based).
pub struct VersionedStore<R> {
    resource_type: ResourceType,
    histories: PapayaHashMap<ResourceId, History<R>>,
    ids: IdSequence,
}

impl<R: Versioned> VersionedStore<R> {
    /// Creates an empty store. The first created resource receives id 1.
    pub fn new() -> Self {
        Self {
            resource_type: R::resource_type(),
            histories: PapayaHashMap::new(),
            ids: IdSequence::new(),
        }
    }

    pub fn resource_type(&self) -> &ResourceType {
        &self.resource_type
    }

    /// Number of stored resources (not versions).
    pub fn len(&self) -> usize {
        self.histories.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn history_of(&self, id: ResourceId) -> Option<History<R>> {
        let guard = self.histories.pin();
        guard.get(&id).cloned()
    }

    fn check_type(&self, resource: &R) -> Result<(), StorageError> {
        let declared = resource.declared_type();
        if declared != &self.resource_type {
            return Err(StorageError::invalid_resource(format!(
                "Expected resourceType '{}' but got '{declared}'",
                self.resource_type
            )));
        }
        Ok(())
    }

    /// Stores `resource` as version 1 of a new resource.
    ///
    /// Any id the resource already carries is replaced.
    pub fn create(&self, resource: R) -> Result<R, StorageError> {
        self.check_type(&resource)?;
        Ok(self.insert_new(resource))
    }

    pub(crate) fn insert_new(&self, mut resource: R) -> R {
        let id = self.ids.next_id();
        resource.stamp(id, "1".to_string(), now_utc());

        self.histories
            .pin()
            .insert(id, Arc::new(RwLock::new(vec![resource.clone()])));

        tracing::debug!(
            resource_type = %self.resource_type,
            resource.id = %id,
            "resource created"
        );
        resource
    }

    /// Appends a new version to the history of `id`.
    ///
    /// When `if_match` is given the append only happens while the current
    /// version id equals it. The check and the append happen under the
    /// resource's write lock.
    pub fn update(
        &self,
        id: ResourceId,
        mut resource: R,
        if_match: Option<&str>,
    ) -> Result<R, StorageError> {
        self.check_type(&resource)?;
        if let Some(body_id) = resource.id() {
            if body_id.parse::<ResourceId>().ok() != Some(id) {
                return Err(StorageError::invalid_argument(format!(
                    "Resource id '{body_id}' does not match request id '{id}'"
                )));
            }
        }

        let history = self
            .history_of(id)
            .ok_or_else(|| StorageError::not_found(self.resource_type.as_str(), id.to_string()))?;

        let mut versions = history.write();
        let current = versions
            .last()
            .and_then(Versioned::version_id)
            .unwrap_or_default()
            .to_string();

        if let Some(expected) = if_match {
            if expected != current {
                return Err(StorageError::version_conflict(expected, current));
            }
        }

        let version_id = (versions.len() + 1).to_string();
        resource.stamp(id, version_id.clone(), now_utc());
        versions.push(resource.clone());

        tracing::debug!(
            resource_type = %self.resource_type,
            resource.id = %id,
            version.id = %version_id,
            "resource updated"
        );
        Ok(resource)
    }

    /// The most recent version of `id`.
    pub fn read_latest(&self, id: ResourceId) -> Result<R, StorageError> {
        self.lookup(id, &id.to_string(), None)
    }

    /// The version of `id` whose version id equals `version`.
    pub fn read_version(&self, id: ResourceId, version: &str) -> Result<R, StorageError> {
        self.lookup(id, &id.to_string(), Some(version))
    }

    /// Read dispatch on an identifier as received from a client: latest
    /// version when `version` is `None`, that exact version otherwise.
    ///
    /// A malformed identifier is an `InvalidArgument`; error messages quote
    /// `raw_id` unchanged.
    pub fn read(&self, raw_id: &str, version: Option<&str>) -> Result<R, StorageError> {
        let id: ResourceId = raw_id.parse()?;
        self.lookup(id, raw_id, version)
    }

    fn lookup(
        &self,
        id: ResourceId,
        requested: &str,
        version: Option<&str>,
    ) -> Result<R, StorageError> {
        let history = self
            .history_of(id)
            .ok_or_else(|| StorageError::not_found(self.resource_type.as_str(), requested))?;
        let versions = history.read();

        match version {
            None => versions
                .last()
                .cloned()
                .ok_or_else(|| StorageError::not_found(self.resource_type.as_str(), requested)),
            Some(version) => versions
                .iter()
                .find(|v| v.version_id() == Some(version))
                .cloned()
                .ok_or_else(|| {
                    StorageError::version_not_found(
                        self.resource_type.as_str(),
                        requested,
                        version,
                    )
                }),
        }
    }

    /// The current version of every stored resource, in ascending id order.
    pub fn search_all(&self) -> Vec<R> {
        let mut histories: Vec<(ResourceId, History<R>)> = {
            let guard = self.histories.pin();
            guard.iter().map(|(id, h)| (*id, h.clone())).collect()
        };
        histories.sort_by_key(|(id, _)| *id);

        histories
            .into_iter()
            .filter_map(|(_, h)| h.read().last().cloned())
            .collect()
    }

    /// Every version of `id`, newest first.
    pub fn history(&self, id: ResourceId) -> Result<Vec<HistoryEntry<R>>, StorageError> {
        let history = self
            .history_of(id)
            .ok_or_else(|| StorageError::not_found(self.resource_type.as_str(), id.to_string()))?;
        let versions = history.read();

        Ok(versions
            .iter()
            .enumerate()
            .rev()
            .map(|(pos, v)| {
                let method = if pos == 0 {
                    HistoryMethod::Create
                } else {
                    HistoryMethod::Update
                };
                HistoryEntry::new(v.clone(), method)
            })
            .collect())
    }
}

impl<R: Versioned> Default for VersionedStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for VersionedStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedStore")
            .field("resource_type", &self.resource_type)
            .field("resources", &self.histories.pin().len())
            .field("next_id", &self.ids.peek())
            .finish()
    }
}
