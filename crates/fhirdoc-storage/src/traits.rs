//! The provider contract.

use std::sync::Arc;

use async_trait::async_trait;
use fhirdoc_core::{ResourceType, Versioned};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;
use crate::types::{HistoryEntry, SearchParams};

/// Serves one resource type on behalf of the framework.
///
/// Identifiers are passed exactly as the client sent them. Implementations
/// must report an identifier that can never name a resource with
/// [`StorageError::InvalidArgument`] and a well-formed but absent one (or an
/// absent version of a present one) with [`StorageError::NotFound`].
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// async fn latest_title(provider: &CompositionProvider) -> Result<String, StorageError> {
///     let composition = provider.read("1", None).await?;
///     Ok(composition.title.unwrap_or_default())
/// }
/// ```
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// The resource this provider stores.
    type Resource: Versioned + Serialize + DeserializeOwned;

    /// The resource type this provider answers for. The framework routes
    /// requests by this value.
    fn resource_type(&self) -> ResourceType;

    /// Reads a resource.
    ///
    /// With `version == None` returns the current version; otherwise returns
    /// the stored version whose version id equals `version`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` for an unknown id or
    /// an unknown version of a known id.
    async fn read(
        &self,
        id: &str,
        version: Option<&str>,
    ) -> Result<Self::Resource, StorageError>;

    /// Returns the current version of every stored resource.
    ///
    /// Ordering is not part of the contract. Providers may ignore `params`
    /// entirely.
    async fn search(&self, params: &SearchParams) -> Result<Vec<Self::Resource>, StorageError>;

    /// Stores a new resource under a freshly assigned id.
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the resource declares a different type.
    async fn create(&self, resource: Self::Resource) -> Result<Self::Resource, StorageError>;

    /// Appends a new version to an existing resource.
    ///
    /// If `if_match` is provided, the update only succeeds while the current
    /// version id equals it.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id or a body id that differs from
    /// `id`, `NotFound` if the resource does not exist, `VersionConflict`
    /// if `if_match` is stale, `InvalidResource` for a foreign type.
    async fn update(
        &self,
        id: &str,
        resource: Self::Resource,
        if_match: Option<&str>,
    ) -> Result<Self::Resource, StorageError>;

    /// Every stored version of one resource, newest first.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` for an unknown id.
    async fn history(
        &self,
        id: &str,
    ) -> Result<Vec<HistoryEntry<Self::Resource>>, StorageError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shareable provider of one resource type.
pub type DynProvider<R> = Arc<dyn ResourceProvider<Resource = R>>;
