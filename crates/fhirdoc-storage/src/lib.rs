//! # fhirdoc-storage
//!
//! The contract between the HTTP framework and the code that actually holds
//! resources.
//!
//! A [`ResourceProvider`] serves exactly one resource type. The server keeps
//! a registry of providers keyed by [`ResourceProvider::resource_type`] and
//! routes every request for that type to it. Providers receive identifiers
//! exactly as they appeared in the request and are responsible for parsing
//! them, so malformed and unknown identifiers are reported consistently
//! whichever transport called in.
//!
//! ## Example
//!
//! ```ignore
//! use fhirdoc_storage::{ResourceProvider, StorageError};
//!
//! async fn title_of(
//!     provider: &dyn ResourceProvider<Resource = Composition>,
//!     id: &str,
//! ) -> Result<Option<String>, StorageError> {
//!     let composition = provider.read(id, None).await?;
//!     Ok(composition.title)
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::{DynProvider, ResourceProvider};
pub use types::{HistoryEntry, HistoryMethod, SearchParams};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;
