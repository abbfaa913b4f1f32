//! In-memory storage backend for the fhirdoc server.
//!
//! Every stored resource keeps its full version history. Histories live in a
//! papaya lock-free HashMap keyed by numeric id; appends to one history are
//! serialized by a per-resource lock.
//!
//! # Example
//!
//! ```ignore
//! use fhirdoc_db_memory::CompositionProvider;
//! use fhirdoc_storage::ResourceProvider;
//!
//! let provider = CompositionProvider::new();
//! let seed = provider.read("1", None).await?;
//! assert_eq!(seed.identifier_value(), Some("00002"));
//! ```

pub mod factory;
pub mod provider;
pub mod store;

pub use factory::{StorageBackend, StorageConfig, StorageOptions, create_composition_provider};
pub use provider::{CompositionProvider, seed_composition};
pub use store::VersionedStore;

// Re-export the provider contract for convenience
pub use fhirdoc_storage::{ResourceProvider, StorageError};
