use std::sync::Arc;

use fhirdoc_core::Composition;
use fhirdoc_storage::DynProvider;

use crate::CompositionProvider;

/// Supported storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Version histories held in a papaya::HashMap
    #[default]
    InMemory,
}

/// Storage-specific configuration options.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Whether the seed record is inserted at startup.
    pub seed: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self { seed: true }
    }
}

/// Factory configuration to construct a provider.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub options: StorageOptions,
}

/// Create the Composition provider described by `config`.
pub fn create_composition_provider(config: &StorageConfig) -> DynProvider<Composition> {
    match config.backend {
        StorageBackend::InMemory => {
            let provider = if config.options.seed {
                CompositionProvider::new()
            } else {
                CompositionProvider::empty()
            };
            Arc::new(provider)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirdoc_storage::{ResourceProvider, SearchParams};

    #[tokio::test]
    async fn test_factory_respects_seed_option() {
        let seeded = create_composition_provider(&StorageConfig::default());
        assert_eq!(seeded.search(&SearchParams::new()).await.unwrap().len(), 1);
        assert_eq!(seeded.backend_name(), "memory");

        let config = StorageConfig {
            backend: StorageBackend::InMemory,
            options: StorageOptions { seed: false },
        };
        let empty = create_composition_provider(&config);
        assert!(empty.search(&SearchParams::new()).await.unwrap().is_empty());
    }
}
