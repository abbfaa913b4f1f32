//! HTTP server for versioned FHIR Composition documents.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod storage_adapter;

pub use config::{AppConfig, FhirSettings, LoggingConfig, ServerConfig, StorageSettings};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, FhirdocServer, ServerBuilder, build_app, build_router};
pub use storage_adapter::{JsonProvider, ProviderAdapter, ProviderRegistry, StoredJson};
