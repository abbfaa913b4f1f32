use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Request, Response},
    middleware,
    routing::get,
};
use fhirdoc_core::{FhirDateTime, FhirVersion, now_utc_seconds};
use fhirdoc_db_memory::{
    StorageBackend, StorageConfig, StorageOptions, create_composition_provider,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

use crate::middleware::{self as app_middleware, RequestId};
use crate::storage_adapter::ProviderRegistry;
use crate::{config::AppConfig, handlers};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    /// FHIR base URL without trailing slash.
    pub base_url: Arc<str>,
    pub fhir_version: FhirVersion,
    pub started_at: FhirDateTime,
}

impl AppState {
    /// State with the providers described by `cfg`.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let fhir_version = cfg.fhir_version().map_err(anyhow::Error::msg)?;

        let storage = StorageConfig {
            backend: StorageBackend::InMemory,
            options: StorageOptions {
                seed: cfg.storage.seed,
            },
        };
        let mut registry = ProviderRegistry::new();
        registry.register(create_composition_provider(&storage));

        Ok(Self::new(registry, cfg.base_url(), fhir_version))
    }

    pub fn new(
        registry: ProviderRegistry,
        base_url: impl Into<String>,
        fhir_version: FhirVersion,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            base_url: Arc::from(base_url.into()),
            fhir_version,
            started_at: now_utc_seconds(),
        }
    }
}

pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg)?;
    Ok(build_router(state, cfg.server.body_limit_bytes))
}

/// Routes and middleware around an already assembled state.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    let fhir = Router::new()
        .route("/metadata", get(handlers::metadata))
        .route(
            "/{resource_type}",
            get(handlers::search_resource).post(handlers::create_resource),
        )
        .route(
            "/{resource_type}/{id}",
            get(handlers::read_resource).put(handlers::update_resource),
        )
        .route(
            "/{resource_type}/{id}/_history",
            get(handlers::history_resource),
        )
        .route(
            "/{resource_type}/{id}/_history/{version_id}",
            get(handlers::vread_resource),
        );

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .nest("/fhir", fhir)
        .with_state(state)
        // Middleware stack, innermost first; request id is outermost so spans and errors carry it
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(app_middleware::content_negotiation))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.0.as_str())
                        .unwrap_or("");
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = tracing::field::Empty,
                        request_id = %req_id
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                    span.record("http.status_code", res.status().as_u16());
                    tracing::info!(
                        http.status = %res.status().as_u16(),
                        elapsed_ms = %latency.as_millis(),
                        "request handled"
                    );
                }),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct FhirdocServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<FhirdocServer> {
        let app = build_app(&self.config)?;

        Ok(FhirdocServer {
            addr: self.addr,
            app,
        })
    }
}

impl FhirdocServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
