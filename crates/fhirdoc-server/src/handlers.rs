use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use fhirdoc_api::{
    ApiError, ApiResponse, CapabilityStatementBuilder, CapabilityStatementRestResource,
    HistoryBundleEntry, HistoryBundleMethod, OperationOutcome, bundle_from_history,
    bundle_from_search, check_if_none_match, not_modified, parse_if_match,
};
use fhirdoc_core::ResourceType;
use fhirdoc_storage::{HistoryMethod, SearchParams, StorageError};
use serde::Serialize;
use serde_json::{Value, json};

use crate::server::AppState;
use crate::storage_adapter::{JsonProvider, StoredJson};

/// Interactions every registered provider serves.
const INTERACTIONS: [&str; 6] = [
    "read",
    "vread",
    "search-type",
    "create",
    "update",
    "history-instance",
];

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "service": "fhirdoc",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "fhirBase": &*state.base_url,
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.registry.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "no providers" }),
        );
    }
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

pub async fn metadata(State(state): State<AppState>) -> Response {
    let mut builder = CapabilityStatementBuilder::new_json(state.fhir_version.to_string())
        .date(state.started_at.to_string())
        .software("fhirdoc", env!("CARGO_PKG_VERSION"))
        .implementation("fhirdoc Composition server", &*state.base_url);
    for resource_type in state.registry.resource_types() {
        builder = builder.add_resource(
            CapabilityStatementRestResource::new(resource_type.as_str())
                .with_interactions(&INTERACTIONS)
                .versioned(),
        );
    }
    ApiResponse::ok(builder.build()).into_response()
}

// ---- Type-level interactions ----

pub async fn search_resource(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    RawQuery(raw_query): RawQuery,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let provider = provider_for(&state, &resource_type)?;
    let params: SearchParams = pairs.into_iter().collect();

    let results = provider.search(&params).await.map_err(map_storage_error)?;

    // Parameters are accepted but never applied; say so in the bundle
    let warnings = (!params.is_empty())
        .then(|| OperationOutcome::ignored_params_warning(params.names()));
    if warnings.is_some() {
        tracing::debug!(
            resource_type = %resource_type,
            params = ?params.names().collect::<Vec<_>>(),
            "search parameters ignored"
        );
    }

    let bundle = bundle_from_search(
        results.into_iter().map(|r| r.body).collect(),
        &state.base_url,
        &resource_type,
        raw_query.as_deref(),
        warnings,
    )
    .map_err(|e| ApiError::internal(format!("Failed to build search bundle: {e}")))?;

    Ok(ApiResponse::ok(bundle).into_response())
}

pub async fn create_resource(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let provider = provider_for(&state, &resource_type)?;
    let payload = parse_body(&body)?;

    let created = provider.create(payload).await.map_err(map_storage_error)?;
    tracing::info!(
        resource_type = %resource_type,
        resource.id = %created.id,
        "resource created"
    );

    let location = format!(
        "{}/{}/{}/_history/{}",
        state.base_url, resource_type, created.id, created.version_id
    );
    Ok(with_version_headers(ApiResponse::created(created.body.clone()), &created)
        .with_location(location)
        .into_response())
}

// ---- Instance-level interactions ----

pub async fn read_resource(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let provider = provider_for(&state, &resource_type)?;
    let stored = provider.read(&id, None).await.map_err(map_storage_error)?;

    if check_if_none_match(&headers, stored.version_id.as_str()) {
        return Ok(not_modified(&stored.version_id));
    }
    Ok(with_version_headers(ApiResponse::ok(stored.body.clone()), &stored).into_response())
}

pub async fn vread_resource(
    State(state): State<AppState>,
    Path((resource_type, id, version_id)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let provider = provider_for(&state, &resource_type)?;
    let stored = provider
        .read(&id, Some(&version_id))
        .await
        .map_err(map_storage_error)?;
    Ok(with_version_headers(ApiResponse::ok(stored.body.clone()), &stored).into_response())
}

pub async fn update_resource(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let provider = provider_for(&state, &resource_type)?;
    let if_match = parse_if_match(&headers)?;
    let payload = parse_body(&body)?;

    let updated = provider
        .update(&id, payload, if_match.as_deref())
        .await
        .map_err(map_storage_error)?;
    tracing::info!(
        resource_type = %resource_type,
        resource.id = %updated.id,
        version.id = %updated.version_id,
        "resource updated"
    );
    Ok(with_version_headers(ApiResponse::ok(updated.body.clone()), &updated).into_response())
}

pub async fn history_resource(
    State(state): State<AppState>,
    Path((resource_type, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let provider = provider_for(&state, &resource_type)?;
    let versions = provider.history(&id).await.map_err(map_storage_error)?;
    // Links use the stored id, so `007` and `7` produce the same bundle
    let canonical_id = versions
        .first()
        .map(|(stored, _)| stored.id.clone())
        .unwrap_or(id);

    let entries = versions
        .into_iter()
        .map(|(stored, method)| HistoryBundleEntry {
            last_modified: stored.last_updated.map(|t| t.to_string()),
            version_id: stored.version_id,
            resource: stored.body,
            method: match method {
                HistoryMethod::Create => HistoryBundleMethod::Create,
                HistoryMethod::Update => HistoryBundleMethod::Update,
            },
        })
        .collect();

    let bundle = bundle_from_history(entries, &state.base_url, &resource_type, &canonical_id);
    Ok(ApiResponse::ok(bundle).into_response())
}

// ---- Helpers ----

fn provider_for(state: &AppState, resource_type: &str) -> Result<Arc<dyn JsonProvider>, ApiError> {
    resource_type
        .parse::<ResourceType>()
        .ok()
        .and_then(|rt| state.registry.get(&rt))
        .ok_or_else(|| {
            ApiError::not_found(format!("Resource type '{resource_type}' is not supported"))
        })
}

fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?;
    if !value.is_object() {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    }
    Ok(value)
}

fn with_version_headers<T>(response: ApiResponse<T>, stored: &StoredJson) -> ApiResponse<T> {
    let response = response.with_etag_weak(stored.version_id.as_str());
    match stored.last_updated.map(|t| t.to_http_date()) {
        Some(Ok(date)) => response.with_last_modified_raw(date),
        _ => response,
    }
}

/// Map provider errors onto HTTP errors, logging server-side failures.
fn map_storage_error(err: StorageError) -> ApiError {
    let category = err.category();
    match err {
        StorageError::NotFound { .. } => {
            tracing::debug!(%category, error = %err, "lookup failed");
            ApiError::not_found(err.to_string())
        }
        StorageError::InvalidArgument { .. } | StorageError::InvalidResource { .. } => {
            tracing::debug!(%category, error = %err, "request rejected");
            ApiError::bad_request(err.to_string())
        }
        StorageError::VersionConflict { .. } => {
            tracing::debug!(%category, error = %err, "conditional update rejected");
            ApiError::precondition_failed(err.to_string())
        }
        StorageError::Internal { .. } => {
            tracing::warn!(%category, error = %err, "provider failure");
            ApiError::internal(err.to_string())
        }
    }
}
