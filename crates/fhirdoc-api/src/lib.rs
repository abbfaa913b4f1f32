use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type of every body this server writes.
pub const FHIR_JSON: &str = "application/fhir+json";

/// Minimal FHIR OperationOutcome representation for API error responses
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str, // always "OperationOutcome"
    pub issue: Vec<OperationOutcomeIssue>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OperationOutcomeIssue {
    /// FHIR issue severity: fatal | error | warning | information
    pub severity: &'static str,
    /// FHIR issue type code (subset used): invalid | not-found | conflict | not-supported | exception
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl OperationOutcome {
    pub fn single(
        severity: &'static str,
        code: &'static str,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: "OperationOutcome",
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(diagnostics.into()),
            }],
        }
    }

    /// Create an OperationOutcome with one warning issue per message.
    pub fn warnings(messages: Vec<String>) -> Self {
        Self {
            resource_type: "OperationOutcome",
            issue: messages
                .into_iter()
                .map(|msg| OperationOutcomeIssue {
                    severity: "warning",
                    code: "not-supported",
                    diagnostics: Some(msg),
                })
                .collect(),
        }
    }

    /// Warning listing search parameters that were accepted but not applied.
    pub fn ignored_params_warning<'a>(param_names: impl IntoIterator<Item = &'a str>) -> Self {
        let messages = param_names
            .into_iter()
            .map(|name| format!("Search parameter '{name}' is not supported and was ignored"))
            .collect();
        Self::warnings(messages)
    }

    pub fn has_issues(&self) -> bool {
        !self.issue.is_empty()
    }
}

/// High-level API errors to be mapped to HTTP responses and FHIR OperationOutcome
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }
    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_operation_outcome(&self) -> OperationOutcome {
        match self {
            ApiError::BadRequest(msg) => OperationOutcome::single("error", "invalid", msg),
            ApiError::NotFound(msg) => OperationOutcome::single("error", "not-found", msg),
            ApiError::PreconditionFailed(msg) => OperationOutcome::single("error", "conflict", msg),
            ApiError::UnsupportedMediaType(msg) => {
                OperationOutcome::single("error", "not-supported", msg)
            }
            ApiError::Internal(msg) => OperationOutcome::single("fatal", "exception", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse::new(self.to_operation_outcome(), self.status_code()).into_response()
    }
}

fn fhir_json_body(status: StatusCode, body: Vec<u8>, extra: Vec<(HeaderName, HeaderValue)>) -> Response {
    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
    for (name, value) in extra {
        headers.append(name, value);
    }
    response
}


// -------------------------
// API Response Wrapper
// -------------------------
use axum::http::HeaderName;

#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub value: T,
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl<T> ApiResponse<T> {
    pub fn new(value: T, status: StatusCode) -> Self {
        Self {
            value,
            status,
            headers: Vec::new(),
        }
    }

    pub fn ok(value: T) -> Self {
        Self::new(value, StatusCode::OK)
    }

    pub fn created(value: T) -> Self {
        Self::new(value, StatusCode::CREATED)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn with_location(mut self, location: impl AsRef<str>) -> Self {
        if let Ok(val) = HeaderValue::from_str(location.as_ref()) {
            self.headers.push((header::LOCATION, val));
        }
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.value) {
            Ok(body) => fhir_json_body(self.status, body, self.headers),
            Err(err) => {
                let outcome = OperationOutcome::single(
                    "fatal",
                    "exception",
                    format!("Serialization failure: {err}"),
                );
                let body = serde_json::to_vec(&outcome).unwrap_or_else(|_| b"{}".to_vec());
                fhir_json_body(StatusCode::INTERNAL_SERVER_ERROR, body, Vec::new())
            }
        }
    }
}


// -------------------------
// Content Negotiation
// -------------------------
/// Validate the Accept header for JSON responses: allow application/fhir+json and application/json
pub fn validate_accept(headers: &HeaderMap) -> Result<(), ApiError> {
    if let Some(accept) = headers.get(header::ACCEPT) {
        let val = accept.to_str().unwrap_or("").to_ascii_lowercase();
        let allowed = val.contains("application/fhir+json")
            || val.contains("application/json")
            || val.contains("*/*");
        if !allowed {
            return Err(ApiError::unsupported_media_type(format!(
                "Unsupported Accept: {val}. Only application/fhir+json or application/json are supported."
            )));
        }
    }
    Ok(())
}

/// Validate Content-Type for requests with bodies: require application/fhir+json or application/json
pub fn validate_content_type(headers: &HeaderMap) -> Result<(), ApiError> {
    let val = headers
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    let allowed = val.starts_with("application/fhir+json") || val.starts_with("application/json");
    if !allowed {
        return Err(ApiError::unsupported_media_type(format!(
            "Unsupported Content-Type: '{val}'. Only application/fhir+json or application/json are supported."
        )));
    }
    Ok(())
}


// -------------------------
// Caching and conditional request headers
// -------------------------
impl<T> ApiResponse<T> {
    pub fn with_etag_weak(mut self, version: impl Into<String>) -> Self {
        let tag = format!("W/\"{}\"", version.into());
        if let Ok(val) = HeaderValue::from_str(&tag) {
            self.headers.push((header::ETAG, val));
        }
        self
    }

    /// Provide a raw Last-Modified header value (RFC 1123 dates)
    pub fn with_last_modified_raw(mut self, last_modified: impl Into<String>) -> Self {
        if let Ok(val) = HeaderValue::from_str(&last_modified.into()) {
            self.headers.push((header::LAST_MODIFIED, val));
        }
        self
    }
}

/// Check If-None-Match against a weak ETag constructed from version.
/// Returns true if the request's If-None-Match matches the provided version (i.e., should return 304 Not Modified).
pub fn check_if_none_match(headers: &HeaderMap, version: impl Into<String>) -> bool {
    let needle = format!("W/\"{}\"", version.into());
    if let Some(val) = headers.get(header::IF_NONE_MATCH) {
        if let Ok(s) = val.to_str() {
            return s
                .split(',')
                .map(str::trim)
                .any(|part| part == "*" || part == needle);
        }
    }
    false
}

/// Empty 304 answer that repeats the current weak ETag.
pub fn not_modified(version: &str) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    if let Ok(val) = HeaderValue::from_str(&format!("W/\"{version}\"")) {
        response.headers_mut().insert(header::ETAG, val);
    }
    response
}

/// Extract the version id from an `If-Match` header.
///
/// Accepts `W/"3"` and `"3"`. Returns `Ok(None)` when the header is absent.
pub fn parse_if_match(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(raw) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|_| ApiError::bad_request("If-Match header is not valid ASCII"))?
        .trim();
    let tag = raw.strip_prefix("W/").unwrap_or(raw);
    let version = tag
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("Malformed If-Match header: {raw}")))?;
    Ok(Some(version.to_string()))
}

#[cfg(test)]
mod caching_tests {
    use super::*;

    #[test]
    fn etag_and_last_modified_headers_added() {
        let payload = serde_json::json!({"resourceType":"Composition","id":"1"});
        let resp = ApiResponse::ok(payload)
            .with_etag_weak("7")
            .with_last_modified_raw("Wed, 21 Oct 2015 07:28:00 GMT")
            .into_response();
        assert_eq!(
            resp.headers().get(header::ETAG).unwrap(),
            &HeaderValue::from_static("W/\"7\"")
        );
        assert_eq!(
            resp.headers().get(header::LAST_MODIFIED).unwrap(),
            &HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn if_none_match_matches_weak_etag() {
        let mut headers = HeaderMap::new();
        assert!(!check_if_none_match(&headers, "7"));
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_static("W/\"6\", W/\"7\""),
        );
        assert!(check_if_none_match(&headers, "7"));
        assert!(!check_if_none_match(&headers, "8"));
    }

    #[test]
    fn not_modified_repeats_etag() {
        let resp = not_modified("3");
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.headers().get(header::ETAG).unwrap(), "W/\"3\"");
    }

    #[test]
    fn if_match_forms() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_if_match(&headers).unwrap(), None);

        headers.insert(header::IF_MATCH, HeaderValue::from_static("W/\"2\""));
        assert_eq!(parse_if_match(&headers).unwrap().as_deref(), Some("2"));

        headers.insert(header::IF_MATCH, HeaderValue::from_static("\"5\""));
        assert_eq!(parse_if_match(&headers).unwrap().as_deref(), Some("5"));

        headers.insert(header::IF_MATCH, HeaderValue::from_static("5"));
        let err = parse_if_match(&headers).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}

// -------------------------
// FHIR Bundle Types
// -------------------------
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

impl BundleLink {
    pub fn self_link(url: impl Into<String>) -> Self {
        Self {
            relation: "self".to_string(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleEntry {
    #[serde(rename = "fullUrl", skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<BundleEntrySearch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleEntryRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<BundleEntryResponse>,
}

/// Search component of a Bundle entry (used in searchset bundles)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleEntrySearch {
    /// "match" for results, "outcome" for the warnings entry
    pub mode: String,
}

/// Request component of a Bundle entry (used in history bundles)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleEntryRequest {
    pub method: String,
    pub url: String,
}

/// Response component of a Bundle entry (used in history bundles)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleEntryResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "lastModified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bundle {
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    #[serde(rename = "type")]
    pub bundle_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub link: Vec<BundleLink>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub fn searchset(total: u64, entries: Vec<BundleEntry>, links: Vec<BundleLink>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: "searchset".to_string(),
            total: Some(total),
            link: links,
            entry: entries,
        }
    }

    pub fn history(total: u64, entries: Vec<BundleEntry>, links: Vec<BundleLink>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: "history".to_string(),
            total: Some(total),
            link: links,
            entry: entries,
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Build a searchset bundle from current resource versions.
///
/// `query` is the raw query string the client sent, echoed in the self link.
/// A `warnings` outcome with issues becomes the first entry with search mode
/// "outcome"; it does not count towards `total`.
pub fn bundle_from_search(
    resources: Vec<JsonValue>,
    base_url: &str,
    resource_type: &str,
    query: Option<&str>,
    warnings: Option<OperationOutcome>,
) -> Result<Bundle, serde_json::Error> {
    let total = resources.len() as u64;
    let mut entries = Vec::with_capacity(resources.len() + 1);

    if let Some(outcome) = warnings.filter(OperationOutcome::has_issues) {
        entries.push(BundleEntry {
            full_url: None,
            resource: Some(serde_json::to_value(&outcome)?),
            search: Some(BundleEntrySearch {
                mode: "outcome".to_string(),
            }),
            request: None,
            response: None,
        });
    }

    for res in resources {
        let full_url = res
            .get("id")
            .and_then(|v| v.as_str())
            .map(|id| join_url(base_url, &format!("{resource_type}/{id}")));
        entries.push(BundleEntry {
            full_url,
            resource: Some(res),
            search: Some(BundleEntrySearch {
                mode: "match".to_string(),
            }),
            request: None,
            response: None,
        });
    }

    let mut self_url = join_url(base_url, resource_type);
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        self_url.push('?');
        self_url.push_str(q);
    }

    Ok(Bundle::searchset(total, entries, vec![BundleLink::self_link(self_url)]))
}

/// HTTP interaction that produced a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBundleMethod {
    Create,
    Update,
}

impl HistoryBundleMethod {
    pub fn http_method(&self) -> &'static str {
        match self {
            Self::Create => "POST",
            Self::Update => "PUT",
        }
    }

    pub fn http_status(&self) -> &'static str {
        match self {
            Self::Create => "201 Created",
            Self::Update => "200 OK",
        }
    }
}

/// One version of a resource, ready for a history bundle
#[derive(Debug, Clone)]
pub struct HistoryBundleEntry {
    pub resource: JsonValue,
    pub version_id: String,
    /// RFC 3339 timestamp
    pub last_modified: Option<String>,
    pub method: HistoryBundleMethod,
}

/// Build an instance history bundle. Entries are written in the order given.
pub fn bundle_from_history(
    entries: Vec<HistoryBundleEntry>,
    base_url: &str,
    resource_type: &str,
    id: &str,
) -> Bundle {
    let total = entries.len() as u64;
    let instance = format!("{resource_type}/{id}");
    let full_url = join_url(base_url, &instance);

    let bundle_entries = entries
        .into_iter()
        .map(|entry| {
            let request_url = match entry.method {
                HistoryBundleMethod::Create => resource_type.to_string(),
                HistoryBundleMethod::Update => instance.clone(),
            };
            BundleEntry {
                full_url: Some(full_url.clone()),
                resource: Some(entry.resource),
                search: None,
                request: Some(BundleEntryRequest {
                    method: entry.method.http_method().to_string(),
                    url: request_url,
                }),
                response: Some(BundleEntryResponse {
                    status: entry.method.http_status().to_string(),
                    etag: Some(format!("W/\"{}\"", entry.version_id)),
                    last_modified: entry.last_modified,
                }),
            }
        })
        .collect();

    let self_url = join_url(base_url, &format!("{instance}/_history"));
    Bundle::history(total, bundle_entries, vec![BundleLink::self_link(self_url)])
}

#[cfg(test)]
mod bundle_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn searchset_bundle_shape() {
        let b = bundle_from_search(
            vec![json!({"resourceType": "Composition", "id": "1"})],
            "http://example.org/fhir/",
            "Composition",
            None,
            None,
        )
        .unwrap();
        let j = serde_json::to_value(&b).unwrap();
        assert_eq!(j["resourceType"], "Bundle");
        assert_eq!(j["type"], "searchset");
        assert_eq!(j["total"], 1);
        assert_eq!(j["link"][0]["url"], "http://example.org/fhir/Composition");
        assert_eq!(
            j["entry"][0]["fullUrl"],
            "http://example.org/fhir/Composition/1"
        );
        assert_eq!(j["entry"][0]["search"]["mode"], "match");
    }

    #[test]
    fn searchset_with_warnings_puts_outcome_first() {
        let warnings = OperationOutcome::ignored_params_warning(["title"]);
        let b = bundle_from_search(
            vec![
                json!({"resourceType": "Composition", "id": "1"}),
                json!({"resourceType": "Composition", "id": "2"}),
            ],
            "http://example.org/fhir",
            "Composition",
            Some("title=x"),
            Some(warnings),
        )
        .unwrap();
        assert_eq!(b.total, Some(2));
        assert_eq!(b.entry.len(), 3);
        assert_eq!(b.entry[0].search.as_ref().unwrap().mode, "outcome");
        assert_eq!(
            b.entry[0].resource.as_ref().unwrap()["resourceType"],
            "OperationOutcome"
        );
        assert!(b.entry[0].full_url.is_none());
        assert_eq!(b.link[0].url, "http://example.org/fhir/Composition?title=x");
    }

    #[test]
    fn empty_warnings_add_no_entry() {
        let b = bundle_from_search(
            Vec::new(),
            "http://example.org/fhir",
            "Composition",
            None,
            Some(OperationOutcome::warnings(Vec::new())),
        )
        .unwrap();
        assert_eq!(b.total, Some(0));
        assert!(b.entry.is_empty());
    }

    #[test]
    fn history_bundle_shape() {
        let entries = vec![
            HistoryBundleEntry {
                resource: json!({"resourceType": "Composition", "id": "1"}),
                version_id: "2".into(),
                last_modified: Some("2024-01-15T10:30:00Z".into()),
                method: HistoryBundleMethod::Update,
            },
            HistoryBundleEntry {
                resource: json!({"resourceType": "Composition", "id": "1"}),
                version_id: "1".into(),
                last_modified: None,
                method: HistoryBundleMethod::Create,
            },
        ];
        let b = bundle_from_history(entries, "http://example.org/fhir", "Composition", "1");
        let j = serde_json::to_value(&b).unwrap();
        assert_eq!(j["type"], "history");
        assert_eq!(j["total"], 2);
        assert_eq!(
            j["link"][0]["url"],
            "http://example.org/fhir/Composition/1/_history"
        );
        assert_eq!(j["entry"][0]["request"]["method"], "PUT");
        assert_eq!(j["entry"][0]["request"]["url"], "Composition/1");
        assert_eq!(j["entry"][0]["response"]["etag"], "W/\"2\"");
        assert_eq!(j["entry"][1]["request"]["method"], "POST");
        assert_eq!(j["entry"][1]["request"]["url"], "Composition");
        assert_eq!(j["entry"][1]["response"]["status"], "201 Created");
        assert!(j["entry"][1]["response"].get("lastModified").is_none());
    }
}

// -------------------------
// CapabilityStatement
// -------------------------
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityStatement {
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<CapabilityStatementSoftware>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<CapabilityStatementImplementation>,
    #[serde(rename = "fhirVersion")]
    pub fhir_version: String,
    pub format: Vec<String>,
    #[serde(default)]
    pub rest: Vec<CapabilityStatementRest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityStatementSoftware {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityStatementImplementation {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityStatementRest {
    pub mode: String, // "server"
    #[serde(default)]
    pub resource: Vec<CapabilityStatementRestResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapabilityStatementRestResource {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub interaction: Vec<ResourceInteraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versioning: Option<String>,
    #[serde(rename = "readHistory", skip_serializing_if = "Option::is_none")]
    pub read_history: Option<bool>,
}

impl CapabilityStatementRestResource {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_: type_name.into(),
            interaction: Vec::new(),
            versioning: None,
            read_history: None,
        }
    }

    pub fn with_interactions(mut self, codes: &[&str]) -> Self {
        self.interaction = codes
            .iter()
            .map(|c| ResourceInteraction {
                code: c.to_string(),
            })
            .collect();
        self
    }

    /// Marks the resource as keeping every version and serving `vread`.
    pub fn versioned(mut self) -> Self {
        self.versioning = Some("versioned".to_string());
        self.read_history = Some(true);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceInteraction {
    pub code: String, // e.g., "read", "vread", "search-type"
}

#[derive(Debug, Clone)]
pub struct CapabilityStatementBuilder {
    status: String,
    kind: String,
    date: Option<String>,
    fhir_version: String,
    formats: Vec<String>,
    software: Option<CapabilityStatementSoftware>,
    implementation: Option<CapabilityStatementImplementation>,
    resources: Vec<CapabilityStatementRestResource>,
}

impl CapabilityStatementBuilder {
    /// A JSON-only server statement for the given FHIR version (e.g. "4.0.1").
    pub fn new_json(fhir_version: impl Into<String>) -> Self {
        Self {
            status: "active".to_string(),
            kind: "instance".to_string(),
            date: None,
            fhir_version: fhir_version.into(),
            formats: vec![FHIR_JSON.to_string(), "json".to_string()],
            software: None,
            implementation: None,
            resources: Vec::new(),
        }
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
    pub fn software(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.software = Some(CapabilityStatementSoftware {
            name: name.into(),
            version: Some(version.into()),
        });
        self
    }
    pub fn implementation(mut self, description: impl Into<String>, url: impl Into<String>) -> Self {
        self.implementation = Some(CapabilityStatementImplementation {
            description: description.into(),
            url: Some(url.into()),
        });
        self
    }

    pub fn add_resource(mut self, resource: CapabilityStatementRestResource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn build(self) -> CapabilityStatement {
        CapabilityStatement {
            resource_type: "CapabilityStatement".to_string(),
            status: self.status,
            date: self.date,
            kind: self.kind,
            software: self.software,
            implementation: self.implementation,
            fhir_version: self.fhir_version,
            format: self.formats,
            rest: vec![CapabilityStatementRest {
                mode: "server".to_string(),
                resource: self.resources,
            }],
        }
    }
}

#[cfg(test)]
mod capability_statement_tests {
    use super::*;

    #[test]
    fn build_capability_statement_with_resources() {
        let cs = CapabilityStatementBuilder::new_json("4.0.1")
            .date("2024-01-01T00:00:00Z")
            .software("fhirdoc", "0.1.0")
            .implementation("fhirdoc server", "http://localhost:8080/fhir")
            .add_resource(
                CapabilityStatementRestResource::new("Composition")
                    .with_interactions(&["read", "vread", "search-type"])
                    .versioned(),
            )
            .build();

        let j = serde_json::to_value(&cs).unwrap();
        assert_eq!(j["resourceType"], "CapabilityStatement");
        assert_eq!(j["fhirVersion"], "4.0.1");
        assert_eq!(j["kind"], "instance");
        assert_eq!(j["software"]["name"], "fhirdoc");
        assert_eq!(j["implementation"]["url"], "http://localhost:8080/fhir");
        assert!(
            j["format"]
                .as_array()
                .unwrap()
                .iter()
                .any(|v| v == FHIR_JSON)
        );
        assert_eq!(j["rest"][0]["mode"], "server");
        let resource = &j["rest"][0]["resource"][0];
        assert_eq!(resource["type"], "Composition");
        assert_eq!(resource["versioning"], "versioned");
        assert_eq!(resource["readHistory"], true);
        let codes: Vec<_> = resource["interaction"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["read", "vread", "search-type"]);
    }
}
