use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use fhirdoc_api::{validate_accept, validate_content_type};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id carried in request extensions for handlers and spans.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

// Ensures each request has an X-Request-Id and mirrors it on the response
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);

    // Keep a client-supplied id when it is printable; otherwise generate one
    let incoming = req
        .headers()
        .get(&header_name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned);
    let id = incoming.unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(header_name, value);
    }
    res
}

// Content negotiation: JSON only for Accept, and a JSON Content-Type for POST/PUT.
pub async fn content_negotiation(req: Request<Body>, next: Next) -> Response {
    if let Err(err) = validate_accept(req.headers()) {
        return err.into_response();
    }

    let method = req.method();
    if (method == Method::POST || method == Method::PUT)
        && let Err(err) = validate_content_type(req.headers())
    {
        return err.into_response();
    }

    next.run(req).await
}
