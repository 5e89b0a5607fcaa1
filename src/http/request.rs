//! Request handling.
//!
//! # Responsibilities
//! - Read the request ID set by the request-id layer
//! - Extract and classify the `url` query parameter
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A missing or empty `url` is rejected before any outbound work

use axum::extract::Query;
use axum::http::{HeaderMap, HeaderName, Uri};
use serde::Deserialize;

use crate::relay::{RelayError, TargetDescriptor};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Query string of a relay request.
#[derive(Debug, Deserialize)]
pub struct RelayParams {
    pub url: Option<String>,
}

/// Correlation ID of a request, or `"unknown"` outside the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Parse the relay target out of the request URI.
pub fn target_from_uri(uri: &Uri) -> Result<TargetDescriptor, RelayError> {
    let Query(params) = Query::<RelayParams>::try_from_uri(uri)
        .map_err(|e| RelayError::InvalidUrl(e.body_text()))?;

    match params.url.as_deref() {
        None => Err(RelayError::MissingUrl),
        Some(raw) if raw.trim().is_empty() => Err(RelayError::MissingUrl),
        Some(raw) => TargetDescriptor::parse(raw),
    }
}
