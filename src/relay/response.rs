//! Response relaying: which origin headers reach the client.
//!
//! Only an allowlist survives. `Cache-Control` is always `no-cache` and
//! `Content-Type` falls back to the configured default.

use axum::body::Body;
use axum::http::{
    header::{ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE},
    HeaderMap, HeaderValue, Response, StatusCode,
};

/// Headers copied verbatim when the origin sends them.
const PASSTHROUGH: [axum::http::HeaderName; 3] = [ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE];

/// Derive the client-facing header set from the origin's headers.
pub fn relayed_headers(upstream: &HeaderMap, default_content_type: &HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(5);

    let content_type = upstream
        .get(CONTENT_TYPE)
        .filter(|v| !v.is_empty())
        .unwrap_or(default_content_type);
    headers.insert(CONTENT_TYPE, content_type.clone());
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    for name in PASSTHROUGH {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }
    headers
}

/// Commit the final origin status and filtered headers around a streaming body.
pub fn commit(status: StatusCode, headers: HeaderMap, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
