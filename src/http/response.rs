//! Response shaping common to every route.
//!
//! # Responsibilities
//! - Render relay failures as `{"error": "..."}` JSON
//! - Define the CORS headers stamped on every response
//!
//! # Design Decisions
//! - CORS headers are applied by a layer, so error and preflight
//!   responses carry them too
//! - Error bodies are only produced before the response head is committed

use axum::http::{
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_EXPOSE_HEADERS,
    },
    HeaderName, HeaderValue,
};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::relay::RelayError;

/// CORS headers set on every response regardless of outcome.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 4] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, HEAD, OPTIONS")),
        (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Range, Content-Type")),
        (
            ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("Content-Length, Content-Range, Accept-Ranges"),
        ),
    ]
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::CONTENT_TYPE, StatusCode};
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn missing_url_renders_json_400() {
        let response = RelayError::MissingUrl.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Missing url parameter" }));
    }

    #[tokio::test]
    async fn timeout_renders_json_500() {
        let response = RelayError::Timeout.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"error":"Request timeout"}"#);
    }

    #[test]
    fn cors_header_values() {
        let headers = cors_headers();
        assert_eq!(headers[0].1, "*");
        assert_eq!(headers[1].1, "GET, HEAD, OPTIONS");
        assert_eq!(headers[2].1, "Range, Content-Type");
        assert_eq!(headers[3].1, "Content-Length, Content-Range, Accept-Ranges");
    }
}
