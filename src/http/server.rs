//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay and health handlers
//! - Wire up middleware (request ID, tracing, CORS headers)
//! - Bind server to listener
//! - Dispatch relay requests to the streaming relay
//! - Record per-request metrics

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::validation::HEALTH_PATH;
use crate::config::RelayConfig;
use crate::http::request::{request_id, target_from_uri};
use crate::http::response::cors_headers;
use crate::observability::metrics;
use crate::relay::{InboundRequest, Relay};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Self {
        let state = AppState {
            relay: Relay::from_config(&config),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let mut router = Router::new().route(HEALTH_PATH, get(health_handler));
        for path in &config.listener.paths {
            router = router.route(path, any(relay_handler));
        }
        let mut router = router.with_state(state);

        for (name, value) in cors_headers() {
            router = router.layer(SetResponseHeaderLayer::overriding(name, value));
        }

        // Layers added last run first: the ID must exist before the span is made.
        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request.headers()),
                    peer = ?request.extensions().get::<ConnectInfo<SocketAddr>>().map(|c| c.0),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain open connections.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            paths = ?self.config.listener.paths,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "operational",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Relay handler: `<path>?url=<target>`.
async fn relay_handler(State(state): State<AppState>, request: Request) -> Response {
    // CORS preflight.
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let (parts, _body) = request.into_parts();

    let target = match target_from_uri(&parts.uri) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected relay request");
            metrics::record_request(e.status().as_u16(), start_time);
            return e.into_response();
        }
    };
    let inbound = InboundRequest::from_parts(&parts);

    tracing::info!(
        request_id = %request_id,
        method = %inbound.method,
        origin = %target,
        range = ?inbound.range,
        "Relaying request"
    );

    match state.relay.relay(target, inbound).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                status = response.status().as_u16(),
                "Response head committed"
            );
            metrics::record_request(response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, kind = e.kind(), "Relay failed");
            metrics::record_upstream_error(e.kind());
            metrics::record_request(e.status().as_u16(), start_time);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::ACCESS_CONTROL_ALLOW_ORIGIN, Request as HttpRequest};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn server() -> HttpServer {
        HttpServer::new(RelayConfig::default())
    }

    #[tokio::test]
    async fn preflight_answers_200_with_cors() {
        let response = server()
            .router()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::OPTIONS)
                    .uri("/proxy")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(response.headers().contains_key("x-request-id"));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn missing_url_is_400_on_every_path() {
        for path in ["/proxy", "/api/proxy"] {
            let response = server()
                .router()
                .oneshot(HttpRequest::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], br#"{"error":"Missing url parameter"}"#);
        }
    }

    #[tokio::test]
    async fn health_reports_version() {
        let response = server()
            .router()
            .oneshot(HttpRequest::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "operational");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
