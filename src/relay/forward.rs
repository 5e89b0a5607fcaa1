//! Hop loop: issue the outbound request, follow redirects, hand the final
//! response to the streaming stage.
//!
//! # State Machine
//! ```text
//!            ┌──────────── 3xx + Location ────────────┐
//!            ▼                                        │
//!   ──▶ [issue hop] ──response──▶ REDIRECTING ────────┘
//!            │                       │ depth > max_redirects
//!            │ any other status      ▼
//!            ▼                  TooManyRedirects
//!        STREAMING ──▶ commit head, pump body
//! ```
//!
//! # Design Decisions
//! - Hops are sequential; a redirect response is dropped before the next hop
//! - Every hop runs under the response deadline; a client that leaves drops
//!   the whole relay future, which drops the in-flight request with it
//! - Headers reach the client only after the final hop is known

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::LOCATION, HeaderValue, Response};
use hyper::body::Incoming;
use tokio_util::sync::CancellationToken;

use crate::config::{RelayConfig, DEFAULT_USER_AGENT};
use crate::observability::metrics;
use crate::relay::body::stream_body;
use crate::relay::error::RelayError;
use crate::relay::outbound::{build_client, build_request, classify, InboundRequest, RelayClient};
use crate::relay::response::{commit, relayed_headers};
use crate::relay::target::TargetDescriptor;
use crate::resilience::{with_deadline, UpstreamTimeouts};

/// Immutable per-process relay settings, derived from config once.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub user_agent: HeaderValue,
    pub default_content_type: HeaderValue,
    pub max_redirects: usize,
    pub stream_buffer_chunks: usize,
    pub timeouts: UpstreamTimeouts,
}

impl RelaySettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        let user_agent = HeaderValue::from_str(&config.upstream.user_agent).unwrap_or_else(|_| {
            tracing::warn!("Configured user agent is not a valid header value, using default");
            HeaderValue::from_static(DEFAULT_USER_AGENT)
        });
        let default_content_type = HeaderValue::from_str(&config.upstream.default_content_type)
            .unwrap_or_else(|_| {
                tracing::warn!("Configured default content type is not a valid header value, using video/mp4");
                HeaderValue::from_static("video/mp4")
            });

        Self {
            user_agent,
            default_content_type,
            max_redirects: config.upstream.max_redirects,
            stream_buffer_chunks: config.upstream.stream_buffer_chunks,
            timeouts: UpstreamTimeouts::from(&config.timeouts),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

/// The final (non-redirect) origin response of a relay.
#[derive(Debug)]
pub struct Upstream {
    pub response: Response<Incoming>,
    /// Target that produced the response.
    pub target: TargetDescriptor,
    /// Redirects followed to reach it.
    pub redirects: usize,
}

/// Stateless streaming relay. Cheap to clone; clones share the client.
#[derive(Clone)]
pub struct Relay {
    client: RelayClient,
    settings: Arc<RelaySettings>,
}

impl Relay {
    pub fn new(settings: RelaySettings) -> Self {
        let client = build_client(&settings.timeouts);
        Self {
            client,
            settings: Arc::new(settings),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(RelaySettings::from_config(config))
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Relay `target` for `inbound`, returning the committed client response.
    ///
    /// The returned body keeps streaming after this returns. Dropping this
    /// future drops the pending hop; dropping the body later fires the
    /// token held by its guard, which stops the copy task.
    pub async fn relay(
        &self,
        target: TargetDescriptor,
        inbound: InboundRequest,
    ) -> Result<Response<Body>, RelayError> {
        let upstream = self.fetch(target, &inbound).await?;
        if upstream.redirects > 0 {
            tracing::debug!(
                origin = %upstream.target,
                redirects = upstream.redirects,
                "Redirect chain resolved"
            );
        }

        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();
        let (parts, incoming) = upstream.response.into_parts();
        let headers = relayed_headers(&parts.headers, &self.settings.default_content_type);
        let body = stream_body(
            incoming,
            self.settings.timeouts.idle,
            self.settings.stream_buffer_chunks,
            cancel,
            guard,
        );

        Ok(commit(parts.status, headers, body))
    }

    /// Run hops until a non-redirect response arrives.
    pub async fn fetch(
        &self,
        mut target: TargetDescriptor,
        inbound: &InboundRequest,
    ) -> Result<Upstream, RelayError> {
        let mut redirects = 0usize;

        loop {
            let request = build_request(&target, inbound, &self.settings.user_agent)?;

            tracing::debug!(
                origin = %target,
                hop = redirects,
                method = %inbound.method,
                range = ?inbound.range,
                "Issuing upstream request"
            );

            let response =
                match with_deadline(self.settings.timeouts.response, self.client.request(request)).await {
                    Err(_) => return Err(RelayError::Timeout),
                    Ok(Err(e)) => return Err(classify(e)),
                    Ok(Ok(response)) => response,
                };

            let Some(location) = redirect_location(&response) else {
                return Ok(Upstream {
                    response,
                    target,
                    redirects,
                });
            };

            if redirects >= self.settings.max_redirects {
                return Err(RelayError::TooManyRedirects(self.settings.max_redirects));
            }
            let location = location
                .to_str()
                .map_err(|_| RelayError::InvalidRedirect(String::from_utf8_lossy(location.as_bytes()).into_owned()))?;
            let next = target.resolve_redirect(location)?;

            tracing::info!(
                from = %target,
                to = %next,
                status = response.status().as_u16(),
                "Following redirect"
            );
            // Release this hop's connection before opening the next one.
            drop(response);

            metrics::record_redirect();
            redirects += 1;
            target = next;
        }
    }
}

/// `Location` of a 3xx response, if it has one.
fn redirect_location<B>(response: &Response<B>) -> Option<HeaderValue> {
    if !response.status().is_redirection() {
        return None;
    }
    response.headers().get(LOCATION).filter(|v| !v.is_empty()).cloned()
}
