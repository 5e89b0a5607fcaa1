//! Outbound client and request construction.
//!
//! # Responsibilities
//! - Build the shared HTTPS-or-HTTP client used for every hop
//! - Derive the outbound request from the target and the inbound request
//! - Classify client failures into relay errors
//!
//! # Design Decisions
//! - Fixed browser-like header set; only `Range` is taken from the client
//! - `Accept-Encoding: identity` so byte ranges refer to the stored file
//! - No request body is forwarded

use axum::body::Body;
use axum::http::{
    header::{ACCEPT, ACCEPT_ENCODING, CONNECTION, RANGE, REFERER, USER_AGENT},
    request, HeaderValue, Method, Request,
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::relay::error::RelayError;
use crate::relay::target::TargetDescriptor;
use crate::resilience::{is_timeout, UpstreamTimeouts};

/// Client used for all outbound hops.
pub type RelayClient = Client<HttpsConnector<HttpConnector>, Body>;

/// What the relay keeps from the inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: Method,
    pub range: Option<HeaderValue>,
}

impl InboundRequest {
    pub fn new(method: Method, range: Option<HeaderValue>) -> Self {
        Self { method, range }
    }

    pub fn from_parts(parts: &request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            range: parts.headers.get(RANGE).cloned(),
        }
    }
}

impl Default for InboundRequest {
    fn default() -> Self {
        Self::new(Method::GET, None)
    }
}

/// Create the outbound client.
pub fn build_client(timeouts: &UpstreamTimeouts) -> RelayClient {
    let mut http_connector = HttpConnector::new();
    http_connector.set_connect_timeout(Some(timeouts.connect));
    http_connector.enforce_http(false); // Allow both HTTP and HTTPS

    let https_connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    Client::builder(TokioExecutor::new()).build(https_connector)
}

/// Build the request for one hop.
pub fn build_request(
    target: &TargetDescriptor,
    inbound: &InboundRequest,
    user_agent: &HeaderValue,
) -> Result<Request<Body>, RelayError> {
    let mut builder = Request::builder()
        .method(inbound.method.clone())
        .uri(target.request_uri())
        .header(USER_AGENT, user_agent.clone())
        .header(ACCEPT, "*/*")
        .header(ACCEPT_ENCODING, "identity")
        .header(CONNECTION, "keep-alive")
        .header(REFERER, target.referer());

    if let Some(range) = &inbound.range {
        builder = builder.header(RANGE, range.clone());
    }

    Ok(builder.body(Body::empty())?)
}

/// Map a client failure onto the relay taxonomy.
pub fn classify(err: hyper_util::client::legacy::Error) -> RelayError {
    if is_timeout(&err) {
        RelayError::Timeout
    } else {
        RelayError::Connection(err)
    }
}
