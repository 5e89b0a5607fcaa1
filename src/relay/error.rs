//! Relay error taxonomy.

use std::error::Error as StdError;

use axum::http::StatusCode;
use thiserror::Error;

/// Everything that can stop a relay before the response head is committed.
///
/// Failures after the commit never surface as a `RelayError`; the body
/// stream simply ends. A client that leaves earlier is not an error either:
/// the relay future is dropped before it can return.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing url parameter")]
    MissingUrl,

    #[error("Invalid url parameter: {0}")]
    InvalidUrl(String),

    #[error("Unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid redirect location: {0}")]
    InvalidRedirect(String),

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("{}", describe(.0))]
    Connection(#[source] hyper_util::client::legacy::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}

impl RelayError {
    /// Status code sent to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl(_) | RelayError::UnsupportedScheme(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl(_) | RelayError::UnsupportedScheme(_) => {
                "validation"
            }
            RelayError::InvalidRedirect(_) => "invalid_redirect",
            RelayError::TooManyRedirects(_) => "too_many_redirects",
            RelayError::Connection(_) => "connection",
            RelayError::Timeout => "timeout",
            RelayError::Request(_) => "request",
        }
    }

    /// Rejected before any outbound connection was attempted.
    pub fn is_validation(&self) -> bool {
        self.status() == StatusCode::BAD_REQUEST
    }
}

/// Join an error with its sources: `"client error (Connect): tcp connect error: refused"`.
fn describe(err: &hyper_util::client::legacy::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
