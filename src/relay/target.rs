//! Target descriptor: the parsed origin location of the media being relayed.
//!
//! # Responsibilities
//! - Classify the client-supplied URL (http or https only)
//! - Derive host, port (default 80/443) and path+query
//! - Resolve redirect `Location` values against the current hop
//!
//! # Design Decisions
//! - `Location: /path` keeps the current scheme and authority (port included)
//!   and is sent as written: no dot-segment folding, `//x` stays a path
//! - Any other `Location` must be a complete absolute URL
//! - Fragments never reach the origin

use std::fmt;

use axum::http::uri::PathAndQuery;
use url::Url;

use crate::relay::error::RelayError;

/// Scheme of an origin URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScheme {
    Http,
    Https,
}

impl TargetScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetScheme::Http => "http",
            TargetScheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            TargetScheme::Http => 80,
            TargetScheme::Https => 443,
        }
    }
}

/// Parsed scheme/host/port/path of one relay hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    scheme: TargetScheme,
    host: String,
    port: u16,
    path_and_query: String,
}

impl TargetDescriptor {
    /// Parse a client-supplied target URL.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RelayError::MissingUrl);
        }
        let url = Url::parse(raw).map_err(|e| RelayError::InvalidUrl(format!("{}: {}", raw, e)))?;
        Self::from_url(url)
    }

    fn from_url(url: Url) -> Result<Self, RelayError> {
        let scheme = match url.scheme() {
            "http" => TargetScheme::Http,
            "https" => TargetScheme::Https,
            other => return Err(RelayError::UnsupportedScheme(other.to_string())),
        };
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(RelayError::InvalidUrl(format!("{}: missing host", url))),
        };
        let port = url.port().unwrap_or(scheme.default_port());
        let path_and_query = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        Ok(Self {
            scheme,
            host,
            port,
            path_and_query,
        })
    }

    pub fn scheme(&self) -> TargetScheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Path plus query, as sent in the request line.
    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// `host[:port]`, with the port omitted when it is the scheme default.
    pub fn authority(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Absolute request URI for the outbound request (no userinfo, no fragment).
    pub fn request_uri(&self) -> String {
        format!("{}://{}{}", self.scheme.as_str(), self.authority(), self.path_and_query())
    }

    /// Referer presented to the origin: `<scheme>://<host>/`.
    pub fn referer(&self) -> String {
        format!("{}://{}/", self.scheme.as_str(), self.host)
    }

    /// Resolve a redirect `Location` against this hop.
    pub fn resolve_redirect(&self, location: &str) -> Result<Self, RelayError> {
        let invalid = || RelayError::InvalidRedirect(location.to_string());

        if location.starts_with('/') {
            let path = location.split_once('#').map_or(location, |(path, _)| path);
            let path: PathAndQuery = path.parse().map_err(|_| invalid())?;
            return Ok(Self {
                path_and_query: path.as_str().to_string(),
                ..self.clone()
            });
        }

        let next = Url::parse(location).map_err(|_| invalid())?;
        Self::from_url(next).map_err(|_| invalid())
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.request_uri())
    }
}
