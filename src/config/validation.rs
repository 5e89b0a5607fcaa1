//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check header-bound strings are legal header values
//! - Detect conflicting relay paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::RelayConfig;

/// Path reserved for the liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. `timeouts.idle_ms`).
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.listener.paths.is_empty() {
        errors.push(ValidationError::new("listener.paths", "at least one relay path is required"));
    }
    let mut seen = HashSet::new();
    for path in &config.listener.paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "listener.paths",
                format!("'{}' must start with '/'", path),
            ));
        } else if path == HEALTH_PATH {
            errors.push(ValidationError::new(
                "listener.paths",
                format!("'{}' is reserved for health checks", path),
            ));
        }
        if !seen.insert(path.as_str()) {
            errors.push(ValidationError::new(
                "listener.paths",
                format!("'{}' is listed more than once", path),
            ));
        }
    }

    if HeaderValue::from_str(&config.upstream.user_agent).is_err() {
        errors.push(ValidationError::new("upstream.user_agent", "not a valid header value"));
    }
    if config.upstream.default_content_type.trim().is_empty() {
        errors.push(ValidationError::new("upstream.default_content_type", "must not be empty"));
    } else if HeaderValue::from_str(&config.upstream.default_content_type).is_err() {
        errors.push(ValidationError::new(
            "upstream.default_content_type",
            "not a valid header value",
        ));
    }
    if config.upstream.stream_buffer_chunks == 0 {
        errors.push(ValidationError::new("upstream.stream_buffer_chunks", "must be greater than 0"));
    }

    for (field, value) in [
        ("timeouts.connect_ms", config.timeouts.connect_ms),
        ("timeouts.response_ms", config.timeouts.response_ms),
        ("timeouts.idle_ms", config.timeouts.idle_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
