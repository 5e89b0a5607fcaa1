//! Timeout enforcement.
//!
//! # Responsibilities
//! - Turn configured millisecond budgets into durations for each outbound phase
//! - Enforce connect, response and idle deadlines
//! - Recognise timeouts buried inside connector error chains
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A timed-out request is never retried

use std::error::Error;
use std::future::Future;
use std::time::Duration;

use crate::config::TimeoutConfig;

/// Deadlines applied to every outbound hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    /// TCP/TLS connection establishment.
    pub connect: Duration,
    /// From request start until the response head arrives.
    pub response: Duration,
    /// Longest silence between two body chunks.
    pub idle: Duration,
}

impl From<&TimeoutConfig> for UpstreamTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_millis(config.connect_ms),
            response: Duration::from_millis(config.response_ms),
            idle: Duration::from_millis(config.idle_ms),
        }
    }
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

/// The deadline passed before the operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` to completion or fail once `limit` has passed.
///
/// The future is dropped on expiry, which closes any socket it owns.
pub async fn with_deadline<F: Future>(limit: Duration, fut: F) -> Result<F::Output, DeadlineExceeded> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineExceeded(limit))
}

/// Whether an error, or anything in its source chain, is a timeout.
pub fn is_timeout(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        if e.is::<tokio::time::error::Elapsed>() {
            return true;
        }
        current = e.source();
    }
    false
}
