//! Streaming video relay library.
//!
//! Re-issues a player's media request to the origin named in `?url=`,
//! forwarding `Range`, following redirects, and streaming the body back.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod resilience;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{Relay, RelayError, TargetDescriptor};
