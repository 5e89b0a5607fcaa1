//! Streaming relay subsystem.
//!
//! # Data Flow
//! ```text
//! url query parameter
//!     → target.rs (classify scheme, derive host/port/path)
//!     → outbound.rs (impersonation headers + forwarded Range)
//!     → forward.rs (hop loop, redirects, deadlines, cancellation)
//!     → response.rs (status + header allowlist)
//!     → body.rs (bounded copy task, origin → client)
//! ```
//!
//! # Design Decisions
//! - Stateless: nothing survives a request except the client's connection pool
//! - Response head is written once, after the last redirect
//! - Client disconnect is the only cancellation trigger

pub mod body;
pub mod error;
pub mod forward;
pub mod outbound;
pub mod response;
pub mod target;

pub use error::RelayError;
pub use forward::{Relay, RelaySettings, Upstream};
pub use outbound::InboundRequest;
pub use target::{TargetDescriptor, TargetScheme};
