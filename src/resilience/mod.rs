//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound hop:
//!     → timeouts.rs (connect deadline inside the connector)
//!     → timeouts.rs (response-head deadline around the request)
//!     → timeouts.rs (idle deadline between body chunks)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No automatic retries: a redirect is the only re-request

pub mod timeouts;

pub use timeouts::{is_timeout, with_deadline, DeadlineExceeded, UpstreamTimeouts};
