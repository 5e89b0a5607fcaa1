//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics exporter → Bind listener → Build server
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections (bounded) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then exporters, then listener
//! - Shutdown has timeout: open streams are dropped after the deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{drain, Shutdown, DRAIN_TIMEOUT};
pub use signals::{wait_for_signal, StopSignal};
pub use startup::{start, Started};
