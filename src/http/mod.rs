//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, CORS, trace span)
//!     → request.rs (request ID, `url` parameter → target)
//!     → relay (hop loop, streaming body)
//!     → response.rs (error JSON, CORS header set)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, target_from_uri, RelayParams, X_REQUEST_ID};
pub use server::HttpServer;
