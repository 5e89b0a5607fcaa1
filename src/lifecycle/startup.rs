//! Startup orchestration.
//!
//! # Responsibilities
//! - Start background exporters (metrics)
//! - Bind the listener and build the server
//!
//! # Design Decisions
//! - Fail fast: a bind error is fatal
//! - A metrics exporter failure is logged, not fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::http::HttpServer;
use crate::observability::metrics;

/// A server ready to accept traffic.
pub struct Started {
    pub server: HttpServer,
    pub listener: TcpListener,
}

impl Started {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Initialise subsystems in dependency order and bind the listener.
pub async fn start(config: RelayConfig) -> std::io::Result<Started> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config);

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(Started { server, listener })
}
