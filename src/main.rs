//! Video relay (v1)
//!
//! A streaming HTTP(S) relay for browser video players, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                   VIDEO RELAY                     │
//!                    │                                                   │
//!   Player request   │  ┌────────┐   ┌──────────┐   ┌───────────────┐   │
//!   ?url=…, Range ───┼─▶│  http  │──▶│  target  │──▶│   outbound    │───┼──▶ Origin
//!                    │  │ server │   │  parser  │   │ (hop loop,    │   │
//!                    │  └────────┘   └──────────┘   │  redirects)   │◀──┼─── 3xx / 2xx
//!                    │       ▲                      └───────┬───────┘   │
//!   Streamed body    │  ┌────┴─────┐                        │           │
//!   ◀────────────────┼──│ response │◀──── body pump ◀───────┘           │
//!                    │  │ allowlist│   (bounded, cancellable)           │
//!                    │  └──────────┘                                    │
//!                    │                                                   │
//!                    │  config · observability · resilience · lifecycle │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use video_relay::config::{load_config, RelayConfig};
use video_relay::lifecycle::{self, Shutdown, DRAIN_TIMEOUT};
use video_relay::observability::logging;

#[derive(Parser)]
#[command(name = "video-relay")]
#[command(about = "Streaming relay for browser video players", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("video-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_redirects = config.upstream.max_redirects,
        response_timeout_ms = config.timeouts.response_ms,
        "Configuration loaded"
    );

    let started = lifecycle::start(config).await?;

    let shutdown = Shutdown::new();
    let mut serve = tokio::spawn(started.server.run(started.listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut serve => {
            result??;
            return Ok(());
        }
        signal = lifecycle::wait_for_signal() => {
            let signal = signal?;
            tracing::info!(signal = ?signal, "Stop requested");
        }
    }

    shutdown.trigger();
    if let Some(result) = lifecycle::drain(&mut serve, DRAIN_TIMEOUT).await {
        result??;
    } else {
        serve.abort();
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
