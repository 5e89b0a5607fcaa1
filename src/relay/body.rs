//! Streaming body relay.
//!
//! # Data Flow
//! ```text
//! origin body ──frames──▶ pump task ──Bytes──▶ bounded channel ──▶ client Body
//!                             ▲                                        │
//!                             └──── CancellationToken ◀── DropGuard ───┘
//! ```
//!
//! The client body owns the drop guard: when hyper drops it (download
//! finished or client gone) the token fires and the pump drops the origin
//! body, which closes the origin connection. The pump ending (origin EOF,
//! origin error, idle timeout) closes the channel, which ends the client
//! body without an error frame.

use std::convert::Infallible;
use std::fmt::Display;
use std::time::Duration;

use axum::body::{Body, Bytes};
use futures_util::stream;
use http_body_util::BodyExt;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::observability::metrics::ActiveStream;

/// Why a pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Origin signalled end of stream.
    Complete,
    /// Inbound side went away.
    Cancelled,
    /// Origin failed mid-transfer.
    UpstreamError,
    /// Origin stayed silent longer than the idle limit.
    IdleTimeout,
}

/// Summary of one finished stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    pub outcome: PumpOutcome,
    pub bytes: u64,
}

/// Spawn the copy task and return the client-facing body.
pub fn stream_body<B>(
    upstream: B,
    idle: Duration,
    buffer: usize,
    cancel: CancellationToken,
    guard: DropGuard,
) -> Body
where
    B: hyper::body::Body<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Display + Send,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));

    tokio::spawn(async move {
        let report = pump(upstream, tx, idle, cancel).await;
        match report.outcome {
            PumpOutcome::Complete => {
                tracing::debug!(bytes = report.bytes, "Upstream stream complete")
            }
            PumpOutcome::Cancelled => {
                tracing::debug!(bytes = report.bytes, "Client went away, upstream closed")
            }
            PumpOutcome::UpstreamError | PumpOutcome::IdleTimeout => {
                tracing::warn!(
                    bytes = report.bytes,
                    outcome = ?report.outcome,
                    "Upstream stream ended early"
                )
            }
        }
    });

    Body::from_stream(receiver_stream(rx, guard))
}

fn receiver_stream(
    rx: mpsc::Receiver<Bytes>,
    guard: DropGuard,
) -> impl futures_util::Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let chunk = rx.recv().await?;
        Some((Ok(chunk), (rx, guard)))
    })
}

/// Copy data frames from `upstream` into `tx` until something stops it.
pub async fn pump<B>(
    mut upstream: B,
    tx: mpsc::Sender<Bytes>,
    idle: Duration,
    cancel: CancellationToken,
) -> PumpReport
where
    B: hyper::body::Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    let _active = ActiveStream::start();
    let mut bytes = 0u64;

    let outcome = loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break PumpOutcome::Cancelled,
            next = tokio::time::timeout(idle, upstream.frame()) => next,
        };

        let frame = match next {
            Err(_) => break PumpOutcome::IdleTimeout,
            Ok(None) => break PumpOutcome::Complete,
            Ok(Some(Err(e))) => {
                tracing::debug!(error = %e, "Upstream body error");
                break PumpOutcome::UpstreamError;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        // Trailers are not relayed.
        let Ok(data) = frame.into_data() else { continue };
        if data.is_empty() {
            continue;
        }
        let len = data.len() as u64;

        let sent = tokio::select! {
            _ = cancel.cancelled() => false,
            result = tx.send(data) => result.is_ok(),
        };
        if !sent {
            break PumpOutcome::Cancelled;
        }
        bytes += len;
    };

    PumpReport { outcome, bytes }
}
