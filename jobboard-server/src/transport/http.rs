//! HTTP/JSON transport
//!
//! Serves the job-board API under `/api` plus two operational endpoints.
//!
//! # Operational endpoints
//!
//! ## GET /health
//!
//! Liveness probe. Returns "OK" with 200 status.
//!
//! ## GET /metrics
//!
//! Admission, cache and invalidation counters in Prometheus text format.
//!
//! Connections are served with their peer address attached, which the
//! admission layer falls back to when no forwarding header is present.

use super::Transport;
use crate::api;
use crate::state::SharedState;
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// HTTP transport implementation
pub struct HttpTransport {
    addr: SocketAddr,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid HTTP listen address {host}:{port}"))?;
        Ok(Self { addr })
    }
}

/// Complete application router with state applied
pub fn router(state: SharedState) -> Router {
    Router::new()
        .nest("/api", api::router(&state))
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(self, state: SharedState) -> Result<()> {
        let app = router(state);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!("HTTP server listening on {}", self.addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.export_prometheus(),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
