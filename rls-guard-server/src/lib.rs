//! rls-guard-server - HTTP surface for rls-guard
//!
//! Exposes the reconciliation and inspection operations of
//! [`rls_guard_core::RlsGuardService`] as JSON endpoints:
//!
//! - `POST /api/security` applies the declared policies
//! - `GET /api/security` reports RLS status per target table
//! - `GET /api/security/policies` audits installed policies
//! - `GET /api/health` liveness

pub mod routes;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use log::info;
use tokio::net::TcpListener;

pub use routes::{create_router, AppState, HealthResponse, SecurityResponse};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Bind to the configured address and serve until Ctrl-C
pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    serve(listener, state).await
}

/// Serve on an already bound listener until Ctrl-C
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let local: SocketAddr = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("rls-guard server listening on {local}");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {e}");
        // Without a signal handler, run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
