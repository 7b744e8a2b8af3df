//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::driver::{read_status, DriverStatus, SharedStatus};
use crate::shutdown::Shutdown;

#[derive(Clone)]
pub struct HealthState {
    pub driver: SharedStatus,
    /// Redacted configuration, fixed at start-up.
    pub config: Arc<serde_json::Value>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub driver: DriverStatus,
    pub config: serde_json::Value,
}

async fn index() -> &'static str {
    "orca-relay is running\n"
}

pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    let driver = read_status(&state.driver).clone();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        driver,
        config: state.config.as_ref().clone(),
    })
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve the liveness routes on `addr` until `shutdown` fires.
pub async fn serve(
    addr: &str,
    state: HealthState,
    shutdown: Arc<Shutdown>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Liveness endpoint listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
}
