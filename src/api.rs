use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::store::HealthStore;
use crate::utils;

#[derive(Clone)]
pub struct AppState {
    pub store: HealthStore,
    pub started_at: Instant,
}

pub async fn get_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "active",
        "message": "Keep-alive monitor is running",
        "lastPing": Utc::now().to_rfc3339(),
        "pingResults": state.store.snapshot_map().await,
    }))
}

pub async fn get_ping(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Monitor is alive",
        "data": {
            "serverTime": Utc::now().to_rfc3339(),
            "uptime": utils::format_uptime(state.started_at.elapsed()),
            "memoryUsage": utils::memory_usage(),
            "pingResults": state.store.snapshot_map().await,
        }
    }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_status))
        .route("/ping", get(get_ping))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> Result<()> {
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API port {}", port))?;
    info!("Status endpoint: http://localhost:{}", addr.port());
    axum::serve(listener, app).await.context("API server failed")
}
