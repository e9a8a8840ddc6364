//! Health Check API

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub uptime_ms: i64,
}

/// GET / 和 GET /api/health - 健康检查 (部署探针)
async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: "EcoMarket API",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        uptime_ms: state.uptime_ms(),
    })
}

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
}
