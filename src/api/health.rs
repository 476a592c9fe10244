//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub variables: usize,
    pub editor: EditorHealthResponse,
    pub backends: BackendHealthResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
}

#[derive(Debug, Serialize)]
pub struct EditorHealthResponse {
    pub active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct BackendHealthResponse {
    pub points: String,
    pub blocks: String,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let postgres = match &state.postgres_pool {
        Some(pool) => Some(PostgresHealthResponse {
            connected: pool.ping().await,
            pool_size: pool.size(),
            idle_connections: pool.idle_connections(),
        }),
        None => None,
    };

    let healthy = postgres.as_ref().map(|p| p.connected).unwrap_or(true);
    let status = if healthy { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        variables: state.registry.len(),
        editor: EditorHealthResponse {
            active_sessions: state.editor.active_sessions(),
        },
        backends: BackendHealthResponse {
            points: state.points.backend_name().to_string(),
            blocks: state.blocks.backend_name().to_string(),
        },
        postgres,
    })
}
