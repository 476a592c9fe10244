use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::blocks::{delete_block, get_block, list_blocks, render_block};
use super::display::render_display;
use super::editor::{apply_edit, cancel_session, get_session, open_session, save_session};
use super::health::health;
use super::metrics::prometheus_metrics;
use super::variables::{list_variables, replace_variables};

/// Unauthenticated operational endpoints
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
}

/// Endpoints mounted under `/api/v1`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Variables
        .route("/variables", get(list_variables))
        .route("/variables/replace", post(replace_variables))
        // Rendering
        .route("/display/render", post(render_display))
        // Saved blocks
        .route("/guilds/{guild_id}/blocks", get(list_blocks))
        .route(
            "/guilds/{guild_id}/blocks/{name}",
            get(get_block).delete(delete_block),
        )
        .route("/guilds/{guild_id}/blocks/{name}/render", post(render_block))
        // Editor sessions
        .route("/editor/sessions", post(open_session))
        .route("/editor/sessions/{id}", get(get_session))
        .route("/editor/sessions/{id}/edits", post(apply_edit))
        .route("/editor/sessions/{id}/save", post(save_session))
        .route("/editor/sessions/{id}/cancel", post(cancel_session))
}
