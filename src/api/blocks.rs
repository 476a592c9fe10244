//! Saved block endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::blocks::SavedBlock;
use crate::display::RenderedDisplay;
use crate::error::{AppError, Result};
use crate::server::{AppState, Operator};
use crate::variables::VariableContext;

#[derive(Debug, Serialize)]
pub struct BlockListResponse {
    pub blocks: Vec<SavedBlock>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenderSavedRequest {
    #[serde(default)]
    pub context: VariableContext,
}

fn block_not_found(guild_id: &str, name: &str) -> AppError {
    AppError::NotFound(format!("Block '{}' not found in guild {}", name, guild_id))
}

/// GET /api/v1/guilds/{guild_id}/blocks
#[tracing::instrument(name = "http.list_blocks", skip(state, operator))]
pub async fn list_blocks(
    State(state): State<AppState>,
    operator: Operator,
    Path(guild_id): Path<String>,
) -> Result<Json<BlockListResponse>> {
    operator.ensure_guild(&guild_id)?;

    let blocks = state.blocks.list(&guild_id).await?;
    let total = blocks.len();

    Ok(Json(BlockListResponse { blocks, total }))
}

/// GET /api/v1/guilds/{guild_id}/blocks/{name}
#[tracing::instrument(name = "http.get_block", skip(state, operator))]
pub async fn get_block(
    State(state): State<AppState>,
    operator: Operator,
    Path((guild_id, name)): Path<(String, String)>,
) -> Result<Json<SavedBlock>> {
    operator.ensure_guild(&guild_id)?;

    state
        .blocks
        .get(&guild_id, &name)
        .await?
        .map(Json)
        .ok_or_else(|| block_not_found(&guild_id, &name))
}

/// DELETE /api/v1/guilds/{guild_id}/blocks/{name}
#[tracing::instrument(name = "http.delete_block", skip(state, operator))]
pub async fn delete_block(
    State(state): State<AppState>,
    operator: Operator,
    Path((guild_id, name)): Path<(String, String)>,
) -> Result<StatusCode> {
    operator.ensure_guild(&guild_id)?;

    if state.blocks.delete(&guild_id, &name).await? {
        tracing::info!(operator_id = %operator.id(), "Block deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(block_not_found(&guild_id, &name))
    }
}

/// POST /api/v1/guilds/{guild_id}/blocks/{name}/render
///
/// Called by the bot when it sends a saved block; guarded by the API key only.
#[tracing::instrument(name = "http.render_block", skip(state, request))]
pub async fn render_block(
    State(state): State<AppState>,
    Path((guild_id, name)): Path<(String, String)>,
    request: Option<Json<RenderSavedRequest>>,
) -> Result<Json<RenderedDisplay>> {
    let saved = state
        .blocks
        .get(&guild_id, &name)
        .await?
        .ok_or_else(|| block_not_found(&guild_id, &name))?;

    let context = request.map(|Json(r)| r.context).unwrap_or_default();
    Ok(Json(state.renderer.render(&saved.block, &context).await))
}
