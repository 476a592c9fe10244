//! Rendering of ad-hoc blocks.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::display::{DisplayBlock, RenderedDisplay};
use crate::server::AppState;
use crate::variables::VariableContext;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub block: DisplayBlock,
    #[serde(default)]
    pub context: VariableContext,
}

/// POST /api/v1/display/render - Render a block against a context
#[tracing::instrument(
    name = "http.render_display",
    skip(state, request),
    fields(components = request.block.components.len())
)]
pub async fn render_display(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Json<RenderedDisplay> {
    Json(state.renderer.render(&request.block, &request.context).await)
}
