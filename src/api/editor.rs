//! Editor session endpoints.
//!
//! Sessions belong to the operator that opened them; every call is made with
//! that operator's bearer token.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blocks::SavedBlock;
use crate::display::DisplayBlock;
use crate::editor::{EditOperation, EditorSession, SessionState};
use crate::error::Result;
use crate::server::{AppState, Operator};
use crate::variables::VariableContext;

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub guild_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub block: Option<DisplayBlock>,
    /// Name of a saved block to start from; takes precedence over `block`
    #[serde(default)]
    pub from_saved: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub operation: EditOperation,
    /// Context used to render the preview
    #[serde(default)]
    pub context: VariableContext,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub id: Uuid,
    pub state: SessionState,
}

/// POST /api/v1/editor/sessions
#[tracing::instrument(
    name = "http.open_session",
    skip(state, operator, request),
    fields(guild_id = %request.guild_id)
)]
pub async fn open_session(
    State(state): State<AppState>,
    operator: Operator,
    Json(request): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<EditorSession>)> {
    operator.ensure_guild(&request.guild_id)?;

    let session = match request.from_saved {
        Some(saved) => {
            state
                .editor
                .open_saved(operator.id(), &request.guild_id, &saved)
                .await?
        }
        None => state.editor.open(
            operator.id(),
            &request.guild_id,
            request.name.as_deref(),
            request.block,
        )?,
    };

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/editor/sessions/{id}
#[tracing::instrument(name = "http.get_session", skip(state, operator))]
pub async fn get_session(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<Json<EditorSession>> {
    Ok(Json(state.editor.get(id, operator.id())?))
}

/// POST /api/v1/editor/sessions/{id}/edits
#[tracing::instrument(
    name = "http.apply_edit",
    skip(state, operator, request),
    fields(op = request.operation.name())
)]
pub async fn apply_edit(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
    Json(request): Json<EditRequest>,
) -> Result<Json<EditorSession>> {
    let session = state
        .editor
        .apply_edit(id, operator.id(), request.operation, &request.context)
        .await?;

    Ok(Json(session))
}

/// POST /api/v1/editor/sessions/{id}/save
#[tracing::instrument(name = "http.save_session", skip(state, operator))]
pub async fn save_session(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<Json<SavedBlock>> {
    Ok(Json(state.editor.save(id, operator.id()).await?))
}

/// POST /api/v1/editor/sessions/{id}/cancel
#[tracing::instrument(name = "http.cancel_session", skip(state, operator))]
pub async fn cancel_session(
    State(state): State<AppState>,
    operator: Operator,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>> {
    let state = state.editor.cancel(id, operator.id())?;

    Ok(Json(CancelResponse { id, state }))
}
