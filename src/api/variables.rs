//! Variable listing and ad-hoc substitution.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::server::AppState;
use crate::variables::VariableContext;

#[derive(Debug, Serialize)]
pub struct VariableListResponse {
    pub variables: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceRequest {
    pub text: String,
    #[serde(default)]
    pub context: VariableContext,
}

#[derive(Debug, Serialize)]
pub struct ReplaceResponse {
    pub text: String,
}

/// GET /api/v1/variables - Registered tokens in registration order
#[tracing::instrument(name = "http.list_variables", skip(state))]
pub async fn list_variables(State(state): State<AppState>) -> Json<VariableListResponse> {
    let variables = state.registry.list();
    let total = variables.len();

    Json(VariableListResponse { variables, total })
}

/// POST /api/v1/variables/replace - Substitute tokens in a piece of text
#[tracing::instrument(
    name = "http.replace_variables",
    skip(state, request),
    fields(text_len = request.text.len())
)]
pub async fn replace_variables(
    State(state): State<AppState>,
    Json(request): Json<ReplaceRequest>,
) -> Json<ReplaceResponse> {
    let text = state.registry.replace(&request.text, &request.context).await;

    Json(ReplaceResponse { text })
}
