use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::blocks::BlockStoreError;
use crate::editor::{EditorError, ExpiryNotice};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Editor session expired")]
    Expired(Box<ExpiryNotice>),

    #[error("Storage error: {0}")]
    Storage(#[from] BlockStoreError),

    /// Storage failed during an editor save; the session is still open
    #[error("Save failed: {0}")]
    SaveFailed(BlockStoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EditorError> for AppError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::Validation(msg) => AppError::Validation(msg),
            EditorError::NotFound(_) | EditorError::BlockNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            EditorError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            EditorError::Expired(notice) => AppError::Expired(notice),
            EditorError::InvalidTransition { .. }
            | EditorError::Conflict(_)
            | EditorError::SaveInProgress(_) => {
                AppError::Conflict(err.to_string())
            }
            EditorError::Persistence(e) => AppError::SaveFailed(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<ExpiryNotice>,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

fn hidden(log_msg: &str, public: &str) -> String {
    if is_production() {
        public.to_string()
    } else {
        log_msg.to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut notice = None;

        let (status, code, client_message, log_message) = match self {
            AppError::Config(e) => {
                let log_msg = e.to_string();
                let client_msg = hidden(&log_msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", client_msg, log_msg)
            }
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), msg),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), msg),
            AppError::Expired(expiry) => {
                let msg = expiry.message.clone();
                notice = Some(*expiry);
                (StatusCode::GONE, "SESSION_EXPIRED", msg.clone(), msg)
            }
            AppError::Storage(e) => {
                let log_msg = e.to_string();
                let client_msg = hidden(&log_msg, "Storage temporarily unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_ERROR", client_msg, log_msg)
            }
            AppError::SaveFailed(e) => {
                let log_msg = e.to_string();
                let client_msg = hidden(
                    &format!("Save failed, the editor is still open: {}", log_msg),
                    "Save failed, the editor is still open. Please retry.",
                );
                (StatusCode::SERVICE_UNAVAILABLE, "SAVE_FAILED", client_msg, log_msg)
            }
            AppError::Internal(e) => {
                let client_msg = hidden(&e, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", client_msg, e)
            }
        };

        if status.is_server_error() {
            tracing::error!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API error"
            );
        } else {
            tracing::debug!(
                code = %code,
                status = %status.as_u16(),
                message = %log_message,
                "API request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
                notice,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
