use std::time::Instant;

use axum::{
    body::Body,
    extract::{FromRequestParts, MatchedPath, State},
    http::{header, request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use super::AppState;
use crate::auth::OperatorClaims;
use crate::error::AppError;
use crate::metrics::HttpMetrics;

/// API Key authentication middleware
/// Validates X-API-Key header against configured api.key
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // If no API key is configured, allow all requests (development mode)
    let Some(expected_key) = &state.settings.api.key else {
        return Ok(next.run(req).await);
    };

    let api_key = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match api_key {
        Some(key) if api_key_matches(key, expected_key) => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing API key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Constant-time comparison; only the length can leak.
fn api_key_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Record request count and latency per matched route
pub async fn track_http_metrics(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Route template, not the raw path, to keep label cardinality bounded
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    HttpMetrics::record_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Authenticated dashboard operator, taken from the bearer JWT.
#[derive(Debug, Clone)]
pub struct Operator(pub OperatorClaims);

impl Operator {
    pub fn id(&self) -> &str {
        self.0.operator_id()
    }

    /// Fail with 403 unless the operator may manage `guild_id`.
    pub fn ensure_guild(&self, guild_id: &str) -> Result<(), AppError> {
        if self.0.can_manage(guild_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Operator may not manage guild {}",
                guild_id
            )))
        }
    }
}

impl FromRequestParts<AppState> for Operator {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Auth("Missing bearer token".to_string()))?;

        let claims = state.jwt_validator.validate(token)?;
        Ok(Operator(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_api_key_matches() {
        assert!(api_key_matches("bot-key", "bot-key"));
        assert!(!api_key_matches("bot-kez", "bot-key"));
        assert!(!api_key_matches("bot-ke", "bot-key"));
        assert!(!api_key_matches("", "bot-key"));
    }
}
