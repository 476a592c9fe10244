use axum::{middleware, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::api::{api_routes, public_routes};

use super::middleware::{api_key_auth, track_http_metrics};
use super::AppState;

/// Upper bound for request bodies (block JSON plus context)
const MAX_BODY_BYTES: usize = 256 * 1024;

pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & metrics
        .merge(public_routes())
        // API routes, guarded by the API key when one is configured
        .nest(
            "/api/v1",
            api_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                api_key_auth,
            )),
        )
        // Add middleware
        .layer(middleware::from_fn(track_http_metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Add state
        .with_state(state)
}
