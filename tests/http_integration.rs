//! Router-level tests with in-memory stores.

use std::sync::Arc;

use amayo_display_service::auth::OperatorClaims;
use amayo_display_service::blocks::MemoryBlockRepository;
use amayo_display_service::config::Settings;
use amayo_display_service::points::MemoryPointsStore;
use amayo_display_service::server::{create_app, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";
const API_KEY: &str = "integration-api-key";

fn settings() -> Settings {
    config::Config::builder()
        .set_override("jwt.secret", SECRET)
        .unwrap()
        .set_override("api.key", API_KEY)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

fn app() -> Router {
    let state = AppState::new(
        settings(),
        Arc::new(MemoryPointsStore::new()),
        Arc::new(MemoryBlockRepository::new()),
        None,
    );
    create_app(state)
}

fn token(operator: &str, guilds: &[&str]) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = OperatorClaims {
        sub: operator.to_string(),
        exp: now + 3600,
        iat: now,
        guild_ids: guilds.iter().map(|g| g.to_string()).collect(),
        roles: vec![],
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", API_KEY);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backends"]["blocks"], "memory");
    assert!(body["variables"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_api_key_required() {
    let app = app();
    let req = Request::builder()
        .uri("/api/v1/variables")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/v1/variables")
        .header("X-API-Key", "integration-api-kez")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_replace_variables() {
    let app = app();
    let body = json!({
        "text": "Hello user.name from guild.name!",
        "context": {
            "user": {"id": "1", "username": "Ada"},
            "guild": {"id": "9", "name": "TestGuild"}
        }
    });

    let (status, body) = send(
        &app,
        request("POST", "/api/v1/variables/replace", None, Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Hello Ada from TestGuild!");
}

#[tokio::test]
async fn test_render_display_reports_omissions() {
    let app = app();
    let body = json!({
        "block": {
            "title": "Welcome",
            "color": 16711680,
            "components": [
                {"type": "image", "url": "user.avatar"},
                {"type": "text", "content": "Hi user.name"}
            ]
        },
        "context": {"user": {"id": "1", "username": "Ada"}}
    });

    let (status, body) = send(&app, request("POST", "/api/v1/display/render", None, Some(body))).await;

    assert_eq!(status, StatusCode::OK);
    let container = &body["payload"]["components"][0];
    assert_eq!(container["type"], 17);
    assert_eq!(container["accent_color"], 16711680);
    assert_eq!(container["components"][1]["content"], "Hi Ada");
    assert_eq!(body["omitted"][0]["path"], "components[0]");
    assert_eq!(body["omitted"][0]["reason"], "unresolved_url");
}

#[tokio::test]
async fn test_editor_requires_operator_token() {
    let app = app();
    let body = json!({"guild_id": "9"});

    let (status, body) = send(&app, request("POST", "/api/v1/editor/sessions", None, Some(body))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_editor_rejects_foreign_guild() {
    let app = app();
    let bearer = token("op-1", &["9"]);
    let body = json!({"guild_id": "10"});

    let (status, body) = send(
        &app,
        request("POST", "/api/v1/editor/sessions", Some(&bearer), Some(body)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_editor_flow_over_http() {
    let app = app();
    let bearer = token("op-1", &["9"]);

    let (status, session) = send(
        &app,
        request(
            "POST",
            "/api/v1/editor/sessions",
            Some(&bearer),
            Some(json!({"guild_id": "9", "name": "welcome"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["state"], "draft");
    let id = session["id"].as_str().unwrap().to_string();

    // Saving a draft is not allowed
    let (status, body) = send(
        &app,
        request("POST", &format!("/api/v1/editor/sessions/{}/save", id), Some(&bearer), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let edit = json!({
        "operation": {
            "op": "add_component",
            "component": {"type": "text", "content": "Welcome user.mention"}
        },
        "context": {"user": {"id": "42", "username": "Ada"}}
    });
    let (status, session) = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/editor/sessions/{}/edits", id),
            Some(&bearer),
            Some(edit),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["state"], "previewed");
    assert_eq!(
        session["preview"]["payload"]["components"][0]["components"][0]["content"],
        "Welcome <@42>"
    );

    // Another operator cannot touch the session
    let other = token("op-2", &["9"]);
    let (status, _) = send(
        &app,
        request("GET", &format!("/api/v1/editor/sessions/{}", id), Some(&other), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, saved) = send(
        &app,
        request("POST", &format!("/api/v1/editor/sessions/{}/save", id), Some(&bearer), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["name"], "welcome");

    let (status, list) = send(
        &app,
        request("GET", "/api/v1/guilds/9/blocks", Some(&bearer), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    let (status, rendered) = send(
        &app,
        request(
            "POST",
            "/api/v1/guilds/9/blocks/welcome/render",
            None,
            Some(json!({"context": {"user": {"id": "7", "username": "Bo"}}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        rendered["payload"]["components"][0]["components"][0]["content"],
        "Welcome <@7>"
    );

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/v1/editor/sessions/{}", id), Some(&bearer), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
