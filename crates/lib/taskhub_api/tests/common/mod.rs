//! Shared helpers for driving the router in integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use taskhub_api::config::ApiConfig;
use taskhub_api::{AppState, router};
use taskhub_core::auth::jwt::TokenKeys;
use taskhub_core::authz::PermissionMatrix;

/// Build an app against the test pool with fixed signing secrets.
pub fn test_app(pool: PgPool) -> Router {
    router(AppState {
        pool,
        config: ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: String::new(),
            token_keys: TokenKeys {
                access_secret: "access-test-secret".into(),
                refresh_secret: "refresh-test-secret".into(),
            },
        },
        permissions: Arc::new(PermissionMatrix::builtin()),
    })
}

/// Credentials threaded through a request.
#[derive(Default, Clone, Copy)]
pub struct Creds<'a> {
    pub bearer: Option<&'a str>,
    pub refresh_cookie: Option<&'a str>,
}

/// Fire one request at the router; returns (status, headers, json body).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    creds: Creds<'_>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = creds.bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(token) = creds.refresh_cookie {
        builder = builder.header(COOKIE, format!("refreshToken={token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON body")
    };
    (status, headers, json)
}

/// Pull the refresh-token value out of a response's Set-Cookie headers.
pub fn refresh_cookie_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| {
            cookie
                .strip_prefix("refreshToken=")
                .map(|rest| rest.split(';').next().unwrap_or(rest).to_string())
        })
}

/// Register an account and log in; returns (access token, refresh
/// cookie value, user id, workspace id).
pub async fn register_and_login(
    app: &Router,
    email: &str,
    name: &str,
) -> (String, String, String, String) {
    let (status, _, body) = send(
        app,
        "POST",
        "/auth/register",
        Some(serde_json::json!({
            "email": email,
            "name": name,
            "password": "s3cretpw!",
        })),
        Creds::default(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let user_id = body["userId"].as_str().unwrap().to_string();
    let workspace_id = body["workspaceId"].as_str().unwrap().to_string();

    let (status, headers, body) = send(
        app,
        "POST",
        "/auth/login",
        Some(serde_json::json!({ "email": email, "password": "s3cretpw!" })),
        Creds::default(),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let access = body["accessToken"].as_str().unwrap().to_string();
    let refresh = refresh_cookie_value(&headers).expect("login sets the refresh cookie");

    (access, refresh, user_id, workspace_id)
}
