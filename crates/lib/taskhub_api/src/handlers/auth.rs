//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;

use crate::AppState;
use crate::error::{AppError, AppResult, GENERIC_UNAUTHORIZED};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    LoginRequest, LoginResponse, LogoutResponse, RefreshRequest, RefreshResponse,
    RegisterRequest, RegisterResponse,
};
use crate::services::{auth, cookies};

/// `POST /auth/register` — create an account with its default workspace.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let (user_id, workspace_id) =
        auth::register(&state.pool, &body.email, &body.name, &body.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            workspace_id,
        }),
    ))
}

/// `POST /auth/login` — authenticate with email + password.
///
/// Returns the access token in the body; the refresh token travels
/// only in the httpOnly cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let (user, pair) = auth::login(
        &state.pool,
        &state.config.token_keys,
        &body.email,
        &body.password,
    )
    .await?;

    let jar = jar.add(cookies::refresh_cookie(&pair.refresh_token));
    Ok((
        jar,
        Json(LoginResponse {
            user: user.into(),
            access_token: pair.access_token,
        }),
    ))
}

/// `POST /auth/refresh-token` — exchange the refresh token (cookie or
/// body) for a rotated pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<RefreshResponse>)> {
    let token = jar
        .get(cookies::REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.ok().and_then(|Json(b)| b.refresh_token));

    let Some(token) = token else {
        return Err(AppError::Unauthorized(GENERIC_UNAUTHORIZED.into()));
    };

    let pair = auth::refresh(&state.pool, &state.config.token_keys, &token).await?;

    let jar = jar.add(cookies::refresh_cookie(&pair.refresh_token));
    Ok((
        jar,
        Json(RefreshResponse {
            access_token: pair.access_token,
        }),
    ))
}

/// `POST /auth/logout` — clear the stored refresh value and the
/// cookie. Requires an authenticated session; idempotent.
pub async fn logout_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<LogoutResponse>)> {
    auth::logout(&state.pool, user.0.id).await?;
    let jar = jar.add(cookies::clear_refresh_cookie());
    Ok((jar, Json(LogoutResponse { success: true })))
}
