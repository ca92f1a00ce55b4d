//! Authentication middleware — the session validator at the HTTP edge.
//!
//! Extracts the bearer access token and the refresh cookie, runs the
//! dual-token validation chain, and attaches the resolved identity to
//! the request. When the session was renewed through the refresh
//! fallback, the new access token is surfaced in the `X-Access-Token`
//! response header and the rotated refresh token in the cookie, so
//! callers update their credentials without an extra round trip.

use axum::http::HeaderValue;
use axum::http::header::{AUTHORIZATION, SET_COOKIE};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use taskhub_core::auth::session;
use taskhub_core::models::auth::User;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies;

/// Response header carrying a silently renewed access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// The resolved identity, stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Axum middleware guarding every protected route.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let access_token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    let jar = CookieJar::from_headers(request.headers());
    let refresh_token = jar
        .get(cookies::REFRESH_COOKIE)
        .map(|c| c.value().to_string());

    let session = session::authenticate(
        &state.pool,
        &state.config.token_keys,
        access_token.as_deref(),
        refresh_token.as_deref(),
    )
    .await
    .map_err(AppError::from)?;

    request.extensions_mut().insert(CurrentUser(session.user));

    let renewed = session.renewed;
    let mut response = next.run(request).await;

    if let Some(pair) = renewed {
        let access = HeaderValue::from_str(&pair.access_token)
            .map_err(|e| AppError::Internal(format!("access token header: {e}")))?;
        response.headers_mut().insert(ACCESS_TOKEN_HEADER, access);

        let cookie = cookies::refresh_cookie(&pair.refresh_token);
        let cookie = HeaderValue::from_str(&cookie.to_string())
            .map_err(|e| AppError::Internal(format!("refresh cookie header: {e}")))?;
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    Ok(response)
}
