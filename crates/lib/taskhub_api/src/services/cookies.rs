//! Cookie service — the out-of-band channel for refresh tokens.
//!
//! HttpOnly + Secure + SameSite=None so browser clients on another
//! origin can hold the renewal credential without script access.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Refresh cookie lifetime: 7 days, matching the token expiry.
const REFRESH_COOKIE_MAX_AGE_DAYS: i64 = 7;

/// Build the httpOnly cookie carrying a refresh token.
pub fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/".to_string())
        .max_age(Duration::days(REFRESH_COOKIE_MAX_AGE_DAYS))
        .build()
}

/// Build an expired cookie to clear the refresh token.
pub fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}
