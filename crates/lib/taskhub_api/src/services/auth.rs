//! Authentication flows — login/register/refresh/logout over
//! `taskhub_core::auth`.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use taskhub_core::auth::jwt::TokenKeys;
use taskhub_core::auth::{jwt, password, queries, session};
use taskhub_core::models::auth::{TokenPair, User};
use taskhub_core::workspaces;

use crate::error::{AppError, AppResult};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

/// Register a new account with its default workspace.
/// Returns (user id, workspace id).
pub async fn register(
    pool: &PgPool,
    email: &str,
    name: &str,
    plain_password: &str,
) -> AppResult<(Uuid, Uuid)> {
    if email.trim().is_empty() || name.trim().is_empty() || plain_password.is_empty() {
        return Err(AppError::Validation("All fields are required".into()));
    }
    if plain_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let (user_id, workspace_id) = workspaces::register(pool, email, name, plain_password).await?;
    info!(%user_id, %workspace_id, "registered new account");
    Ok((user_id, workspace_id))
}

/// Authenticate with email + password, issuing a fresh token pair.
///
/// The refresh half is persisted as the user's single live value
/// before the pair is released to the transport layer.
pub async fn login(
    pool: &PgPool,
    keys: &TokenKeys,
    email: &str,
    plain_password: &str,
) -> AppResult<(User, TokenPair)> {
    let Some(found) = queries::find_user_by_email(pool, email).await? else {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    };

    if !password::verify_password(plain_password, &found.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }
    if !found.user.is_active {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let pair = jwt::issue_token_pair(&found.user, keys)?;
    queries::persist_refresh_token(pool, found.user.id, &pair.refresh_token).await?;
    queries::touch_last_login(pool, found.user.id).await?;

    Ok((found.user, pair))
}

/// Exchange a refresh token for a rotated pair.
pub async fn refresh(pool: &PgPool, keys: &TokenKeys, token: &str) -> AppResult<TokenPair> {
    let renewed = session::renew(pool, keys, token).await?;
    renewed
        .renewed
        .ok_or_else(|| AppError::Internal("refresh succeeded without rotation".into()))
}

/// Clear the user's stored refresh value. Idempotent.
pub async fn logout(pool: &PgPool, user_id: Uuid) -> AppResult<()> {
    queries::clear_refresh_token(pool, user_id).await?;
    Ok(())
}
