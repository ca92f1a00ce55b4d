//! Credential-store queries.
//!
//! The `users.refresh_token` column holds at most one live value per
//! user; persisting a new value implicitly invalidates the old one.
//! Queries take `impl PgExecutor` so the transactional flows in
//! [`crate::workspaces`] can run them inside a transaction.

use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{User, UserWithSecret};

const USER_COLUMNS: &str =
    "id, email, name, profile_picture, is_active, current_workspace, last_login";

/// Normalize an email for storage and lookup: trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fetch a user by id.
pub async fn find_user_by_id(
    ex: impl PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(ex)
    .await?;
    Ok(row)
}

/// Fetch a user by email (case-insensitive), with the password hash
/// for the login flow.
pub async fn find_user_by_email(
    ex: impl PgExecutor<'_>,
    email: &str,
) -> Result<Option<UserWithSecret>, AuthError> {
    type Row = (
        Uuid,
        String,
        String,
        Option<String>,
        bool,
        Option<Uuid>,
        Option<DateTime<Utc>>,
        String,
    );
    let row = sqlx::query_as::<_, Row>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
    ))
    .bind(normalize_email(email))
    .fetch_optional(ex)
    .await?;
    Ok(row.map(
        |(id, email, name, profile_picture, is_active, current_workspace, last_login, hash)| {
            UserWithSecret {
                user: User {
                    id,
                    email,
                    name,
                    profile_picture,
                    is_active,
                    current_workspace,
                    last_login,
                },
                password_hash: hash,
            }
        },
    ))
}

/// Check whether an email is already registered.
pub async fn email_exists(ex: impl PgExecutor<'_>, email: &str) -> Result<bool, AuthError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(normalize_email(email))
            .fetch_one(ex)
            .await?;
    Ok(exists)
}

/// Create a new user, returning the user ID.
pub async fn create_user(
    ex: impl PgExecutor<'_>,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<Uuid, AuthError> {
    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(normalize_email(email))
    .bind(name)
    .bind(password_hash)
    .fetch_one(ex)
    .await?;
    Ok(user_id)
}

/// Store a refresh token as the user's single live value.
pub async fn persist_refresh_token(
    ex: impl PgExecutor<'_>,
    user_id: Uuid,
    token: &str,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET refresh_token = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(token)
        .execute(ex)
        .await?;
    Ok(())
}

/// Replace the stored refresh token, conditional on the presented old
/// value still being current.
///
/// The conditional update is both the byte-equality check and the
/// rotation: of two concurrent refreshes presenting the same old
/// token, exactly one matches the row and wins. Returns whether this
/// caller won.
pub async fn rotate_refresh_token(
    ex: impl PgExecutor<'_>,
    user_id: Uuid,
    presented: &str,
    replacement: &str,
) -> Result<bool, AuthError> {
    let result = sqlx::query(
        "UPDATE users SET refresh_token = $3, updated_at = now() \
         WHERE id = $1 AND refresh_token = $2",
    )
    .bind(user_id)
    .bind(presented)
    .bind(replacement)
    .execute(ex)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Clear the stored refresh token. Idempotent; the sole logout
/// primitive — afterwards every previously issued refresh token for
/// the user is unusable.
pub async fn clear_refresh_token(ex: impl PgExecutor<'_>, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(ex)
        .await?;
    Ok(())
}

/// Record a successful login.
pub async fn touch_last_login(ex: impl PgExecutor<'_>, user_id: Uuid) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
        .bind(user_id)
        .execute(ex)
        .await?;
    Ok(())
}

/// Point the user at a (possibly absent) current workspace.
pub async fn set_current_workspace(
    ex: impl PgExecutor<'_>,
    user_id: Uuid,
    workspace_id: Option<Uuid>,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET current_workspace = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(workspace_id)
        .execute(ex)
        .await?;
    Ok(())
}
