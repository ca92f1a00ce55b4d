//! Authentication and session logic.
//!
//! Provides password hashing, dual-token (access/refresh) JWT
//! management, credential-store queries, and the session validator
//! shared across the API layer.

pub mod jwt;
pub mod password;
pub mod queries;
pub mod session;

use thiserror::Error;

/// Authentication errors.
///
/// The HTTP layer maps every credential-shaped variant to a generic
/// 401; the distinctions exist for server-side tracing only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No credentials provided")]
    MissingCredentials,

    #[error("Session expired")]
    SessionExpired,

    #[error("Refresh token is expired or has been used")]
    RefreshRejected,

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
