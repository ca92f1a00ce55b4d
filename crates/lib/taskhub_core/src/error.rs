//! Domain errors shared by the workspace-scoped modules.

use thiserror::Error;

use crate::auth::AuthError;

/// Errors raised by membership, workspace, project and task operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for DomainError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::DbError(e) => DomainError::Db(e),
            other => DomainError::Internal(other.to_string()),
        }
    }
}
