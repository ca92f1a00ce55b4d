//! Authentication domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain user, as attached to authenticated requests.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub profile_picture: Option<String>,
    pub is_active: bool,
    pub current_workspace: Option<Uuid>,
    pub last_login: Option<DateTime<Utc>>,
}

/// User with password hash (for the login flow only).
#[derive(Debug, Clone)]
pub struct UserWithSecret {
    pub user: User,
    pub password_hash: String,
}

/// Claims embedded in short-lived access tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject — user ID (standard JWT `sub` claim).
    pub sub: Uuid,
    /// User email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// Claims embedded in long-lived refresh tokens.
///
/// Deliberately minimal: a refresh token must not leak email or display
/// name into a long-lived artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    /// Unique token id. Two tokens minted in the same second would
    /// otherwise be byte-identical, and rotation relies on the new
    /// stored value differing from the old one.
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
