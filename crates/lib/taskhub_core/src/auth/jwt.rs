//! JWT token generation and verification.
//!
//! Two independent HS256 secrets: one for short-lived access tokens
//! carrying identity claims, one for long-lived refresh tokens carrying
//! only the subject.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{AccessClaims, RefreshClaims, TokenPair, User};

/// Access token lifetime: 15 minutes.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 7 days. Matches the refresh cookie max-age.
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// The pair of signing secrets, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TokenKeys {
    pub access_secret: String,
    pub refresh_secret: String,
}

impl TokenKeys {
    /// Resolve both secrets: env var first, then a persisted file,
    /// generating and persisting a fresh secret otherwise.
    pub fn from_env() -> Self {
        Self {
            access_secret: resolve_token_secret("ACCESS_TOKEN_SECRET", "access-token-secret"),
            refresh_secret: resolve_token_secret("REFRESH_TOKEN_SECRET", "refresh-token-secret"),
        }
    }
}

/// Generate a signed access token (HS256, 15 min expiry) embedding
/// id, email and display name.
pub fn issue_access_token(user: &User, keys: &TokenKeys) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(keys.access_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Generate a signed refresh token (HS256, 7 day expiry) embedding the
/// user id only.
pub fn issue_refresh_token(user_id: Uuid, keys: &TokenKeys) -> Result<String, AuthError> {
    let now = Utc::now();
    let jti: String = rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    let claims = RefreshClaims {
        sub: user_id,
        jti,
        exp: (now + Duration::days(REFRESH_TOKEN_EXPIRY_DAYS)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(keys.refresh_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Issue an access/refresh pair for a user.
///
/// The refresh half is only valid once the caller persists it as the
/// user's stored value; a signed-but-unstored token is rejected at
/// validation time.
pub fn issue_token_pair(user: &User, keys: &TokenKeys) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access_token: issue_access_token(user, keys)?,
        refresh_token: issue_refresh_token(user.id, keys)?,
    })
}

/// Verify an access token, returning the claims on success.
pub fn verify_access_token(token: &str, keys: &TokenKeys) -> Option<AccessClaims> {
    let key = DecodingKey::from_secret(keys.access_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<AccessClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Verify a refresh token's signature and expiry, returning the claims
/// on success. Storage equality is checked separately by the caller.
pub fn verify_refresh_token(token: &str, keys: &TokenKeys) -> Option<RefreshClaims> {
    let key = DecodingKey::from_secret(keys.refresh_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<RefreshClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Resolve a signing secret: env var → persisted file → generate.
fn resolve_token_secret(env_var: &str, file_name: &str) -> String {
    if let Ok(secret) = std::env::var(env_var)
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = token_secret_path(file_name);
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new token secret");
    secret
}

/// Path to a persisted token secret file.
fn token_secret_path(file_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskhub")
        .join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuid::uuidv7;

    fn test_keys() -> TokenKeys {
        TokenKeys {
            access_secret: "access-test-secret".into(),
            refresh_secret: "refresh-test-secret".into(),
        }
    }

    fn test_user() -> User {
        User {
            id: uuidv7(),
            email: "alice@example.com".into(),
            name: "Alice".into(),
            profile_picture: None,
            is_active: true,
            current_workspace: None,
            last_login: None,
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let keys = test_keys();
        let user = test_user();
        let token = issue_access_token(&user, &keys).unwrap();
        let claims = verify_access_token(&token, &keys).expect("valid token");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.name, user.name);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let keys = test_keys();
        let user = test_user();
        let token = issue_refresh_token(user.id, &keys).unwrap();
        let claims = verify_refresh_token(&token, &keys).expect("valid token");
        assert_eq!(claims.sub, user.id);
    }

    #[test]
    fn every_issued_refresh_token_is_distinct() {
        let keys = test_keys();
        let user = test_user();
        // Same subject, same second — still two different tokens, or
        // rotation could replace a value with itself.
        let a = issue_refresh_token(user.id, &keys).unwrap();
        let b = issue_refresh_token(user.id, &keys).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tokens_do_not_verify_across_secrets() {
        let keys = test_keys();
        let user = test_user();
        // An access token must not validate as a refresh token and
        // vice versa; the secrets are independent.
        let access = issue_access_token(&user, &keys).unwrap();
        let refresh = issue_refresh_token(user.id, &keys).unwrap();
        assert!(verify_refresh_token(&access, &keys).is_none());
        assert!(verify_access_token(&refresh, &keys).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let keys = test_keys();
        let other = TokenKeys {
            access_secret: "different".into(),
            refresh_secret: "also-different".into(),
        };
        let token = issue_access_token(&test_user(), &keys).unwrap();
        assert!(verify_access_token(&token, &other).is_none());
    }
}
