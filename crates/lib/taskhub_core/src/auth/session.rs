//! Session validation: the dual-token fallback chain.
//!
//! Every protected request passes through [`authenticate`]. The chain
//! tries the access token first; when that is absent, expired or names
//! a missing identity it falls back to the refresh token, rotating it
//! on success so the previous value is permanently unusable.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{AuthError, jwt, queries};
use crate::models::auth::{AccessClaims, TokenPair, User};

/// Why a session was rejected. Mapped to one generic 401 by the HTTP
/// layer; the distinction is for server-side tracing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Neither credential was presented.
    MissingCredentials,
    /// The access token is unusable and no refresh token exists to
    /// renew the session.
    SessionExpired,
    /// The refresh token failed signature/expiry checks, names an
    /// unknown identity, or no longer matches the stored value.
    RefreshRejected,
}

impl From<RejectReason> for AuthError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::MissingCredentials => AuthError::MissingCredentials,
            RejectReason::SessionExpired => AuthError::SessionExpired,
            RejectReason::RefreshRejected => AuthError::RefreshRejected,
        }
    }
}

/// First step of the chain, decided without touching storage.
///
/// `access` is `None` when no access token was presented, `Some(None)`
/// when one was presented but failed signature/expiry verification.
#[derive(Debug, PartialEq)]
pub enum Triage {
    /// Access token verified; resolve the identity it names.
    UseAccess(AccessClaims),
    /// Fall back to the refresh token.
    UseRefresh,
    Reject(RejectReason),
}

/// Pure transition function for the credential triage.
pub fn triage(access: Option<Option<AccessClaims>>, has_refresh: bool) -> Triage {
    match (access, has_refresh) {
        (None, false) => Triage::Reject(RejectReason::MissingCredentials),
        (Some(Some(claims)), _) => Triage::UseAccess(claims),
        (Some(None), false) => Triage::Reject(RejectReason::SessionExpired),
        (Some(None), true) | (None, true) => Triage::UseRefresh,
    }
}

/// A validated session: the resolved identity, plus a fresh token pair
/// when the session was renewed via the refresh fallback.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub renewed: Option<TokenPair>,
}

/// Validate the presented credentials, renewing the session through
/// the refresh token when necessary.
pub async fn authenticate(
    pool: &PgPool,
    keys: &jwt::TokenKeys,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
) -> Result<Session, AuthError> {
    let verified = access_token.map(|t| jwt::verify_access_token(t, keys));

    match triage(verified, refresh_token.is_some()) {
        Triage::Reject(reason) => {
            debug!(?reason, "session rejected");
            Err(reason.into())
        }
        Triage::UseAccess(claims) => {
            if let Some(user) = resolve_active_user(pool, claims.sub).await? {
                return Ok(Session {
                    user,
                    renewed: None,
                });
            }
            // The token names an identity that no longer resolves;
            // same fallback as an expired token.
            match refresh_token {
                Some(token) => renew(pool, keys, token).await,
                None => {
                    debug!(user_id = %claims.sub, "access token names unknown identity");
                    Err(RejectReason::SessionExpired.into())
                }
            }
        }
        Triage::UseRefresh => {
            let token = refresh_token.ok_or(AuthError::MissingCredentials)?;
            renew(pool, keys, token).await
        }
    }
}

/// The refresh half of the chain: verify, resolve, rotate.
///
/// Also the whole of the explicit `/auth/refresh-token` operation.
pub async fn renew(pool: &PgPool, keys: &jwt::TokenKeys, token: &str) -> Result<Session, AuthError> {
    let Some(claims) = jwt::verify_refresh_token(token, keys) else {
        debug!("refresh token failed signature/expiry verification");
        return Err(RejectReason::RefreshRejected.into());
    };

    let Some(user) = resolve_active_user(pool, claims.sub).await? else {
        debug!(user_id = %claims.sub, "refresh token names unknown identity");
        return Err(RejectReason::RefreshRejected.into());
    };

    let pair = jwt::issue_token_pair(&user, keys)?;

    // Conditional update: byte-equality against the stored value and
    // rotation in one statement. Losing the race means the token was
    // already spent.
    let won = queries::rotate_refresh_token(pool, user.id, token, &pair.refresh_token).await?;
    if !won {
        debug!(user_id = %user.id, "refresh token stale or already used");
        return Err(RejectReason::RefreshRejected.into());
    }

    debug!(user_id = %user.id, "session renewed via refresh token");
    Ok(Session {
        user,
        renewed: Some(pair),
    })
}

/// Resolve an identity, treating deactivated accounts as absent.
async fn resolve_active_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, AuthError> {
    Ok(queries::find_user_by_id(pool, user_id)
        .await?
        .filter(|u| u.is_active))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuid::uuidv7;

    fn claims() -> AccessClaims {
        AccessClaims {
            sub: uuidv7(),
            email: "alice@example.com".into(),
            name: "Alice".into(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn no_credentials_rejects() {
        assert_eq!(
            triage(None, false),
            Triage::Reject(RejectReason::MissingCredentials)
        );
    }

    #[test]
    fn valid_access_wins_regardless_of_refresh() {
        let c = claims();
        let sub = c.sub;
        match triage(Some(Some(c)), true) {
            Triage::UseAccess(got) => assert_eq!(got.sub, sub),
            other => panic!("expected UseAccess, got {other:?}"),
        }
        match triage(Some(Some(claims())), false) {
            Triage::UseAccess(_) => {}
            other => panic!("expected UseAccess, got {other:?}"),
        }
    }

    #[test]
    fn bad_access_without_refresh_is_terminal() {
        assert_eq!(
            triage(Some(None), false),
            Triage::Reject(RejectReason::SessionExpired)
        );
    }

    #[test]
    fn bad_or_missing_access_with_refresh_falls_back() {
        assert_eq!(triage(Some(None), true), Triage::UseRefresh);
        assert_eq!(triage(None, true), Triage::UseRefresh);
    }

    mod db {
        use super::super::*;
        use crate::workspaces;
        use sqlx::PgPool;

        fn keys() -> jwt::TokenKeys {
            jwt::TokenKeys {
                access_secret: "access-test-secret".into(),
                refresh_secret: "refresh-test-secret".into(),
            }
        }

        async fn logged_in_user(pool: &PgPool, keys: &jwt::TokenKeys) -> (User, TokenPair) {
            let (user_id, _) = workspaces::register(pool, "alice@example.com", "Alice", "s3cretpw")
                .await
                .unwrap();
            let user = queries::find_user_by_id(pool, user_id).await.unwrap().unwrap();
            let pair = jwt::issue_token_pair(&user, keys).unwrap();
            queries::persist_refresh_token(pool, user.id, &pair.refresh_token)
                .await
                .unwrap();
            (user, pair)
        }

        #[sqlx::test]
        async fn valid_access_token_authenticates_without_rotation(pool: PgPool) {
            let keys = keys();
            let (user, pair) = logged_in_user(&pool, &keys).await;

            let session = authenticate(&pool, &keys, Some(&pair.access_token), None)
                .await
                .unwrap();
            assert_eq!(session.user.id, user.id);
            assert!(session.renewed.is_none());
        }

        #[sqlx::test]
        async fn refresh_fallback_rotates_and_old_token_dies(pool: PgPool) {
            let keys = keys();
            let (user, pair) = logged_in_user(&pool, &keys).await;

            let session = authenticate(&pool, &keys, None, Some(&pair.refresh_token))
                .await
                .unwrap();
            assert_eq!(session.user.id, user.id);
            let renewed = session.renewed.expect("refresh path must rotate");
            assert_ne!(renewed.refresh_token, pair.refresh_token);

            // The spent token is permanently unusable, whatever happens
            // to its successor.
            let err = authenticate(&pool, &keys, None, Some(&pair.refresh_token))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::RefreshRejected));

            // The successor still works.
            authenticate(&pool, &keys, None, Some(&renewed.refresh_token))
                .await
                .unwrap();
        }

        #[sqlx::test]
        async fn signed_but_unstored_refresh_token_is_rejected(pool: PgPool) {
            let keys = keys();
            let (user, _) = logged_in_user(&pool, &keys).await;

            // Correctly signed, but never persisted as the stored value.
            let stray = jwt::issue_refresh_token(user.id, &keys).unwrap();
            let err = authenticate(&pool, &keys, None, Some(&stray)).await.unwrap_err();
            assert!(matches!(err, AuthError::RefreshRejected));
        }

        #[sqlx::test]
        async fn logout_then_refresh_is_rejected(pool: PgPool) {
            let keys = keys();
            let (user, pair) = logged_in_user(&pool, &keys).await;

            queries::clear_refresh_token(&pool, user.id).await.unwrap();
            let err = authenticate(&pool, &keys, None, Some(&pair.refresh_token))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::RefreshRejected));
        }
    }
}
