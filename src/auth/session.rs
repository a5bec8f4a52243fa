use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use serde::Serialize;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::store::{Session, Store, StoreError, User};

pub const SESSION_TTL: Duration = Duration::days(7);

// 43 alphanumeric chars carry ~256 bits of entropy, matching a
// url-safe encoding of 32 random bytes.
const TOKEN_LEN: usize = 43;

/// The authenticated identity resolved from a valid session.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub notifications_enabled: bool,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            notifications_enabled: user.notifications_enabled,
        }
    }
}

/// Why a token was rejected. Distinguished internally for logs and
/// tests; the boundary collapses every variant except `Store` into
/// `Unauthenticated`.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("missing or unknown token")]
    MissingToken,
    #[error("session expired")]
    Expired,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn new_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Issues a fresh opaque session for the user, expiring 7 days from
/// `now`. Every call produces a new token; existing sessions are left
/// alone.
pub async fn issue(
    store: &dyn Store,
    user_id: Uuid,
    now: OffsetDateTime,
) -> Result<Session, StoreError> {
    let token = new_token();
    let session = store
        .create_session(user_id, &token, now, now + SESSION_TTL)
        .await?;
    debug!(%user_id, "session issued");
    Ok(session)
}

/// Resolves a bearer token to its principal. A session past its expiry
/// is deleted on this read (lazy eviction, no background sweep) and
/// rejected.
pub async fn validate(
    store: &dyn Store,
    token: &str,
    now: OffsetDateTime,
) -> Result<Principal, ValidateError> {
    let session = store
        .session_by_token(token)
        .await?
        .ok_or(ValidateError::MissingToken)?;

    if now >= session.expires_at {
        store.delete_session(&session.token).await?;
        return Err(ValidateError::Expired);
    }

    let user = store
        .user_by_id(session.user_id)
        .await?
        .ok_or(ValidateError::UserNotFound)?;

    Ok(Principal::from(user))
}

/// Deletes the session if present. Revoking an unknown token is a
/// no-op, not an error.
pub async fn revoke(store: &dyn Store, token: &str) -> Result<(), StoreError> {
    store.delete_session(token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    async fn store_with_user() -> (MemStore, Uuid) {
        let store = MemStore::new();
        let user = store.create_user("Alice", "a@x.com", "digest").await.unwrap();
        (store, user.id)
    }

    #[tokio::test]
    async fn issue_sets_seven_day_expiry() {
        let (store, user_id) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        let session = issue(&store, user_id, now).await.unwrap();
        assert_eq!(session.expires_at, now + Duration::days(7));
        assert_eq!(session.created_at, now);
        assert_eq!(session.token.len(), 43);
    }

    #[tokio::test]
    async fn tokens_are_unique_per_issue() {
        let (store, user_id) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        let a = issue(&store, user_id, now).await.unwrap();
        let b = issue(&store, user_id, now).await.unwrap();
        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn validate_resolves_the_principal() {
        let (store, user_id) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        let session = issue(&store, user_id, now).await.unwrap();
        let principal = validate(&store, &session.token, now).await.unwrap();
        assert_eq!(principal.id, user_id);
        assert_eq!(principal.email, "a@x.com");
        assert!(principal.notifications_enabled);
    }

    #[tokio::test]
    async fn validate_rejects_unknown_token() {
        let (store, _) = store_with_user().await;
        let err = validate(&store, "nope", OffsetDateTime::now_utc())
            .await
            .unwrap_err();
        assert!(matches!(err, ValidateError::MissingToken));
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_evicted() {
        let (store, user_id) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        let session = issue(&store, user_id, now - Duration::days(8)).await.unwrap();

        let err = validate(&store, &session.token, now).await.unwrap_err();
        assert!(matches!(err, ValidateError::Expired));

        // evicted on that read; a second attempt sees no session at all
        let err = validate(&store, &session.token, now).await.unwrap_err();
        assert!(matches!(err, ValidateError::MissingToken));
    }

    #[tokio::test]
    async fn expiry_boundary_is_exclusive() {
        let (store, user_id) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        let session = issue(&store, user_id, now - SESSION_TTL).await.unwrap();
        // now == expires_at is already invalid
        let err = validate(&store, &session.token, now).await.unwrap_err();
        assert!(matches!(err, ValidateError::Expired));
    }

    #[tokio::test]
    async fn validate_rejects_session_for_missing_user() {
        let store = MemStore::new();
        let now = OffsetDateTime::now_utc();
        let session = issue(&store, Uuid::new_v4(), now).await.unwrap();
        let err = validate(&store, &session.token, now).await.unwrap_err();
        assert!(matches!(err, ValidateError::UserNotFound));
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let (store, user_id) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        let session = issue(&store, user_id, now).await.unwrap();
        revoke(&store, &session.token).await.unwrap();
        revoke(&store, &session.token).await.unwrap();
        revoke(&store, "never-existed").await.unwrap();
        let err = validate(&store, &session.token, now).await.unwrap_err();
        assert!(matches!(err, ValidateError::MissingToken));
    }
}
