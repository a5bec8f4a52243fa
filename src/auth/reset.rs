use async_trait::async_trait;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::state::AppState;

pub const RESET_TTL: Duration = Duration::hours(1);

const RESET_TOKEN_LEN: usize = 16;

/// Hands a reset token to the user. A production deployment would wire
/// an email sender here; the demo implementation returns the token so
/// the HTTP response itself is the delivery channel.
#[async_trait]
pub trait ResetDelivery: Send + Sync {
    /// `Some(token)` means the caller should see the token in the
    /// response; a real out-of-band channel returns `None`.
    async fn deliver(&self, email: &str, token: &str) -> Option<String>;
}

pub struct DirectDelivery;

#[async_trait]
impl ResetDelivery for DirectDelivery {
    async fn deliver(&self, _email: &str, token: &str) -> Option<String> {
        Some(token.to_string())
    }
}

fn new_reset_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Stores a fresh short-lived reset token for the account, overwriting
/// any outstanding one, and hands it to the delivery collaborator. An
/// unknown email gets the same generic outcome with no token, so the
/// network boundary learns nothing about account existence.
pub async fn request_reset(
    state: &AppState,
    email: &str,
    now: OffsetDateTime,
) -> Result<Option<String>, ApiError> {
    let Some(user) = state.store.user_by_email(email).await? else {
        info!("reset requested for unknown email");
        return Ok(None);
    };

    let token = new_reset_token();
    state
        .store
        .set_reset_token(user.id, &token, now + RESET_TTL)
        .await?;
    info!(user_id = %user.id, "reset token issued");
    Ok(state.reset_delivery.deliver(email, &token).await)
}

/// Single-use completion. Unknown email, token mismatch and elapsed
/// expiry are indistinguishable to the caller. Success replaces the
/// digest and clears the token fields; sessions issued before the
/// reset stay valid until they expire or are logged out (documented
/// behavior, not an oversight).
pub async fn complete_reset(
    state: &AppState,
    email: &str,
    token: &str,
    new_password: &str,
    now: OffsetDateTime,
) -> Result<(), ApiError> {
    let Some(user) = state.store.user_by_email(email).await? else {
        return Err(ApiError::InvalidOrExpiredResetToken);
    };

    let token_matches = user.reset_token.as_deref() == Some(token);
    let token_live = user.reset_token_expires.is_some_and(|exp| now < exp);
    if !token_matches || !token_live {
        warn!(user_id = %user.id, token_matches, token_live, "reset rejected");
        return Err(ApiError::InvalidOrExpiredResetToken);
    }

    let digest = hash_password(new_password, &state.config.auth_salt);
    state.store.reset_password(user.id, &digest).await?;
    info!(user_id = %user.id, "password reset completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services;

    async fn state_with_account() -> AppState {
        let state = AppState::fake();
        services::signup(&state, "Alice", "a@x.com", "pw1")
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn unknown_email_gets_generic_ok_without_token() {
        let state = AppState::fake();
        let token = request_reset(&state, "unknown@x.com", OffsetDateTime::now_utc())
            .await
            .unwrap();
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn reset_flow_replaces_the_password() {
        let state = state_with_account().await;
        let now = OffsetDateTime::now_utc();

        let token = request_reset(&state, "a@x.com", now).await.unwrap().unwrap();
        complete_reset(&state, "a@x.com", &token, "pw2", now)
            .await
            .unwrap();

        assert!(services::login(&state, "a@x.com", "pw1").await.is_err());
        services::login(&state, "a@x.com", "pw2").await.unwrap();
    }

    #[tokio::test]
    async fn token_is_single_use() {
        let state = state_with_account().await;
        let now = OffsetDateTime::now_utc();
        let token = request_reset(&state, "a@x.com", now).await.unwrap().unwrap();

        complete_reset(&state, "a@x.com", &token, "pw2", now)
            .await
            .unwrap();
        let err = complete_reset(&state, "a@x.com", &token, "pw3", now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOrExpiredResetToken));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let state = state_with_account().await;
        let issued_at = OffsetDateTime::now_utc();
        let token = request_reset(&state, "a@x.com", issued_at)
            .await
            .unwrap()
            .unwrap();

        let later = issued_at + RESET_TTL; // now == expiry is already invalid
        let err = complete_reset(&state, "a@x.com", &token, "pw2", later)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOrExpiredResetToken));
    }

    #[tokio::test]
    async fn mismatched_token_is_rejected() {
        let state = state_with_account().await;
        let now = OffsetDateTime::now_utc();
        request_reset(&state, "a@x.com", now).await.unwrap();

        let err = complete_reset(&state, "a@x.com", "wrong-token", "pw2", now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOrExpiredResetToken));
    }

    #[tokio::test]
    async fn newer_request_invalidates_the_older_token() {
        let state = state_with_account().await;
        let now = OffsetDateTime::now_utc();
        let first = request_reset(&state, "a@x.com", now).await.unwrap().unwrap();
        let second = request_reset(&state, "a@x.com", now).await.unwrap().unwrap();
        assert_ne!(first, second);

        let err = complete_reset(&state, "a@x.com", &first, "pw2", now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidOrExpiredResetToken));
        complete_reset(&state, "a@x.com", &second, "pw2", now)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sessions_survive_a_password_reset() {
        let state = AppState::fake();
        let (token, _) = services::signup(&state, "Alice", "a@x.com", "pw1")
            .await
            .unwrap();
        let now = OffsetDateTime::now_utc();

        let reset = request_reset(&state, "a@x.com", now).await.unwrap().unwrap();
        complete_reset(&state, "a@x.com", &reset, "pw2", now)
            .await
            .unwrap();

        crate::auth::session::validate(state.store.as_ref(), &token, now)
            .await
            .expect("pre-reset session stays valid");
    }
}
