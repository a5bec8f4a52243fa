use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{self, Principal};
use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Creates the account and an initial session. Emails are stored and
/// compared exactly as given (case-sensitive); uniqueness is checked
/// at write time.
pub async fn signup(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(String, Principal), ApiError> {
    if !is_valid_email(email) {
        return Err(ApiError::InvalidRequest("Invalid email".into()));
    }

    if state.store.user_by_email(email).await?.is_some() {
        warn!("signup with an already registered email");
        return Err(ApiError::DuplicateEmail);
    }

    let digest = hash_password(password, &state.config.auth_salt);
    let user = state.store.create_user(name, email, &digest).await?;
    let session = session::issue(state.store.as_ref(), user.id, OffsetDateTime::now_utc()).await?;

    info!(user_id = %user.id, "user signed up");
    Ok((session.token, Principal::from(user)))
}

/// Unknown email and wrong password produce the same error, so a
/// caller cannot probe which accounts exist. Success always issues a
/// fresh session; earlier sessions stay valid until they expire or are
/// revoked.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<(String, Principal), ApiError> {
    let user = match state.store.user_by_email(email).await? {
        Some(u) if verify_password(password, &state.config.auth_salt, &u.password_hash) => u,
        _ => {
            warn!("login rejected");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let session = session::issue(state.store.as_ref(), user.id, OffsetDateTime::now_utc()).await?;
    info!(user_id = %user.id, "user logged in");
    Ok((session.token, Principal::from(user)))
}

/// Always succeeds, whether or not the token named a live session.
pub async fn logout(state: &AppState, token: Option<&str>) -> Result<(), ApiError> {
    if let Some(token) = token {
        session::revoke(state.store.as_ref(), token).await?;
    }
    Ok(())
}

/// Partial update: absent fields are left untouched.
pub async fn update_settings(
    state: &AppState,
    principal: &Principal,
    notifications_enabled: Option<bool>,
) -> Result<Principal, ApiError> {
    let Some(enabled) = notifications_enabled else {
        return Ok(principal.clone());
    };

    let user = state
        .store
        .set_notifications(principal.id, enabled)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Principal::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::validate;

    #[test]
    fn email_regex_accepts_short_domains() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@at@signs.com"));
        assert!(!is_valid_email("spaces in@x.com"));
    }

    #[tokio::test]
    async fn signup_then_login_with_same_credentials() {
        let state = AppState::fake();
        let now = OffsetDateTime::now_utc();

        let (t1, p1) = signup(&state, "Alice", "a@x.com", "pw1").await.unwrap();
        assert!(p1.notifications_enabled);
        assert_eq!(p1.name, "Alice");

        let (t2, p2) = login(&state, "a@x.com", "pw1").await.unwrap();
        assert_eq!(p1.id, p2.id);
        assert_ne!(t1, t2);

        // both sessions usable concurrently
        validate(state.store.as_ref(), &t1, now).await.unwrap();
        validate(state.store.as_ref(), &t2, now).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let state = AppState::fake();
        signup(&state, "Alice", "a@x.com", "pw1").await.unwrap();
        let err = signup(&state, "Other", "a@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail));
    }

    #[tokio::test]
    async fn email_comparison_is_case_sensitive() {
        let state = AppState::fake();
        signup(&state, "Alice", "a@x.com", "pw1").await.unwrap();
        // a differently-cased address is a different account
        signup(&state, "Alice", "A@x.com", "pw1").await.unwrap();
        let err = login(&state, "A@X.COM", "pw1").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_identical() {
        let state = AppState::fake();
        signup(&state, "Alice", "a@x.com", "pw1").await.unwrap();

        let wrong_pw = login(&state, "a@x.com", "nope").await.unwrap_err();
        let unknown = login(&state, "b@x.com", "pw1").await.unwrap_err();
        assert!(matches!(wrong_pw, ApiError::InvalidCredentials));
        assert!(matches!(unknown, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn logout_revokes_and_tolerates_anything() {
        let state = AppState::fake();
        let now = OffsetDateTime::now_utc();
        let (token, _) = signup(&state, "Alice", "a@x.com", "pw1").await.unwrap();

        logout(&state, Some(&token)).await.unwrap();
        assert!(validate(state.store.as_ref(), &token, now).await.is_err());

        logout(&state, Some("unknown-token")).await.unwrap();
        logout(&state, None).await.unwrap();
    }

    #[tokio::test]
    async fn settings_update_is_a_partial_merge() {
        let state = AppState::fake();
        let (_, principal) = signup(&state, "Alice", "a@x.com", "pw1").await.unwrap();

        // absent field: nothing changes
        let unchanged = update_settings(&state, &principal, None).await.unwrap();
        assert!(unchanged.notifications_enabled);

        let off = update_settings(&state, &principal, Some(false)).await.unwrap();
        assert!(!off.notifications_enabled);

        let stored = state.store.user_by_id(principal.id).await.unwrap().unwrap();
        assert!(!stored.notifications_enabled);
        assert_eq!(stored.name, "Alice");
    }
}
