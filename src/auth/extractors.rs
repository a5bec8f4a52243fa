use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use time::OffsetDateTime;
use tracing::warn;

use crate::auth::session::{self, Principal, ValidateError};
use crate::error::ApiError;
use crate::state::AppState;

/// Pulls the bearer token out of the standard authorization header.
/// The token is opaque; nothing beyond "non-empty" is assumed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .filter(|t| !t.is_empty())
}

/// Extracts and validates the session token, resolving the principal.
/// All rejection reasons surface as one `Unauthenticated`.
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthenticated)?;

        match session::validate(state.store.as_ref(), token, OffsetDateTime::now_utc()).await {
            Ok(principal) => Ok(AuthPrincipal(principal)),
            Err(ValidateError::Store(e)) => Err(ApiError::Store(e)),
            Err(reason) => {
                warn!(%reason, "bearer token rejected");
                Err(ApiError::Unauthenticated)
            }
        }
    }
}
