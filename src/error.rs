use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;

/// Domain failure kinds. Callers rely on the kind only; the mapping to
/// wire status codes lives in `IntoResponse` so the transport layer has
/// a single place to change.
///
/// `Unauthenticated` deliberately covers missing, unknown and expired
/// tokens as well as a vanished user: the boundary never tells a caller
/// why a token failed. `NotFound` likewise merges "doesn't exist" and
/// "not owned" so non-owners learn nothing about other users' records.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Invalid or expired token")]
    InvalidOrExpiredResetToken,
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("store unavailable")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::DuplicateEmail => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::InvalidOrExpiredResetToken => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => {
                tracing::error!(error = %e, "request failed against the store");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
                    .into_response();
            }
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_not_owned_share_one_kind() {
        // A single variant means handlers cannot accidentally leak
        // which of the two cases occurred.
        assert_eq!(ApiError::NotFound.to_string(), "Not found");
    }

    #[test]
    fn store_failures_hide_their_detail() {
        let err = ApiError::Store(StoreError::Unavailable(sqlx::Error::PoolClosed));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
