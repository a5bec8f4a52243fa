use serde::{Deserialize, Serialize};

use crate::auth::session::Principal;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after signup or login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub name: String,
    pub email: String,
    pub notifications_enabled: bool,
}

impl TokenResponse {
    pub fn new(token: String, principal: Principal) -> Self {
        Self {
            token,
            name: principal.name,
            email: principal.email,
            notifications_enabled: principal.notifications_enabled,
        }
    }
}

/// Partial settings update; absent fields stay untouched.
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub notifications_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotRequest {
    pub email: String,
}

/// `reset_token` is only present in demo delivery mode; a production
/// delivery channel leaves it off the wire.
#[derive(Debug, Serialize)]
pub struct ForgotResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
