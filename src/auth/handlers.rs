use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ForgotRequest, ForgotResponse, LoginRequest, OkResponse, ResetRequest,
            SettingsRequest, SignupRequest, TokenResponse,
        },
        extractors::{bearer_token, AuthPrincipal},
        reset, services,
        session::Principal,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot", post(forgot))
        .route("/auth/reset", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me/settings", put(update_settings))
}

#[instrument(skip(state, payload))]
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (token, principal) =
        services::signup(&state, &payload.name, &payload.email, &payload.password).await?;
    Ok(Json(TokenResponse::new(token, principal)))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (token, principal) = services::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(TokenResponse::new(token, principal)))
}

// No extractor here: an invalid or absent token still answers ok.
#[instrument(skip(state, headers))]
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<OkResponse>, ApiError> {
    services::logout(&state, bearer_token(&headers)).await?;
    Ok(Json(OkResponse::ok()))
}

#[instrument(skip(state, payload))]
async fn forgot(
    State(state): State<AppState>,
    Json(payload): Json<ForgotRequest>,
) -> Result<Json<ForgotResponse>, ApiError> {
    let reset_token =
        reset::request_reset(&state, &payload.email, OffsetDateTime::now_utc()).await?;
    Ok(Json(ForgotResponse {
        ok: true,
        reset_token,
    }))
}

#[instrument(skip(state, payload))]
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    reset::complete_reset(
        &state,
        &payload.email,
        &payload.reset_token,
        &payload.new_password,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(OkResponse::ok()))
}

#[instrument(skip_all)]
async fn me(AuthPrincipal(principal): AuthPrincipal) -> Json<Principal> {
    Json(principal)
}

#[instrument(skip(state, payload))]
async fn update_settings(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(payload): Json<SettingsRequest>,
) -> Result<Json<Principal>, ApiError> {
    let updated =
        services::update_settings(&state, &principal, payload.notifications_enabled).await?;
    Ok(Json(updated))
}
