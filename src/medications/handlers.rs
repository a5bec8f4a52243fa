use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthPrincipal,
    error::ApiError,
    medications::{
        dto::{MedicationRequest, MedicationResponse, SnoozeResponse},
        services,
    },
    state::AppState,
};

#[derive(Debug, serde::Serialize)]
struct DeletedResponse {
    ok: bool,
}

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/medications", get(list_medications))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/medications", post(create_medication))
        .route(
            "/medications/:id",
            put(update_medication).delete(delete_medication),
        )
        .route("/medications/:id/taken", post(mark_taken))
        .route("/medications/:id/snooze", post(snooze))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
async fn list_medications(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<MedicationResponse>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let items = services::list(&state, &principal)
        .await?
        .into_iter()
        .map(|m| MedicationResponse::from_record(m, now))
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
async fn create_medication(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(payload): Json<MedicationRequest>,
) -> Result<Json<MedicationResponse>, ApiError> {
    let medication = services::create(&state, &principal, &payload).await?;
    Ok(Json(MedicationResponse::from_record(
        medication,
        OffsetDateTime::now_utc(),
    )))
}

#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
async fn update_medication(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
    Json(payload): Json<MedicationRequest>,
) -> Result<Json<MedicationResponse>, ApiError> {
    let medication = services::update(&state, &principal, id, &payload).await?;
    Ok(Json(MedicationResponse::from_record(
        medication,
        OffsetDateTime::now_utc(),
    )))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
async fn delete_medication(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    services::delete(&state, &principal, id).await?;
    Ok(Json(DeletedResponse { ok: true }))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
async fn mark_taken(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<MedicationResponse>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let medication = services::mark_taken(&state, &principal, id, now).await?;
    Ok(Json(MedicationResponse::from_record(medication, now)))
}

#[instrument(skip(state, principal), fields(user_id = %principal.id))]
async fn snooze(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<SnoozeResponse>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let medication = services::snooze(&state, &principal, id, now).await?;
    // the store just set it; missing only if the schema drifted
    let snooze_until_utc = medication.snooze_until.ok_or(ApiError::NotFound)?;
    Ok(Json(SnoozeResponse {
        ok: true,
        snooze_until_utc,
    }))
}
