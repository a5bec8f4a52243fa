use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::session::Principal;
use crate::error::ApiError;
use crate::medications::dto::MedicationRequest;
use crate::medications::schedule::{parse_time_12h, Frequency, SNOOZE_WINDOW};
use crate::state::AppState;
use crate::store::{Medication, MedicationFields};

/// Checks frequency and time format, canonicalizing `time_12h` to its
/// uppercase AM/PM form.
fn validate_fields(payload: &MedicationRequest) -> Result<MedicationFields, ApiError> {
    let frequency = Frequency::parse(&payload.frequency).ok_or_else(|| {
        ApiError::InvalidRequest("frequency must be daily, alternate or weekly".into())
    })?;
    let (time_12h, _) = parse_time_12h(&payload.time_12h)
        .map_err(|e| ApiError::InvalidRequest(format!("time_12h: {e}")))?;

    Ok(MedicationFields {
        name: payload.name.clone(),
        dosage: payload.dosage.clone(),
        time_12h,
        frequency: frequency.as_str().to_string(),
        notes: payload.notes.clone(),
    })
}

pub async fn list(state: &AppState, principal: &Principal) -> Result<Vec<Medication>, ApiError> {
    Ok(state.store.medications_by_user(principal.id).await?)
}

pub async fn create(
    state: &AppState,
    principal: &Principal,
    payload: &MedicationRequest,
) -> Result<Medication, ApiError> {
    let fields = validate_fields(payload)?;
    let medication = state.store.create_medication(principal.id, fields).await?;
    info!(user_id = %principal.id, medication_id = %medication.id, "medication created");
    Ok(medication)
}

/// Replaces the schedule fields; `last_taken_at` and `snooze_until`
/// are preserved. A missing or non-owned id is one `NotFound`.
pub async fn update(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    payload: &MedicationRequest,
) -> Result<Medication, ApiError> {
    let fields = validate_fields(payload)?;
    state
        .store
        .update_medication(principal.id, id, fields)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Idempotent: deleting a nonexistent or non-owned id is a silent
/// no-op.
pub async fn delete(state: &AppState, principal: &Principal, id: Uuid) -> Result<(), ApiError> {
    state.store.delete_medication(principal.id, id).await?;
    Ok(())
}

/// Taking a dose always cancels any pending snooze.
pub async fn mark_taken(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    now: OffsetDateTime,
) -> Result<Medication, ApiError> {
    let medication = state
        .store
        .mark_taken(principal.id, id, now)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %principal.id, medication_id = %id, "mark taken on unknown medication");
            ApiError::NotFound
        })?;
    Ok(medication)
}

/// Defers the next reminder by the fixed 10-minute window. The snooze
/// tracks the next occurrence, so a previous take is left untouched.
pub async fn snooze(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    now: OffsetDateTime,
) -> Result<Medication, ApiError> {
    state
        .store
        .snooze_medication(principal.id, id, now + SNOOZE_WINDOW)
        .await?
        .ok_or(ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::signup;
    use time::Duration;

    fn request(time_12h: &str, frequency: &str) -> MedicationRequest {
        MedicationRequest {
            name: "Paracetamol".into(),
            dosage: "1 tablet".into(),
            time_12h: time_12h.into(),
            frequency: frequency.into(),
            notes: None,
        }
    }

    async fn state_with_principal() -> (AppState, Principal) {
        let state = AppState::fake();
        let (_, principal) = signup(&state, "Alice", "a@x.com", "pw1").await.unwrap();
        (state, principal)
    }

    #[tokio::test]
    async fn create_canonicalizes_the_time_and_starts_idle() {
        let (state, principal) = state_with_principal().await;
        let med = create(&state, &principal, &request("8:05 pm", "daily"))
            .await
            .unwrap();
        assert_eq!(med.time_12h, "8:05 PM");
        assert_eq!(med.frequency, "daily");
        assert!(med.last_taken_at.is_none());
        assert!(med.snooze_until.is_none());
    }

    #[tokio::test]
    async fn create_rejects_bad_frequency_and_time() {
        let (state, principal) = state_with_principal().await;
        let err = create(&state, &principal, &request("8:05 PM", "hourly"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));

        let err = create(&state, &principal, &request("25:05 PM", "daily"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn update_replaces_schedule_but_preserves_state() {
        let (state, principal) = state_with_principal().await;
        let now = OffsetDateTime::now_utc();
        let med = create(&state, &principal, &request("8:05 PM", "daily"))
            .await
            .unwrap();
        mark_taken(&state, &principal, med.id, now).await.unwrap();
        snooze(&state, &principal, med.id, now).await.unwrap();

        let updated = update(&state, &principal, med.id, &request("9:00 am", "weekly"))
            .await
            .unwrap();
        assert_eq!(updated.time_12h, "9:00 AM");
        assert_eq!(updated.frequency, "weekly");
        assert_eq!(updated.last_taken_at, Some(now));
        assert_eq!(updated.snooze_until, Some(now + SNOOZE_WINDOW));
    }

    #[tokio::test]
    async fn mark_taken_sets_the_timestamp_and_clears_the_snooze() {
        let (state, principal) = state_with_principal().await;
        let now = OffsetDateTime::now_utc();
        let med = create(&state, &principal, &request("8:05 PM", "daily"))
            .await
            .unwrap();
        snooze(&state, &principal, med.id, now).await.unwrap();

        let taken = mark_taken(&state, &principal, med.id, now).await.unwrap();
        assert_eq!(taken.last_taken_at, Some(now));
        assert!(taken.snooze_until.is_none());
    }

    #[tokio::test]
    async fn snooze_sets_the_window_and_keeps_last_taken() {
        let (state, principal) = state_with_principal().await;
        let t0 = OffsetDateTime::now_utc();
        let med = create(&state, &principal, &request("8:05 PM", "daily"))
            .await
            .unwrap();
        mark_taken(&state, &principal, med.id, t0).await.unwrap();

        let snoozed = snooze(&state, &principal, med.id, t0).await.unwrap();
        assert_eq!(snoozed.snooze_until, Some(t0 + Duration::minutes(10)));
        assert_eq!(snoozed.last_taken_at, Some(t0));
    }

    #[tokio::test]
    async fn other_users_see_not_found_never_partial_success() {
        let (state, alice) = state_with_principal().await;
        let (_, bob) = signup(&state, "Bob", "b@x.com", "pw2").await.unwrap();
        let now = OffsetDateTime::now_utc();
        let med = create(&state, &alice, &request("8:05 PM", "daily"))
            .await
            .unwrap();

        let err = update(&state, &bob, med.id, &request("9:00 AM", "daily"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        let err = mark_taken(&state, &bob, med.id, now).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        let err = snooze(&state, &bob, med.id, now).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));

        // delete by a non-owner is a silent no-op and changes nothing
        delete(&state, &bob, med.id).await.unwrap();
        let remaining = list(&state, &alice).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].last_taken_at.is_none());
    }

    #[tokio::test]
    async fn delete_removes_owned_records_idempotently() {
        let (state, principal) = state_with_principal().await;
        let med = create(&state, &principal, &request("8:05 PM", "daily"))
            .await
            .unwrap();

        delete(&state, &principal, med.id).await.unwrap();
        delete(&state, &principal, med.id).await.unwrap();
        assert!(list(&state, &principal).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_owner() {
        let (state, alice) = state_with_principal().await;
        let (_, bob) = signup(&state, "Bob", "b@x.com", "pw2").await.unwrap();
        create(&state, &alice, &request("8:05 PM", "daily"))
            .await
            .unwrap();

        assert_eq!(list(&state, &alice).await.unwrap().len(), 1);
        assert!(list(&state, &bob).await.unwrap().is_empty());
    }
}
