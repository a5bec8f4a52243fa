mod mem;
mod pg;

pub use mem::MemStore;
pub use pg::PgStore;

use async_trait::async_trait;
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// User record. `reset_token`/`reset_token_expires` are the single-use
/// password-reset sub-state; both are cleared together on a successful
/// reset.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub notifications_enabled: bool,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Session record keyed by its opaque token.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// Medication record. Status (idle/taken/snoozed) is never stored; it
/// is derived from `last_taken_at` and `snooze_until`.
#[derive(Debug, Clone, FromRow)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub time_12h: String,
    pub frequency: String,
    pub notes: Option<String>,
    pub last_taken_at: Option<OffsetDateTime>,
    pub snooze_until: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Validated schedule fields shared by medication create and update.
/// `time_12h` is already canonical and `frequency` already checked by
/// the service layer.
#[derive(Debug, Clone)]
pub struct MedicationFields {
    pub name: String,
    pub dosage: String,
    pub time_12h: String,
    pub frequency: String,
    pub notes: Option<String>,
}

/// Document-store collaborator. Every write touches exactly one record,
/// filtered by its own identity plus the ownership predicate, so no
/// multi-record transactions are needed. Medication reads and writes
/// always carry `(user_id, id)` together; cross-user access is
/// structurally impossible rather than checked after the fact.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn set_notifications(&self, id: Uuid, enabled: bool) -> Result<Option<User>, StoreError>;
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError>;
    /// Sets the new digest and clears both reset-token fields in one
    /// update.
    async fn reset_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<Session, StoreError>;
    async fn session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;
    /// Deleting an unknown token is a no-op.
    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;

    async fn medications_by_user(&self, user_id: Uuid) -> Result<Vec<Medication>, StoreError>;
    async fn create_medication(
        &self,
        user_id: Uuid,
        fields: MedicationFields,
    ) -> Result<Medication, StoreError>;
    /// Replaces the schedule fields, preserving `last_taken_at` and
    /// `snooze_until`. `None` when no record matches the owner.
    async fn update_medication(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: MedicationFields,
    ) -> Result<Option<Medication>, StoreError>;
    async fn delete_medication(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError>;
    /// Sets `last_taken_at` and clears any pending snooze.
    async fn mark_taken(
        &self,
        user_id: Uuid,
        id: Uuid,
        at: OffsetDateTime,
    ) -> Result<Option<Medication>, StoreError>;
    /// Sets `snooze_until`, leaving `last_taken_at` untouched.
    async fn snooze_medication(
        &self,
        user_id: Uuid,
        id: Uuid,
        until: OffsetDateTime,
    ) -> Result<Option<Medication>, StoreError>;
}
