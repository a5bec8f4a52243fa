use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Medication, MedicationFields, Session, Store, StoreError, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, notifications_enabled, \
     reset_token, reset_token_expires, created_at, updated_at";

const MEDICATION_COLUMNS: &str = "id, user_id, name, dosage, time_12h, frequency, notes, \
     last_taken_at, snooze_until, created_at, updated_at";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE email = $1"#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_notifications(&self, id: Uuid, enabled: bool) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET notifications_enabled = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(enabled)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expires = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expires = NULL,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<Session, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING token, user_id, created_at, expires_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            r#"SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM sessions WHERE token = $1"#)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn medications_by_user(&self, user_id: Uuid) -> Result<Vec<Medication>, StoreError> {
        let rows = sqlx::query_as::<_, Medication>(&format!(
            r#"
            SELECT {MEDICATION_COLUMNS}
            FROM medications
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_medication(
        &self,
        user_id: Uuid,
        fields: MedicationFields,
    ) -> Result<Medication, StoreError> {
        let medication = sqlx::query_as::<_, Medication>(&format!(
            r#"
            INSERT INTO medications (user_id, name, dosage, time_12h, frequency, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(fields.name)
        .bind(fields.dosage)
        .bind(fields.time_12h)
        .bind(fields.frequency)
        .bind(fields.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(medication)
    }

    async fn update_medication(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: MedicationFields,
    ) -> Result<Option<Medication>, StoreError> {
        let medication = sqlx::query_as::<_, Medication>(&format!(
            r#"
            UPDATE medications
            SET name = $3, dosage = $4, time_12h = $5, frequency = $6, notes = $7,
                updated_at = now()
            WHERE id = $2 AND user_id = $1
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(id)
        .bind(fields.name)
        .bind(fields.dosage)
        .bind(fields.time_12h)
        .bind(fields.frequency)
        .bind(fields.notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(medication)
    }

    async fn delete_medication(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM medications WHERE id = $2 AND user_id = $1"#)
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_taken(
        &self,
        user_id: Uuid,
        id: Uuid,
        at: OffsetDateTime,
    ) -> Result<Option<Medication>, StoreError> {
        let medication = sqlx::query_as::<_, Medication>(&format!(
            r#"
            UPDATE medications
            SET last_taken_at = $3, snooze_until = NULL, updated_at = now()
            WHERE id = $2 AND user_id = $1
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(medication)
    }

    async fn snooze_medication(
        &self,
        user_id: Uuid,
        id: Uuid,
        until: OffsetDateTime,
    ) -> Result<Option<Medication>, StoreError> {
        let medication = sqlx::query_as::<_, Medication>(&format!(
            r#"
            UPDATE medications
            SET snooze_until = $3, updated_at = now()
            WHERE id = $2 AND user_id = $1
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(id)
        .bind(until)
        .fetch_optional(&self.pool)
        .await?;
        Ok(medication)
    }
}
