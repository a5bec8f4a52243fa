use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Medication, MedicationFields, Session, Store, StoreError, User};

/// In-memory store used by `AppState::fake()` and unit tests. Locks
/// are held only for the duration of each call, never across awaits.
#[derive(Default)]
pub struct MemStore {
    users: Mutex<Vec<User>>,
    sessions: Mutex<Vec<Session>>,
    medications: Mutex<Vec<Medication>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            notifications_enabled: true,
            reset_token: None,
            reset_token_expires: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn set_notifications(&self, id: Uuid, enabled: bool) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.notifications_enabled = enabled;
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.reset_token = Some(token.to_string());
            u.reset_token_expires = Some(expires_at);
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.password_hash = password_hash.to_string();
            u.reset_token = None;
            u.reset_token_expires = None;
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        token: &str,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<Session, StoreError> {
        let session = Session {
            token: token.to_string(),
            user_id,
            created_at,
            expires_at,
        };
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.lock().unwrap().retain(|s| s.token != token);
        Ok(())
    }

    async fn medications_by_user(&self, user_id: Uuid) -> Result<Vec<Medication>, StoreError> {
        let mut rows: Vec<Medication> = self
            .medications
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn create_medication(
        &self,
        user_id: Uuid,
        fields: MedicationFields,
    ) -> Result<Medication, StoreError> {
        let now = OffsetDateTime::now_utc();
        let medication = Medication {
            id: Uuid::new_v4(),
            user_id,
            name: fields.name,
            dosage: fields.dosage,
            time_12h: fields.time_12h,
            frequency: fields.frequency,
            notes: fields.notes,
            last_taken_at: None,
            snooze_until: None,
            created_at: now,
            updated_at: now,
        };
        self.medications.lock().unwrap().push(medication.clone());
        Ok(medication)
    }

    async fn update_medication(
        &self,
        user_id: Uuid,
        id: Uuid,
        fields: MedicationFields,
    ) -> Result<Option<Medication>, StoreError> {
        let mut rows = self.medications.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|m| m.id == id && m.user_id == user_id)
            .map(|m| {
                m.name = fields.name.clone();
                m.dosage = fields.dosage.clone();
                m.time_12h = fields.time_12h.clone();
                m.frequency = fields.frequency.clone();
                m.notes = fields.notes.clone();
                m.updated_at = OffsetDateTime::now_utc();
                m.clone()
            }))
    }

    async fn delete_medication(&self, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        self.medications
            .lock()
            .unwrap()
            .retain(|m| !(m.id == id && m.user_id == user_id));
        Ok(())
    }

    async fn mark_taken(
        &self,
        user_id: Uuid,
        id: Uuid,
        at: OffsetDateTime,
    ) -> Result<Option<Medication>, StoreError> {
        let mut rows = self.medications.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|m| m.id == id && m.user_id == user_id)
            .map(|m| {
                m.last_taken_at = Some(at);
                m.snooze_until = None;
                m.updated_at = OffsetDateTime::now_utc();
                m.clone()
            }))
    }

    async fn snooze_medication(
        &self,
        user_id: Uuid,
        id: Uuid,
        until: OffsetDateTime,
    ) -> Result<Option<Medication>, StoreError> {
        let mut rows = self.medications.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|m| m.id == id && m.user_id == user_id)
            .map(|m| {
                m.snooze_until = Some(until);
                m.updated_at = OffsetDateTime::now_utc();
                m.clone()
            }))
    }
}
