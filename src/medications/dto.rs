use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::medications::schedule::{classify, is_due, Status};
use crate::store::Medication;

/// Request body shared by create and update.
#[derive(Debug, Deserialize)]
pub struct MedicationRequest {
    pub name: String,
    pub dosage: String,
    pub time_12h: String,
    pub frequency: String,
    pub notes: Option<String>,
}

/// Medication as seen by the client. `status` and `due` are derived at
/// response time, never stored.
#[derive(Debug, Serialize)]
pub struct MedicationResponse {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub time_12h: String,
    pub frequency: String,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_taken_at: Option<OffsetDateTime>,
    #[serde(rename = "snooze_until_utc", with = "time::serde::rfc3339::option")]
    pub snooze_until: Option<OffsetDateTime>,
    pub status: Status,
    pub due: bool,
}

impl MedicationResponse {
    pub fn from_record(medication: Medication, now: OffsetDateTime) -> Self {
        let status = classify(medication.last_taken_at, medication.snooze_until, now);
        let due = is_due(&medication, now);
        Self {
            id: medication.id,
            name: medication.name,
            dosage: medication.dosage,
            time_12h: medication.time_12h,
            frequency: medication.frequency,
            notes: medication.notes,
            last_taken_at: medication.last_taken_at,
            snooze_until: medication.snooze_until,
            status,
            due,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SnoozeResponse {
    pub ok: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub snooze_until_utc: OffsetDateTime,
}
