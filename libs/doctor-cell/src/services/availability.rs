use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DataApiClient;

use crate::models::{default_slot_grid, DayAvailability, DoctorError, Weekday};

const COLLECTION: &str = "availabilities";

/// Manages the per-weekday slot grids doctors can be booked against.
pub struct AvailabilityService {
    store: DataApiClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
        }
    }

    /// Seeds the default 09:00-18:00 grid for Monday through Friday.
    /// Already-configured days are left untouched.
    pub async fn seed_default(&self, doctor_id: &str) -> Result<(), DoctorError> {
        for day in Weekday::working_week() {
            self.store
                .update_one(
                    COLLECTION,
                    json!({ "doctor_id": doctor_id, "day": day.as_str() }),
                    json!({
                        "$setOnInsert": {
                            "_id": Uuid::new_v4().to_string(),
                            "doctor_id": doctor_id,
                            "day": day.as_str(),
                            "slots": default_slot_grid(),
                        }
                    }),
                    true,
                )
                .await?;
        }
        debug!("Seeded default availability for doctor {}", doctor_id);
        Ok(())
    }

    /// All configured days for a doctor.
    pub async fn week(&self, doctor_id: &str) -> Result<Vec<DayAvailability>, DoctorError> {
        let documents = self
            .store
            .find(COLLECTION, json!({ "doctor_id": doctor_id }))
            .await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| DoctorError::Decode(e.to_string())))
            .collect()
    }

    pub async fn get_day(
        &self,
        doctor_id: &str,
        day: Weekday,
    ) -> Result<Option<DayAvailability>, DoctorError> {
        let document = self
            .store
            .find_one(
                COLLECTION,
                json!({ "doctor_id": doctor_id, "day": day.as_str() }),
            )
            .await?;
        document
            .map(|doc| serde_json::from_value(doc).map_err(|e| DoctorError::Decode(e.to_string())))
            .transpose()
    }

    /// The configured grid for the weekday of `date`. A day without an
    /// availability document yields an empty grid, which makes weekends
    /// unbookable unless the doctor opts in.
    pub async fn slots_for_date(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<String>, DoctorError> {
        let day = Weekday::from_date(date);
        Ok(self
            .get_day(doctor_id, day)
            .await?
            .map(|availability| availability.slots)
            .unwrap_or_default())
    }

    /// Replaces the slot grid for one weekday, creating the document if
    /// the day was not configured before.
    pub async fn update_day(
        &self,
        doctor_id: &str,
        day: Weekday,
        slots: Vec<String>,
    ) -> Result<DayAvailability, DoctorError> {
        let grid = default_slot_grid();
        for slot in &slots {
            if NaiveTime::parse_from_str(slot, "%H:%M").is_err() || !grid.contains(slot) {
                return Err(DoctorError::InvalidSlot(slot.clone()));
            }
        }

        let mut slots = slots;
        slots.sort();
        slots.dedup();

        self.store
            .update_one(
                COLLECTION,
                json!({ "doctor_id": doctor_id, "day": day.as_str() }),
                json!({
                    "$set": { "slots": &slots },
                    "$setOnInsert": {
                        "_id": Uuid::new_v4().to_string(),
                        "doctor_id": doctor_id,
                        "day": day.as_str(),
                    }
                }),
                true,
            )
            .await?;

        self.get_day(doctor_id, day)
            .await?
            .ok_or_else(|| DoctorError::Decode("availability missing after upsert".to_string()))
    }

    pub async fn delete_for_doctor(&self, doctor_id: &str) -> Result<u64, DoctorError> {
        let deleted = self
            .store
            .delete_many(COLLECTION, json!({ "doctor_id": doctor_id }))
            .await?;
        Ok(deleted)
    }
}
