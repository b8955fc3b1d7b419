use chrono::NaiveDate;
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::DataApiClient;

use crate::models::AppointmentError;

const COLLECTION: &str = "appointments";

/// Detects double-bookings against live (non-cancelled) appointments.
pub struct ConflictService {
    store: DataApiClient,
}

impl ConflictService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
        }
    }

    /// Times already held for a doctor on a date. Cancelled appointments
    /// do not count, so their slots are bookable again.
    pub async fn occupied_times(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<String>, AppointmentError> {
        let documents = self
            .store
            .find(
                COLLECTION,
                json!({
                    "doctor_id": doctor_id,
                    "date": date.to_string(),
                    "status": { "$ne": "cancelled" }
                }),
            )
            .await?;

        let mut times: Vec<String> = documents
            .into_iter()
            .filter_map(|doc| {
                doc.get("time")
                    .and_then(|t| t.as_str())
                    .map(str::to_string)
            })
            .collect();
        times.sort();
        times.dedup();

        debug!(
            "Doctor {} has {} occupied slots on {}",
            doctor_id,
            times.len(),
            date
        );
        Ok(times)
    }

    pub async fn is_slot_taken(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: &str,
    ) -> Result<bool, AppointmentError> {
        let existing = self
            .store
            .find_one(
                COLLECTION,
                json!({
                    "doctor_id": doctor_id,
                    "date": date.to_string(),
                    "time": time,
                    "status": { "$ne": "cancelled" }
                }),
            )
            .await?;
        Ok(existing.is_some())
    }
}
