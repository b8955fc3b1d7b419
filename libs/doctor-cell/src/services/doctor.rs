use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DataApiClient;

use crate::models::{CreateDoctorRequest, Doctor, DoctorError, UpdateDoctorRequest};
use crate::services::availability::AvailabilityService;

const COLLECTION: &str = "doctors";

pub struct DoctorService {
    store: DataApiClient,
    availability: AvailabilityService,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
            availability: AvailabilityService::new(config),
        }
    }

    /// Creates a doctor profile and seeds its weekday availability grid.
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for {}", request.email);

        let existing = self
            .store
            .find_one(COLLECTION, json!({ "email": &request.email }))
            .await?;
        if existing.is_some() {
            return Err(DoctorError::EmailTaken(request.email));
        }

        let doctor = Doctor {
            id: Uuid::new_v4().to_string(),
            first_name: request.first_name,
            last_name: request.last_name,
            specialty: request.specialty,
            email: request.email,
            phone: request.phone,
        };

        let document =
            serde_json::to_value(&doctor).map_err(|e| DoctorError::Decode(e.to_string()))?;
        self.store.insert_one(COLLECTION, document).await?;

        self.availability.seed_default(&doctor.id).await?;

        debug!("Doctor profile created with id {}", doctor.id);
        Ok(doctor)
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        let documents = self.store.find(COLLECTION, json!({})).await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| DoctorError::Decode(e.to_string())))
            .collect()
    }

    pub async fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, DoctorError> {
        let document = self
            .store
            .find_one(COLLECTION, json!({ "_id": doctor_id }))
            .await?
            .ok_or(DoctorError::NotFound)?;
        serde_json::from_value(document).map_err(|e| DoctorError::Decode(e.to_string()))
    }

    pub async fn update_doctor(
        &self,
        doctor_id: &str,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        let mut changes = Map::new();
        if let Some(first_name) = request.first_name {
            changes.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            changes.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(specialty) = request.specialty {
            changes.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(email) = request.email {
            changes.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            changes.insert("phone".to_string(), json!(phone));
        }

        if !changes.is_empty() {
            let outcome = self
                .store
                .update_one(
                    COLLECTION,
                    json!({ "_id": doctor_id }),
                    json!({ "$set": Value::Object(changes) }),
                    false,
                )
                .await?;
            if outcome.matched_count == 0 {
                return Err(DoctorError::NotFound);
            }
        }

        self.get_doctor(doctor_id).await
    }

    /// Deletes a doctor along with its availability documents.
    pub async fn delete_doctor(&self, doctor_id: &str) -> Result<(), DoctorError> {
        let deleted = self
            .store
            .delete_one(COLLECTION, json!({ "_id": doctor_id }))
            .await?;
        if deleted == 0 {
            return Err(DoctorError::NotFound);
        }

        self.availability.delete_for_doctor(doctor_id).await?;
        Ok(())
    }
}
