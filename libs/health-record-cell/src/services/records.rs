use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DataApiClient;

use crate::models::{
    Allergy, CreateAllergyRequest, MedicalRecordEntry, RecordError, RecordVisitRequest, Visit,
};

const ALLERGIES: &str = "allergies";
const VISITS: &str = "visits";
const MEDICAL_RECORDS: &str = "medical_records";

pub struct HealthRecordService {
    store: DataApiClient,
}

impl HealthRecordService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: DataApiClient::new(config),
        }
    }

    pub async fn list_allergies(&self, patient_id: &str) -> Result<Vec<Allergy>, RecordError> {
        let documents = self
            .store
            .find(ALLERGIES, json!({ "patient_id": patient_id }))
            .await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| RecordError::Decode(e.to_string())))
            .collect()
    }

    pub async fn add_allergy(
        &self,
        patient_id: &str,
        request: CreateAllergyRequest,
    ) -> Result<Allergy, RecordError> {
        let patient = self
            .store
            .find_one("patients", json!({ "_id": patient_id }))
            .await?;
        if patient.is_none() {
            return Err(RecordError::PatientNotFound);
        }

        let allergy = Allergy {
            id: Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            name: request.name,
            severity: request.severity,
        };
        let document =
            serde_json::to_value(&allergy).map_err(|e| RecordError::Decode(e.to_string()))?;
        self.store.insert_one(ALLERGIES, document).await?;

        debug!("Added allergy {} for patient {}", allergy.id, patient_id);
        Ok(allergy)
    }

    pub async fn delete_allergy(
        &self,
        patient_id: &str,
        allergy_id: &str,
    ) -> Result<(), RecordError> {
        let deleted = self
            .store
            .delete_one(
                ALLERGIES,
                json!({ "_id": allergy_id, "patient_id": patient_id }),
            )
            .await?;
        if deleted == 0 {
            return Err(RecordError::AllergyNotFound);
        }
        Ok(())
    }

    /// Records a consultation: stores the visit, appends the summary to
    /// the patient's medical record and closes the linked appointment.
    pub async fn record_visit(
        &self,
        doctor_id: &str,
        request: RecordVisitRequest,
    ) -> Result<Visit, RecordError> {
        let visit = Visit {
            id: Uuid::new_v4().to_string(),
            patient_id: request.patient_id.clone(),
            doctor_id: doctor_id.to_string(),
            appointment_id: request.appointment_id.clone(),
            date: request.date,
            summary: request.summary.clone(),
            prescription: request.prescription,
            created_at: Utc::now(),
        };
        let document =
            serde_json::to_value(&visit).map_err(|e| RecordError::Decode(e.to_string()))?;
        self.store.insert_one(VISITS, document).await?;

        let entry = MedicalRecordEntry {
            id: Uuid::new_v4().to_string(),
            patient_id: visit.patient_id.clone(),
            doctor_id: visit.doctor_id.clone(),
            visit_id: Some(visit.id.clone()),
            note: request.summary,
            created_at: visit.created_at,
        };
        let entry_document =
            serde_json::to_value(&entry).map_err(|e| RecordError::Decode(e.to_string()))?;
        self.store.insert_one(MEDICAL_RECORDS, entry_document).await?;

        if let Some(ref appointment_id) = request.appointment_id {
            let outcome = self
                .store
                .update_one(
                    "appointments",
                    json!({ "_id": appointment_id }),
                    json!({ "$set": { "visit_completed": true } }),
                    false,
                )
                .await?;
            if outcome.matched_count == 0 {
                warn!(
                    "Visit {} references unknown appointment {}",
                    visit.id, appointment_id
                );
            }
        }

        info!("Recorded visit {} for patient {}", visit.id, visit.patient_id);
        Ok(visit)
    }

    pub async fn visits_for_patient(&self, patient_id: &str) -> Result<Vec<Visit>, RecordError> {
        let documents = self
            .store
            .find_sorted(
                VISITS,
                json!({ "patient_id": patient_id }),
                json!({ "date": -1 }),
                None,
            )
            .await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| RecordError::Decode(e.to_string())))
            .collect()
    }

    pub async fn records_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<MedicalRecordEntry>, RecordError> {
        self.records(json!({ "patient_id": patient_id })).await
    }

    pub async fn records_for_doctor(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<MedicalRecordEntry>, RecordError> {
        self.records(json!({ "doctor_id": doctor_id })).await
    }

    async fn records(
        &self,
        filter: serde_json::Value,
    ) -> Result<Vec<MedicalRecordEntry>, RecordError> {
        let documents = self
            .store
            .find_sorted(MEDICAL_RECORDS, filter, json!({ "created_at": -1 }), None)
            .await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(|e| RecordError::Decode(e.to_string())))
            .collect()
    }
}
