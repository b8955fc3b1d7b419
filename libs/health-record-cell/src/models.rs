use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DataApiError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allergy {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    pub name: String,
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAllergyRequest {
    pub name: String,
    pub severity: Option<String>,
}

/// A completed consultation. Recording one appends an entry to the
/// patient's medical record and closes the linked appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_id: Option<String>,
    pub date: NaiveDate,
    pub summary: String,
    pub prescription: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordVisitRequest {
    pub patient_id: String,
    pub appointment_id: Option<String>,
    pub date: NaiveDate,
    pub summary: String,
    pub prescription: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecordEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub visit_id: Option<String>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Allergy not found")]
    AllergyNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error(transparent)]
    Store(#[from] DataApiError),

    #[error("Invalid record in store: {0}")]
    Decode(String),
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::AllergyNotFound | RecordError::PatientNotFound => {
                AppError::NotFound(err.to_string())
            }
            RecordError::Store(e) => AppError::Database(e.to_string()),
            RecordError::Decode(msg) => AppError::Internal(msg),
        }
    }
}
