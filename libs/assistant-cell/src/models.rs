use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::models::AppointmentError;
use doctor_cell::models::DoctorError;
use shared_database::DataApiError;
use shared_models::error::AppError;

/// Where a guided booking conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    SelectDoctor,
    SelectDate,
    SelectTime,
    SelectType,
    SelectReason,
    Confirm,
}

/// Booking details accumulated step by step. Fields fill in the order
/// the steps run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingDraft {
    pub doctor_id: Option<String>,
    pub doctor_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub consultation_type: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    pub step: BookingStep,
    pub draft: BookingDraft,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Free-form exchanges answered by the language model, kept for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("L'assistant n'est pas configuré")]
    NotConfigured,

    #[error("Language model error: {0}")]
    Completion(String),

    #[error(transparent)]
    Booking(#[from] AppointmentError),

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    Store(#[from] DataApiError),

    #[error("Invalid record in store: {0}")]
    Decode(String),
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::NotConfigured | AssistantError::Completion(_) => {
                AppError::ExternalService(err.to_string())
            }
            AssistantError::Booking(e) => AppError::from(e),
            AssistantError::Doctor(e) => AppError::from(e),
            AssistantError::Store(e) => AppError::Database(e.to_string()),
            AssistantError::Decode(msg) => AppError::Internal(msg),
        }
    }
}
