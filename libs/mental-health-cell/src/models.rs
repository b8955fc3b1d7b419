use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DataApiError;
use shared_models::error::AppError;

/// Depression severity bands of the PHQ-9 questionnaire, labelled the
/// way the clinic reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phq9Level {
    #[serde(rename = "léger")]
    Mild,
    #[serde(rename = "modéré")]
    Moderate,
    #[serde(rename = "sévère")]
    Severe,
}

impl Phq9Level {
    pub fn label(&self) -> &'static str {
        match self {
            Phq9Level::Mild => "léger",
            Phq9Level::Moderate => "modéré",
            Phq9Level::Severe => "sévère",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phq9Request {
    /// Nine answers, each between 0 and 3.
    pub answers: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phq9Result {
    pub total: u8,
    pub level: Phq9Level,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phq9Record {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    pub total: u8,
    pub level: Phq9Level,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum MentalHealthError {
    #[error("Le questionnaire PHQ-9 attend 9 réponses, reçu {0}")]
    WrongAnswerCount(usize),

    #[error("Chaque réponse doit être comprise entre 0 et 3")]
    AnswerOutOfRange,

    #[error("Screening service error: {0}")]
    Proxy(String),

    #[error(transparent)]
    Store(#[from] DataApiError),

    #[error("Invalid record in store: {0}")]
    Decode(String),
}

impl From<MentalHealthError> for AppError {
    fn from(err: MentalHealthError) -> Self {
        match err {
            MentalHealthError::WrongAnswerCount(_) | MentalHealthError::AnswerOutOfRange => {
                AppError::ValidationError(err.to_string())
            }
            MentalHealthError::Proxy(msg) => AppError::ExternalService(msg),
            MentalHealthError::Store(e) => AppError::Database(e.to_string()),
            MentalHealthError::Decode(msg) => AppError::Internal(msg),
        }
    }
}
