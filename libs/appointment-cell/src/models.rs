use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use doctor_cell::models::DoctorError;
use shared_database::DataApiError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "_id")]
    pub id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub consultation_type: String,
    pub reason: String,
    pub status: AppointmentStatus,
    pub visit_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    pub patient_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub consultation_type: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub consultation_type: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Le créneau {time} du {date} n'est pas proposé par ce médecin")]
    SlotUnavailable { date: NaiveDate, time: String },

    #[error("Le créneau {time} du {date} est déjà réservé")]
    SlotTaken { date: NaiveDate, time: String },

    #[error("Appointment not found")]
    NotFound,

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Availability(#[from] DoctorError),

    #[error(transparent)]
    Store(#[from] DataApiError),

    #[error("Invalid record in store: {0}")]
    Decode(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::SlotUnavailable { .. } => AppError::ValidationError(err.to_string()),
            AppointmentError::SlotTaken { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::Availability(e) => AppError::from(e),
            AppointmentError::Store(e) => AppError::Database(e.to_string()),
            AppointmentError::Decode(msg) => AppError::Internal(msg),
        }
    }
}
