use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use shared_database::DataApiError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub email: String,
    pub phone: Option<String>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Days of the week as stored in availability documents. Serialized with
/// the French lowercase names used by the scheduling UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "lundi")]
    Monday,
    #[serde(rename = "mardi")]
    Tuesday,
    #[serde(rename = "mercredi")]
    Wednesday,
    #[serde(rename = "jeudi")]
    Thursday,
    #[serde(rename = "vendredi")]
    Friday,
    #[serde(rename = "samedi")]
    Saturday,
    #[serde(rename = "dimanche")]
    Sunday,
}

impl Weekday {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "lundi",
            Weekday::Tuesday => "mardi",
            Weekday::Wednesday => "mercredi",
            Weekday::Thursday => "jeudi",
            Weekday::Friday => "vendredi",
            Weekday::Saturday => "samedi",
            Weekday::Sunday => "dimanche",
        }
    }

    /// The days seeded with a default grid when a doctor is created.
    pub fn working_week() -> [Weekday; 5] {
        [
            Weekday::Monday,
            Weekday::Tuesday,
            Weekday::Wednesday,
            Weekday::Thursday,
            Weekday::Friday,
        ]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Weekday {
    type Err = DoctorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lundi" => Ok(Weekday::Monday),
            "mardi" => Ok(Weekday::Tuesday),
            "mercredi" => Ok(Weekday::Wednesday),
            "jeudi" => Ok(Weekday::Thursday),
            "vendredi" => Ok(Weekday::Friday),
            "samedi" => Ok(Weekday::Saturday),
            "dimanche" => Ok(Weekday::Sunday),
            other => Err(DoctorError::InvalidDay(other.to_string())),
        }
    }
}

/// One doctor's bookable slots for one day of the week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    #[serde(rename = "_id")]
    pub id: String,
    pub doctor_id: String,
    pub day: Weekday,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub slots: Vec<String>,
}

/// Hourly grid from 09:00 to 18:00 inclusive.
pub fn default_slot_grid() -> Vec<String> {
    (9..=18).map(|h| format!("{:02}:00", h)).collect()
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("A doctor with email {0} is already registered")]
    EmailTaken(String),

    #[error("Unknown day of week: {0}")]
    InvalidDay(String),

    #[error("Invalid slot format: {0}")]
    InvalidSlot(String),

    #[error(transparent)]
    Store(#[from] DataApiError),

    #[error("Invalid record in store: {0}")]
    Decode(String),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::EmailTaken(_) => AppError::Conflict(err.to_string()),
            DoctorError::InvalidDay(_) | DoctorError::InvalidSlot(_) => {
                AppError::ValidationError(err.to_string())
            }
            DoctorError::Store(e) => AppError::Database(e.to_string()),
            DoctorError::Decode(msg) => AppError::Internal(msg),
        }
    }
}
