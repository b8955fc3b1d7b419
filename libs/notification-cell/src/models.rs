use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DataApiError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AppointmentCreated,
    AppointmentUpdated,
    AppointmentCancelled,
    TwoFactorCode,
}

/// Record of an email handed to the relay, kept for the recipient's
/// notification history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    pub recipient: String,
    pub kind: NotificationKind,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Mail relay is not configured")]
    NotConfigured,

    #[error("Mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail relay rejected the message ({status}): {message}")]
    Relay { status: u16, message: String },

    #[error(transparent)]
    Store(#[from] DataApiError),

    #[error("Invalid record in store: {0}")]
    Decode(String),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Store(e) => AppError::Database(e.to_string()),
            NotificationError::Decode(msg) => AppError::Internal(msg),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}
