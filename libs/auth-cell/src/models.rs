use serde::{Deserialize, Serialize};
use thiserror::Error;

use notification_cell::models::NotificationError;
use shared_database::DataApiError;
use shared_models::auth::UserRole;
use shared_models::error::AppError;

/// Login account as stored in patient_users, doctor_users or admins.
/// The document id doubles as the profile id, so a patient account and
/// its patient record share the same identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub face_encoding: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPatientRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDoctorAccountRequest {
    pub doctor_id: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct FaceLoginRequest {
    /// Base64-encoded image handed to the encoding service.
    pub image: String,
}

#[derive(Debug, Deserialize)]
pub struct EnrollFaceRequest {
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub role: UserRole,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Identifiants invalides")]
    InvalidCredentials,

    #[error("Code de vérification invalide")]
    CodeInvalid,

    #[error("Code de vérification expiré")]
    CodeExpired,

    #[error("Un compte existe déjà pour {0}")]
    EmailTaken(String),

    #[error("Visage non reconnu")]
    FaceNotRecognized,

    #[error("La connexion par reconnaissance faciale n'est pas configurée")]
    FaceNotConfigured,

    #[error("Face encoding service error: {0}")]
    FaceService(String),

    #[error("Account not found")]
    NotFound,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Token issuance failed: {0}")]
    Token(String),

    #[error(transparent)]
    Mail(#[from] NotificationError),

    #[error(transparent)]
    Store(#[from] DataApiError),

    #[error("Invalid record in store: {0}")]
    Decode(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::CodeInvalid
            | AuthError::CodeExpired
            | AuthError::FaceNotRecognized => AppError::Auth(err.to_string()),
            AuthError::EmailTaken(_) => AppError::Conflict(err.to_string()),
            AuthError::NotFound => AppError::NotFound(err.to_string()),
            AuthError::FaceNotConfigured | AuthError::FaceService(_) | AuthError::Mail(_) => {
                AppError::ExternalService(err.to_string())
            }
            AuthError::Store(e) => AppError::Database(e.to_string()),
            AuthError::Hash(msg) | AuthError::Token(msg) | AuthError::Decode(msg) => {
                AppError::Internal(msg)
            }
        }
    }
}
