use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;
use shared_utils::jwt::issue_token;

use crate::models::{
    AuthError, EnrollFaceRequest, FaceLoginRequest, LoginRequest, RegisterDoctorAccountRequest,
    RegisterPatientRequest, SessionResponse, VerifyCodeRequest,
};
use crate::services::{AccountService, FaceLoginService, TwoFactorService};

fn session(user_id: &str, role: UserRole, config: &AppConfig) -> Result<SessionResponse, AppError> {
    let token = issue_token(user_id, role, &config.jwt_secret)
        .map_err(|e| AppError::from(AuthError::Token(e)))?;
    Ok(SessionResponse {
        token,
        user_id: user_id.to_string(),
        role,
    })
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&state);
    let account = service.register_patient(request).await?;
    Ok(Json(json!({
        "user_id": account.id,
        "email": account.email,
        "role": UserRole::Patient
    })))
}

#[axum::debug_handler]
pub async fn register_doctor_account(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDoctorAccountRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can provision doctor accounts".to_string(),
        ));
    }

    let service = AccountService::new(&state);
    let account = service.register_doctor_account(request).await?;
    Ok(Json(json!({
        "user_id": account.id,
        "email": account.email,
        "role": UserRole::Doctor
    })))
}

/// First login step: password check, then a code is mailed. No token is
/// issued until the code comes back.
#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let accounts = AccountService::new(&state);
    let (account, role) = accounts
        .verify_credentials(&request.email, &request.password)
        .await?;

    let twofa = TwoFactorService::new(&state);
    twofa.issue(&account.email, &account.id, role).await?;

    debug!("Verification code sent to {}", account.email);
    Ok(Json(json!({
        "pending": true,
        "message": "Un code de vérification vous a été envoyé par email"
    })))
}

/// Second login step: the mailed code buys a session token.
#[axum::debug_handler]
pub async fn verify_code(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let twofa = TwoFactorService::new(&state);
    let (user_id, role) = twofa.verify(&request.email, &request.code).await?;
    Ok(Json(session(&user_id, role, &state)?))
}

/// Facial login skips the code step: a recognized face is as strong as
/// password plus code.
#[axum::debug_handler]
pub async fn login_face(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<FaceLoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let service = FaceLoginService::new(&state);
    let (account, role) = service.identify(&request.image).await?;
    Ok(Json(session(&account.id, role, &state)?))
}

#[axum::debug_handler]
pub async fn enroll_face(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<EnrollFaceRequest>,
) -> Result<Json<Value>, AppError> {
    let service = FaceLoginService::new(&state);
    service.enroll(user.role, &user.id, &request.image).await?;
    Ok(Json(json!({ "enrolled": true })))
}

/// Administrators authenticate in a single step.
#[axum::debug_handler]
pub async fn admin_login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let accounts = AccountService::new(&state);
    let account = accounts
        .verify_admin_credentials(&request.email, &request.password)
        .await?;
    Ok(Json(session(&account.id, UserRole::Admin, &state)?))
}

#[axum::debug_handler]
pub async fn me(Extension(user): Extension<User>) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({
        "user_id": user.id,
        "role": user.role,
        "issued_at": user.issued_at
    })))
}
