use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::{CreateAddressRequest, CreateContactRequest, UpdatePatientRequest};
use crate::services::PatientService;

/// Patients can only touch their own record; doctors and admins see all.
fn ensure_access(user: &User, patient_id: &str) -> Result<(), AppError> {
    if user.role == UserRole::Patient && user.id != patient_id {
        return Err(AppError::Forbidden(
            "Cannot access another patient's record".to_string(),
        ));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if user.role == UserRole::Patient {
        return Err(AppError::Forbidden(
            "Patients cannot list the patient registry".to_string(),
        ));
    }

    let service = PatientService::new(&state);
    let patients = service.list_patients().await?;
    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_access(&user, &patient_id)?;
    let service = PatientService::new(&state);
    let patient = service.get_patient(&patient_id).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_access(&user, &patient_id)?;
    let service = PatientService::new(&state);
    let patient = service.update_patient(&patient_id, request).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can delete patient records".to_string(),
        ));
    }

    let service = PatientService::new(&state);
    service.delete_patient(&patient_id).await?;
    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn list_contacts(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_access(&user, &patient_id)?;
    let service = PatientService::new(&state);
    let contacts = service.list_contacts(&patient_id).await?;
    Ok(Json(json!({ "contacts": contacts })))
}

#[axum::debug_handler]
pub async fn add_contact(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
    Json(request): Json<CreateContactRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_access(&user, &patient_id)?;
    let service = PatientService::new(&state);
    let contact = service.add_contact(&patient_id, request).await?;
    Ok(Json(json!(contact)))
}

#[axum::debug_handler]
pub async fn delete_contact(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, contact_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    ensure_access(&user, &patient_id)?;
    let service = PatientService::new(&state);
    service.delete_contact(&patient_id, &contact_id).await?;
    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn list_addresses(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_access(&user, &patient_id)?;
    let service = PatientService::new(&state);
    let addresses = service.list_addresses(&patient_id).await?;
    Ok(Json(json!({ "addresses": addresses })))
}

#[axum::debug_handler]
pub async fn add_address(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
    Json(request): Json<CreateAddressRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_access(&user, &patient_id)?;
    let service = PatientService::new(&state);
    let address = service.add_address(&patient_id, request).await?;
    Ok(Json(json!(address)))
}

#[axum::debug_handler]
pub async fn delete_address(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, address_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    ensure_access(&user, &patient_id)?;
    let service = PatientService::new(&state);
    service.delete_address(&patient_id, &address_id).await?;
    Ok(Json(json!({ "deleted": true })))
}
