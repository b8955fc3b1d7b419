use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::{CreateAllergyRequest, RecordVisitRequest};
use crate::services::HealthRecordService;

fn ensure_patient_access(user: &User, patient_id: &str) -> Result<(), AppError> {
    if user.role == UserRole::Patient && user.id != patient_id {
        return Err(AppError::Forbidden(
            "Cannot access another patient's record".to_string(),
        ));
    }
    Ok(())
}

/// Allergies are clinical data: only doctors write them.
fn ensure_doctor(user: &User) -> Result<(), AppError> {
    if user.role != UserRole::Doctor {
        return Err(AppError::Forbidden(
            "Only doctors can manage allergies".to_string(),
        ));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn list_allergies(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_patient_access(&user, &patient_id)?;
    let service = HealthRecordService::new(&state);
    let allergies = service.list_allergies(&patient_id).await?;
    Ok(Json(json!({ "allergies": allergies })))
}

#[axum::debug_handler]
pub async fn add_allergy(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
    Json(request): Json<CreateAllergyRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_doctor(&user)?;
    let service = HealthRecordService::new(&state);
    let allergy = service.add_allergy(&patient_id, request).await?;
    Ok(Json(json!(allergy)))
}

#[axum::debug_handler]
pub async fn delete_allergy(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((patient_id, allergy_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    ensure_doctor(&user)?;
    let service = HealthRecordService::new(&state);
    service.delete_allergy(&patient_id, &allergy_id).await?;
    Ok(Json(json!({ "deleted": true })))
}

/// Only the treating doctor records a visit; the doctor id comes from
/// the token, never from the body.
#[axum::debug_handler]
pub async fn record_visit(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<RecordVisitRequest>,
) -> Result<Json<Value>, AppError> {
    if user.role != UserRole::Doctor {
        return Err(AppError::Forbidden(
            "Only doctors can record visits".to_string(),
        ));
    }

    let service = HealthRecordService::new(&state);
    let visit = service.record_visit(&user.id, request).await?;
    Ok(Json(json!(visit)))
}

#[axum::debug_handler]
pub async fn visits_for_patient(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_patient_access(&user, &patient_id)?;
    let service = HealthRecordService::new(&state);
    let visits = service.visits_for_patient(&patient_id).await?;
    Ok(Json(json!({ "visits": visits })))
}

#[axum::debug_handler]
pub async fn records_for_patient(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_patient_access(&user, &patient_id)?;
    let service = HealthRecordService::new(&state);
    let records = service.records_for_patient(&patient_id).await?;
    Ok(Json(json!({ "records": records })))
}

#[axum::debug_handler]
pub async fn records_for_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if user.role == UserRole::Patient {
        return Err(AppError::Forbidden(
            "Patients cannot browse a doctor's records".to_string(),
        ));
    }
    if user.role == UserRole::Doctor && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Cannot browse another doctor's records".to_string(),
        ));
    }

    let service = HealthRecordService::new(&state);
    let records = service.records_for_doctor(&doctor_id).await?;
    Ok(Json(json!({ "records": records })))
}
