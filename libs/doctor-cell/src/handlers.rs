use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateDoctorRequest, UpdateAvailabilityRequest, UpdateDoctorRequest, Weekday};
use crate::services::{AvailabilityService, DoctorService};

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctors = service.list_doctors().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.get_doctor(&doctor_id).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can create doctor profiles".to_string(),
        ));
    }

    let service = DoctorService::new(&state);
    let doctor = service.create_doctor(request).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Cannot update another doctor's profile".to_string(),
        ));
    }

    let service = DoctorService::new(&state);
    let doctor = service.update_doctor(&doctor_id, request).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can delete doctor profiles".to_string(),
        ));
    }

    let service = DoctorService::new(&state);
    service.delete_doctor(&doctor_id).await?;
    Ok(Json(json!({ "deleted": true })))
}

#[axum::debug_handler]
pub async fn get_week_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let days = service.week(&doctor_id).await?;
    Ok(Json(json!({ "doctor_id": doctor_id, "days": days })))
}

#[axum::debug_handler]
pub async fn get_slots_for_date(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let slots = service.slots_for_date(&doctor_id, query.date).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn update_day_availability(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path((doctor_id, day)): Path<(String, String)>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Cannot modify another doctor's availability".to_string(),
        ));
    }

    let day: Weekday = day.parse().map_err(AppError::from)?;

    let service = AvailabilityService::new(&state);
    let availability = service.update_day(&doctor_id, day, request.slots).await?;
    Ok(Json(json!(availability)))
}

#[axum::debug_handler]
pub async fn seed_availability(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Cannot modify another doctor's availability".to_string(),
        ));
    }

    let service = AvailabilityService::new(&state);
    service.seed_default(&doctor_id).await?;
    let days = service.week(&doctor_id).await?;
    Ok(Json(json!({ "doctor_id": doctor_id, "days": days })))
}
