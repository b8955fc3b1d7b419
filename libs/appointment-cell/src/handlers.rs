use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::{
    Appointment, BookAppointmentRequest, RescheduleAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::BookingService;

#[derive(Debug, Deserialize)]
pub struct FreeSlotsQuery {
    pub doctor_id: String,
    pub date: NaiveDate,
}

fn ensure_party(user: &User, appointment: &Appointment) -> Result<(), AppError> {
    let involved = match user.role {
        UserRole::Admin => true,
        UserRole::Doctor => appointment.doctor_id == user.id,
        UserRole::Patient => appointment.patient_id == user.id,
    };
    if involved {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not a party to this appointment".to_string(),
        ))
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(mut request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    // Patients can only book for themselves.
    if user.role == UserRole::Patient {
        request.patient_id = user.id.clone();
    }

    let service = BookingService::new(&state);
    let appointment = service.book(request).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let appointment = service.get(&appointment_id).await?;
    ensure_party(&user, &appointment)?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if user.role == UserRole::Patient && user.id != patient_id {
        return Err(AppError::Forbidden(
            "Cannot read another patient's appointments".to_string(),
        ));
    }

    let service = BookingService::new(&state);
    let appointments = service.list_for_patient(&patient_id).await?;
    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn list_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if user.role == UserRole::Patient {
        return Err(AppError::Forbidden(
            "Patients cannot read a doctor's agenda".to_string(),
        ));
    }
    if user.role == UserRole::Doctor && user.id != doctor_id {
        return Err(AppError::Forbidden(
            "Cannot read another doctor's agenda".to_string(),
        ));
    }

    let service = BookingService::new(&state);
    let appointments = service.list_for_doctor(&doctor_id).await?;
    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_free_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let slots = service.free_slots(&query.doctor_id, query.date).await?;
    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": query.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let appointment = service.get(&appointment_id).await?;
    ensure_party(&user, &appointment)?;

    let updated = service.reschedule(&appointment_id, request).await?;
    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let appointment = service.get(&appointment_id).await?;
    ensure_party(&user, &appointment)?;

    let updated = service.update_details(&appointment_id, request).await?;
    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if user.role == UserRole::Patient {
        return Err(AppError::Forbidden(
            "Only the doctor or an administrator can confirm an appointment".to_string(),
        ));
    }

    let service = BookingService::new(&state);
    let appointment = service.get(&appointment_id).await?;
    ensure_party(&user, &appointment)?;

    let confirmed = service.confirm(&appointment_id).await?;
    Ok(Json(json!(confirmed)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let appointment = service.get(&appointment_id).await?;
    ensure_party(&user, &appointment)?;

    let cancelled = service.cancel(&appointment_id).await?;
    Ok(Json(json!(cancelled)))
}
