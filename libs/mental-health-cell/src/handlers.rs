use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::Phq9Request;
use crate::services::Phq9Service;

#[axum::debug_handler]
pub async fn submit_phq9(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<Phq9Request>,
) -> Result<Json<Value>, AppError> {
    let service = Phq9Service::new(&state);
    let result = service.submit(&user.id, &request.answers).await?;
    Ok(Json(json!(result)))
}

#[axum::debug_handler]
pub async fn phq9_history(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if user.role == UserRole::Patient && user.id != patient_id {
        return Err(AppError::Forbidden(
            "Cannot read another patient's screenings".to_string(),
        ));
    }

    let service = Phq9Service::new(&state);
    let records = service.history(&patient_id).await?;
    Ok(Json(json!({ "screenings": records })))
}

#[axum::debug_handler]
pub async fn proxy_phq9(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<Phq9Request>,
) -> Result<Json<Value>, AppError> {
    let service = Phq9Service::new(&state);
    let upstream = service.proxy(&request.answers).await?;
    Ok(Json(upstream))
}
