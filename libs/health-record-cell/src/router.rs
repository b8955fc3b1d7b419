use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn health_record_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/allergies/{patient_id}", get(handlers::list_allergies))
        .route("/allergies/{patient_id}", post(handlers::add_allergy))
        .route(
            "/allergies/{patient_id}/{allergy_id}",
            delete(handlers::delete_allergy),
        )
        .route("/visits", post(handlers::record_visit))
        .route(
            "/visits/patient/{patient_id}",
            get(handlers::visits_for_patient),
        )
        .route(
            "/medical/patient/{patient_id}",
            get(handlers::records_for_patient),
        )
        .route(
            "/medical/doctor/{doctor_id}",
            get(handlers::records_for_doctor),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
