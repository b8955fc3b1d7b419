use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new().route("/free-slots", get(handlers::get_free_slots));

    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", put(handlers::update_appointment))
        .route(
            "/{appointment_id}/reschedule",
            put(handlers::reschedule_appointment),
        )
        .route(
            "/{appointment_id}/confirm",
            patch(handlers::confirm_appointment),
        )
        .route(
            "/{appointment_id}/cancel",
            patch(handlers::cancel_appointment),
        )
        .route(
            "/patient/{patient_id}",
            get(handlers::list_patient_appointments),
        )
        .route(
            "/doctor/{doctor_id}",
            get(handlers::list_doctor_appointments),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
