use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use assistant_cell::router::assistant_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::{availability_routes, doctor_routes};
use health_record_cell::router::health_record_routes;
use mental_health_cell::router::mental_health_routes;
use notification_cell::router::notification_routes;
use patient_cell::router::patient_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Bienêtre clinic API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/availability", availability_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/records", health_record_routes(state.clone()))
        .nest("/mental", mental_health_routes(state.clone()))
        .nest("/api/chat", assistant_routes(state))
}
