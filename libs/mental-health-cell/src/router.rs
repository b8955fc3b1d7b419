use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn mental_health_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/phq9", post(handlers::submit_phq9))
        .route("/phq9/proxy", post(handlers::proxy_phq9))
        .route("/phq9/{patient_id}", get(handlers::phq9_history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
