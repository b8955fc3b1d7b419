use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn assistant_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::chat))
        .route("/history/{patient_id}", get(handlers::chat_history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
