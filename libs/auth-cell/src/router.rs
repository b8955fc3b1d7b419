use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/register", post(handlers::register_patient))
        .route("/login", post(handlers::login))
        .route("/verify-code", post(handlers::verify_code))
        .route("/login-face", post(handlers::login_face))
        .route("/admin/login", post(handlers::admin_login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::me))
        .route("/enroll-face", post(handlers::enroll_face))
        .route(
            "/register-doctor",
            post(handlers::register_doctor_account),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
