use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_patients))
        .route("/{patient_id}", get(handlers::get_patient))
        .route("/{patient_id}", put(handlers::update_patient))
        .route("/{patient_id}", delete(handlers::delete_patient))
        .route("/{patient_id}/contacts", get(handlers::list_contacts))
        .route("/{patient_id}/contacts", post(handlers::add_contact))
        .route(
            "/{patient_id}/contacts/{contact_id}",
            delete(handlers::delete_contact),
        )
        .route("/{patient_id}/addresses", get(handlers::list_addresses))
        .route("/{patient_id}/addresses", post(handlers::add_address))
        .route(
            "/{patient_id}/addresses/{address_id}",
            delete(handlers::delete_address),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
