use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::services::MailerService;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub recipient: String,
}

/// Delivery log for one recipient address. Restricted to administrators.
#[axum::debug_handler]
pub async fn notification_history(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can read the delivery log".to_string(),
        ));
    }

    let mailer = MailerService::new(&state);
    let notifications = mailer.history(&query.recipient).await?;

    Ok(Json(json!({
        "recipient": query.recipient,
        "notifications": notifications
    })))
}
