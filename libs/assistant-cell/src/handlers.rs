use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::{ChatReply, ChatRequest};
use crate::services::ConversationService;

#[axum::debug_handler]
pub async fn chat(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let service = ConversationService::new(&state);
    let reply = service.handle(&user.id, &request.message).await?;
    Ok(Json(ChatReply { reply }))
}

#[axum::debug_handler]
pub async fn chat_history(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if user.role == UserRole::Patient && user.id != patient_id {
        return Err(AppError::Forbidden(
            "Cannot read another patient's conversations".to_string(),
        ));
    }

    let service = ConversationService::new(&state);
    let entries = service.history(&patient_id).await?;
    Ok(Json(json!({ "exchanges": entries })))
}
