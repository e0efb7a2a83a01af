use std::sync::Arc;

use axum::{extract::State, Json};

use shared_models::error::AppError;

use crate::models::{ChatReply, ChatRequest, SymptomRequest, SymptomResponse};
use crate::services::{symptom_advice, ChatService};

#[axum::debug_handler]
pub async fn chat(
    State(chat): State<Arc<ChatService>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = chat.respond(&request.message).await?;
    Ok(Json(reply))
}

#[axum::debug_handler]
pub async fn check_symptoms(Json(request): Json<SymptomRequest>) -> Json<SymptomResponse> {
    Json(SymptomResponse {
        suggestion: symptom_advice(&request.symptoms),
    })
}
