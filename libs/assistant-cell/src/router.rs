use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers;
use crate::services::ChatService;

pub fn assistant_routes(chat: Arc<ChatService>) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/symptoms", post(handlers::check_symptoms))
        .with_state(chat)
}
