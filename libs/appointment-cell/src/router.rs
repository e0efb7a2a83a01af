use std::sync::Arc;

use axum::{routing::post, Router};

use doctor_cell::services::ScheduleStore;

use crate::handlers;

pub fn appointment_routes(schedule: Arc<ScheduleStore>) -> Router {
    Router::new()
        .route("/book", post(handlers::book_appointment))
        .with_state(schedule)
}
