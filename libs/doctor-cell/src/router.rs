use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use crate::handlers::{self, DoctorState};

pub fn doctor_routes(state: Arc<DoctorState>) -> Router {
    Router::new()
        .route("/search", get(handlers::search_doctors))
        .route("/availability", get(handlers::get_availability))
        .with_state(state)
}

/// Top-level `/find-doctors` path used by existing chat clients.
pub fn find_doctors_route(state: Arc<DoctorState>) -> Router {
    Router::new()
        .route("/find-doctors", get(handlers::search_doctors))
        .with_state(state)
}
