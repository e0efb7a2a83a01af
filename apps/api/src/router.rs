use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use assistant_cell::router::assistant_routes;
use assistant_cell::services::ChatService;
use doctor_cell::handlers::DoctorState;
use doctor_cell::router::{doctor_routes, find_doctors_route};
use doctor_cell::services::ScheduleStore;
use shared_config::AppConfig;

pub fn create_router(config: &AppConfig, schedule: Arc<ScheduleStore>) -> Router {
    let doctors = Arc::new(DoctorState::new(config, schedule.clone()));
    let chat = Arc::new(ChatService::new(config));

    Router::new()
        .route("/", get(|| async { "MedAssist API is running!" }))
        .merge(find_doctors_route(doctors.clone()))
        .nest("/doctors", doctor_routes(doctors))
        .nest("/appointments", appointment_routes(schedule))
        .merge(assistant_routes(chat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use doctor_cell::services::{InMemoryScheduleRepository, ScheduleSettings};
    use tower::ServiceExt;

    fn empty_schedule() -> Arc<ScheduleStore> {
        Arc::new(ScheduleStore::new(
            Arc::new(InMemoryScheduleRepository::new()),
            ScheduleSettings::default(),
        ))
    }

    #[tokio::test]
    async fn test_root_is_alive() {
        let app = create_router(&AppConfig::default(), empty_schedule());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_routes_are_mounted_under_their_prefixes() {
        let app = create_router(&AppConfig::default(), empty_schedule());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/doctors/availability?doctor=Sharma&date=2024-06-01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "not_found");
    }
}
