use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::future::join_all;
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::appointment_routes;
use doctor_cell::models::DoctorDocument;
use doctor_cell::services::{InMemoryScheduleRepository, ScheduleSettings, ScheduleStore};
use shared_utils::test_utils::{ScheduleFixtures, SHARMA_ID};

fn create_test_app() -> Router {
    let documents: Vec<DoctorDocument> = serde_json::from_value(ScheduleFixtures::clinic()).unwrap();
    let repository = InMemoryScheduleRepository::from_documents(documents).unwrap();
    let schedule = ScheduleStore::new(Arc::new(repository), ScheduleSettings::default());

    appointment_routes(Arc::new(schedule))
}

async fn book(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/book")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn sharma_at_ten(patient_id: &str) -> Value {
    json!({
        "doctor_name": "Sharma",
        "date": "2024-06-01",
        "time": "10:00",
        "patient_id": patient_id
    })
}

#[tokio::test]
async fn test_book_appointment_returns_created() {
    let app = create_test_app();

    let (status, body) = book(app, sharma_at_ten("patient-42")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["doctor_id"], SHARMA_ID);
    assert_eq!(body["doctor_name"], "Dr. Sharma");
    assert_eq!(body["time"], "10:00");
    assert_eq!(body["patient_id"], "patient-42");
    assert_eq!(
        body["message"],
        "Success! Your appointment with Dr. Sharma on 2024-06-01 at 10:00 is confirmed."
    );
}

#[tokio::test]
async fn test_second_booking_of_same_slot_conflicts() {
    let app = create_test_app();

    let (first, _) = book(app.clone(), sharma_at_ten("patient-42")).await;
    let (second, body) = book(app, sharma_at_ten("patient-99")).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn test_parallel_requests_book_slot_once() {
    let app = create_test_app();

    let requests = (0..8).map(|i| book(app.clone(), sharma_at_ten(&format!("patient-{}", i))));
    let statuses: Vec<StatusCode> = join_all(requests)
        .await
        .into_iter()
        .map(|(status, _)| status)
        .collect();

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 7);
}

#[tokio::test]
async fn test_missing_patient_is_validation_failure() {
    let app = create_test_app();

    let (status, body) = book(app, json!({
        "doctor_name": "Sharma",
        "date": "2024-06-01",
        "time": "10:00"
    })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_failure");
}

#[tokio::test]
async fn test_unknown_slot_is_not_found() {
    let app = create_test_app();

    let mut request = sharma_at_ten("patient-42");
    request["time"] = json!("17:45");
    let (status, body) = book(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}
