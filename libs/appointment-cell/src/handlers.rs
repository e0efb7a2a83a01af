use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use doctor_cell::error::ScheduleError;
use doctor_cell::services::ScheduleStore;

use crate::models::{BookAppointmentRequest, BookAppointmentResponse};

#[axum::debug_handler]
pub async fn book_appointment(
    State(schedule): State<Arc<ScheduleStore>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<BookAppointmentResponse>), ScheduleError> {
    let confirmation = schedule
        .book_appointment(&request.doctor_name, &request.date, &request.time, &request.patient_id)
        .await?;

    info!(
        "Appointment confirmed: doctor {} on {} at {}",
        confirmation.doctor_id, confirmation.date, confirmation.time
    );

    Ok((StatusCode::CREATED, Json(confirmation.into())))
}
