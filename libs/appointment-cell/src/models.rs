use serde::{Deserialize, Serialize};

use doctor_cell::models::BookingConfirmation;

/// Missing fields deserialize as empty strings so that the schedule store
/// reports them as validation failures rather than axum rejecting the body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookAppointmentRequest {
    pub doctor_name: String,
    pub date: String,
    pub time: String,
    pub patient_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentResponse {
    pub message: String,
    #[serde(flatten)]
    pub appointment: BookingConfirmation,
}

impl From<BookingConfirmation> for BookAppointmentResponse {
    fn from(appointment: BookingConfirmation) -> Self {
        Self {
            message: appointment.message(),
            appointment,
        }
    }
}
