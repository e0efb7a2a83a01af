use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::DatabaseError;

/// Which part of the schedule lookup came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundTarget {
    Doctor,
    ScheduleForDate,
    Slot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    NoAvailability,
    Conflict,
    TransientFailure,
    ValidationFailure,
    AmbiguousMatch,
    StorageFailure,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("{message}")]
    NotFound { target: NotFoundTarget, message: String },

    #[error("Sorry, all slots for {doctor} on {date} are booked")]
    NoAvailability { doctor: String, date: NaiveDate },

    #[error("Sorry, the time slot {time} on {date} with {doctor} is already booked")]
    Conflict { doctor: String, date: NaiveDate, time: String },

    #[error("Schedule storage is temporarily unavailable: {0}")]
    TransientFailure(String),

    #[error("Invalid request: {0}")]
    ValidationFailure(String),

    #[error("'{query}' matches more than one doctor: {}", .candidates.join(", "))]
    AmbiguousMatch { query: String, candidates: Vec<String> },

    #[error("Schedule storage rejected the request: {0}")]
    StorageFailure(String),
}

impl ScheduleError {
    pub fn doctor_not_found(name: &str) -> Self {
        ScheduleError::NotFound {
            target: NotFoundTarget::Doctor,
            message: format!("Doctor {} not found", name),
        }
    }

    pub fn schedule_not_found(doctor: &str, date: NaiveDate) -> Self {
        ScheduleError::NotFound {
            target: NotFoundTarget::ScheduleForDate,
            message: format!("{} has no schedule for {}", doctor, date),
        }
    }

    pub fn slot_not_found(time: &str, date: NaiveDate) -> Self {
        ScheduleError::NotFound {
            target: NotFoundTarget::Slot,
            message: format!("The time slot {} does not exist on {}", time, date),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::NotFound { .. } => ErrorKind::NotFound,
            ScheduleError::NoAvailability { .. } => ErrorKind::NoAvailability,
            ScheduleError::Conflict { .. } => ErrorKind::Conflict,
            ScheduleError::TransientFailure(_) => ErrorKind::TransientFailure,
            ScheduleError::ValidationFailure(_) => ErrorKind::ValidationFailure,
            ScheduleError::AmbiguousMatch { .. } => ErrorKind::AmbiguousMatch,
            ScheduleError::StorageFailure(_) => ErrorKind::StorageFailure,
        }
    }

    /// Only storage hiccups are worth retrying. Everything else needs different input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScheduleError::TransientFailure(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::NoAvailability => StatusCode::CONFLICT,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::TransientFailure => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::ValidationFailure => StatusCode::BAD_REQUEST,
            ErrorKind::AmbiguousMatch => StatusCode::CONFLICT,
            ErrorKind::StorageFailure => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn to_failure(&self) -> OperationFailure {
        OperationFailure {
            kind: self.kind(),
            message: self.to_string(),
            retryable: self.is_retryable(),
        }
    }
}

/// Structured failure returned to callers instead of a raw error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl IntoResponse for ScheduleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let failure = self.to_failure();

        if status.is_server_error() {
            tracing::error!("Schedule error: {}: {}", status, failure.message);
        } else {
            tracing::debug!("Schedule error: {}: {}", status, failure.message);
        }

        (status, Json(serde_json::json!({
            "error": failure.message,
            "kind": failure.kind,
            "retryable": failure.retryable,
        }))).into_response()
    }
}

/// Failures raised by a schedule storage adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("malformed schedule document: {0}")]
    Malformed(String),

    #[error("storage rejected request: {0}")]
    Rejected(String),
}

impl From<RepositoryError> for ScheduleError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Unavailable(msg) => ScheduleError::TransientFailure(msg),
            RepositoryError::Malformed(msg) => ScheduleError::ValidationFailure(msg),
            RepositoryError::Rejected(msg) => ScheduleError::StorageFailure(msg),
        }
    }
}

impl From<DatabaseError> for RepositoryError {
    fn from(err: DatabaseError) -> Self {
        if err.is_transient() {
            return RepositoryError::Unavailable(err.to_string());
        }
        tracing::error!("Non-transient storage failure: {}", err);
        RepositoryError::Rejected(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Doctor directory request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Doctor directory returned {status}: {body}")]
    Status { status: u16, body: String },
}
