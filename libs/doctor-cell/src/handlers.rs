use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::error::ScheduleError;
use crate::models::AvailabilityReport;
use crate::services::{DirectoryClient, DirectorySearch, ScheduleStore};

/// Shared state for the doctor routes.
pub struct DoctorState {
    pub schedule: Arc<ScheduleStore>,
    pub directory: DirectoryClient,
}

impl DoctorState {
    pub fn new(config: &AppConfig, schedule: Arc<ScheduleStore>) -> Self {
        Self {
            schedule,
            directory: DirectoryClient::new(config),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub doctor: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[axum::debug_handler]
pub async fn search_doctors(
    State(state): State<Arc<DoctorState>>,
    Query(query): Query<DirectorySearch>,
) -> Result<Json<Value>, AppError> {
    let doctors = state.directory.search(&query).await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    Ok(Json(json!({
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<DoctorState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityReport>, ScheduleError> {
    let time = query.time.as_deref().filter(|t| !t.trim().is_empty());

    let report = state.schedule.query_availability(
        query.doctor.as_deref().unwrap_or_default(),
        query.date.as_deref().unwrap_or_default(),
        time,
    ).await?;

    Ok(Json(report))
}
