use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::error::{RepositoryError, ScheduleError};
use crate::models::{
    parse_date, parse_time_label, Availability, AvailabilityReport, BookingConfirmation, Doctor,
    SlotUpdate,
};
use crate::services::repository::ScheduleRepository;

/// How to resolve a name fragment that matches several doctors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatchPolicy {
    /// Take the first doctor in storage order.
    #[default]
    FirstMatch,
    /// Refuse and list the candidates.
    RejectAmbiguous,
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub storage_timeout: Duration,
    pub name_match: NameMatchPolicy,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            storage_timeout: Duration::from_secs(5),
            name_match: NameMatchPolicy::FirstMatch,
        }
    }
}

impl ScheduleSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            storage_timeout: config.storage_timeout(),
            name_match: if config.strict_name_matching {
                NameMatchPolicy::RejectAmbiguous
            } else {
                NameMatchPolicy::FirstMatch
            },
        }
    }
}

/// Availability queries and race-safe bookings over doctor schedules.
pub struct ScheduleStore {
    repository: Arc<dyn ScheduleRepository>,
    settings: ScheduleSettings,
}

impl ScheduleStore {
    pub fn new(repository: Arc<dyn ScheduleRepository>, settings: ScheduleSettings) -> Self {
        Self { repository, settings }
    }

    pub fn repository(&self) -> &Arc<dyn ScheduleRepository> {
        &self.repository
    }

    /// Free slots for a date, or the status of one slot when `time` is given.
    pub async fn query_availability(
        &self,
        doctor_name: &str,
        date: &str,
        time: Option<&str>,
    ) -> Result<AvailabilityReport, ScheduleError> {
        let doctor_name = require_name(doctor_name)?;
        let date = parse_date(date).map_err(ScheduleError::ValidationFailure)?;
        let time = time
            .map(parse_time_label)
            .transpose()
            .map_err(ScheduleError::ValidationFailure)?;

        debug!("Querying availability for '{}' on {} at {:?}", doctor_name, date, time);

        let doctor = self.resolve_doctor(doctor_name).await?;
        let entry = doctor
            .entry(date)
            .ok_or_else(|| ScheduleError::schedule_not_found(&doctor.name, date))?;

        let availability = match time {
            None => {
                let free = entry.free_times();
                if free.is_empty() {
                    return Err(ScheduleError::NoAvailability { doctor: doctor.name.clone(), date });
                }
                Availability::FreeSlots { available_slots: free }
            }
            Some(time) => {
                let slot = entry
                    .slot(&time)
                    .ok_or_else(|| ScheduleError::slot_not_found(&time, date))?;
                Availability::Slot { status: slot.status(), time }
            }
        };

        Ok(AvailabilityReport {
            doctor_id: doctor.id.clone(),
            doctor_name: doctor.name.clone(),
            date,
            availability,
        })
    }

    /// Books one slot for a patient. Exactly one of any number of concurrent
    /// callers on the same (doctor, date, time) succeeds; the others get `Conflict`.
    pub async fn book_appointment(
        &self,
        doctor_name: &str,
        date: &str,
        time: &str,
        patient_id: &str,
    ) -> Result<BookingConfirmation, ScheduleError> {
        let doctor_name = require_name(doctor_name)?;
        let date = parse_date(date).map_err(ScheduleError::ValidationFailure)?;
        let time = parse_time_label(time).map_err(ScheduleError::ValidationFailure)?;
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(ScheduleError::ValidationFailure("patient id is required".to_string()));
        }

        debug!("Booking '{}' on {} at {} for {}", doctor_name, date, time, patient_id);

        let doctor = self.resolve_doctor(doctor_name).await?;
        let entry = doctor
            .entry(date)
            .ok_or_else(|| ScheduleError::schedule_not_found(&doctor.name, date))?;
        let slot = entry
            .slot(&time)
            .ok_or_else(|| ScheduleError::slot_not_found(&time, date))?;

        if slot.booked {
            warn!("Slot {} {} with {} is already booked", date, time, doctor.name);
            return Err(self.conflict(&doctor, date, &time));
        }

        let outcome = self
            .bounded("book slot", self.repository.book_slot(&doctor.id, date, &time, patient_id))
            .await?;

        match outcome {
            SlotUpdate::Booked => {
                info!("Booked {} on {} at {} for patient {}", doctor.name, date, time, patient_id);
                Ok(BookingConfirmation {
                    doctor_id: doctor.id.clone(),
                    doctor_name: doctor.name.clone(),
                    date,
                    time,
                    patient_id: patient_id.to_string(),
                })
            }
            SlotUpdate::AlreadyBooked => {
                warn!("Lost booking race for {} {} with {}", date, time, doctor.name);
                Err(self.conflict(&doctor, date, &time))
            }
            SlotUpdate::DoctorMissing => Err(ScheduleError::doctor_not_found(doctor_name)),
            SlotUpdate::DateMissing => Err(ScheduleError::schedule_not_found(&doctor.name, date)),
            SlotUpdate::SlotMissing => Err(ScheduleError::slot_not_found(&time, date)),
        }
    }

    async fn resolve_doctor(&self, doctor_name: &str) -> Result<Doctor, ScheduleError> {
        let mut matches = self
            .bounded("find doctor", self.repository.find_doctors_by_name(doctor_name))
            .await?;

        if matches.len() > 1 {
            let candidates: Vec<String> = matches.iter().map(|doctor| doctor.name.clone()).collect();
            match self.settings.name_match {
                NameMatchPolicy::RejectAmbiguous => {
                    return Err(ScheduleError::AmbiguousMatch {
                        query: doctor_name.to_string(),
                        candidates,
                    });
                }
                NameMatchPolicy::FirstMatch => {
                    warn!("'{}' matches {:?}, using the first", doctor_name, candidates);
                }
            }
        }

        if matches.is_empty() {
            return Err(ScheduleError::doctor_not_found(doctor_name));
        }
        Ok(matches.swap_remove(0))
    }

    fn conflict(&self, doctor: &Doctor, date: NaiveDate, time: &str) -> ScheduleError {
        ScheduleError::Conflict {
            doctor: doctor.name.clone(),
            date,
            time: time.to_string(),
        }
    }

    /// Runs a storage call under the configured deadline. An elapsed deadline
    /// is a transient failure, never a conflict.
    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T, ScheduleError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        match tokio::time::timeout(self.settings.storage_timeout, call).await {
            Ok(result) => result.map_err(ScheduleError::from),
            Err(_) => {
                warn!("Storage call '{}' timed out after {:?}", operation, self.settings.storage_timeout);
                Err(ScheduleError::TransientFailure(format!(
                    "{} timed out after {} ms",
                    operation,
                    self.settings.storage_timeout.as_millis()
                )))
            }
        }
    }
}

fn require_name(doctor_name: &str) -> Result<&str, ScheduleError> {
    let trimmed = doctor_name.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::ValidationFailure("doctor name is required".to_string()));
    }
    Ok(trimmed)
}
