use std::collections::HashSet;
use std::convert::TryFrom;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::RepositoryError;
use crate::models::{Doctor, DoctorDocument, DoctorId, SlotUpdate};

/// Storage port for doctor schedules.
///
/// Doctors and their slots are provisioned elsewhere; the only mutation this
/// port exposes is the free → booked transition of a single slot.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Doctors whose name contains `fragment` (case-insensitive), in storage order.
    async fn find_doctors_by_name(&self, fragment: &str) -> Result<Vec<Doctor>, RepositoryError>;

    /// Conditional update of the slot identified by (doctor, date, time).
    /// Must only apply while the slot is still free, so that concurrent
    /// callers racing on the same slot see exactly one `Booked`.
    async fn book_slot(
        &self,
        doctor_id: &DoctorId,
        date: NaiveDate,
        time: &str,
        patient_id: &str,
    ) -> Result<SlotUpdate, RepositoryError>;

    fn describe(&self) -> String;

    async fn shutdown(&self) {}
}

/// Process-local schedule storage. Reads share the lock; each booking holds
/// the write lock across its check-and-set.
#[derive(Default)]
pub struct InMemoryScheduleRepository {
    doctors: RwLock<Vec<Doctor>>,
}

impl InMemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctors(doctors: Vec<Doctor>) -> Result<Self, RepositoryError> {
        let mut ids = HashSet::new();
        for doctor in &doctors {
            if !ids.insert(&doctor.id) {
                return Err(RepositoryError::Malformed(format!("duplicate doctor id {}", doctor.id)));
            }
        }

        Ok(Self { doctors: RwLock::new(doctors) })
    }

    pub fn from_documents(documents: Vec<DoctorDocument>) -> Result<Self, RepositoryError> {
        let doctors = documents
            .into_iter()
            .map(Doctor::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Self::with_doctors(doctors)
    }

    /// Loads a JSON array of doctor documents.
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            RepositoryError::Unavailable(format!("cannot read seed file {}: {}", path.display(), e))
        })?;
        let documents: Vec<DoctorDocument> = serde_json::from_str(&raw).map_err(|e| {
            RepositoryError::Malformed(format!("seed file {} is not a list of doctors: {}", path.display(), e))
        })?;

        let repository = Self::from_documents(documents)?;
        info!("Loaded {} doctors from {}", repository.doctors.read().await.len(), path.display());
        Ok(repository)
    }

    pub async fn insert_doctor(&self, doctor: Doctor) -> Result<(), RepositoryError> {
        let mut doctors = self.doctors.write().await;
        if doctors.iter().any(|existing| existing.id == doctor.id) {
            return Err(RepositoryError::Malformed(format!("duplicate doctor id {}", doctor.id)));
        }
        doctors.push(doctor);
        Ok(())
    }

    pub async fn doctor(&self, doctor_id: &DoctorId) -> Option<Doctor> {
        self.doctors
            .read()
            .await
            .iter()
            .find(|doctor| &doctor.id == doctor_id)
            .cloned()
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn find_doctors_by_name(&self, fragment: &str) -> Result<Vec<Doctor>, RepositoryError> {
        let doctors = self.doctors.read().await;
        Ok(doctors
            .iter()
            .filter(|doctor| doctor.matches_name(fragment))
            .cloned()
            .collect())
    }

    async fn book_slot(
        &self,
        doctor_id: &DoctorId,
        date: NaiveDate,
        time: &str,
        patient_id: &str,
    ) -> Result<SlotUpdate, RepositoryError> {
        let mut doctors = self.doctors.write().await;
        let outcome = match doctors.iter_mut().find(|doctor| &doctor.id == doctor_id) {
            Some(doctor) => doctor.book_slot(date, time, patient_id),
            None => SlotUpdate::DoctorMissing,
        };

        debug!("In-memory booking of {} {} {} -> {:?}", doctor_id, date, time, outcome);
        Ok(outcome)
    }

    fn describe(&self) -> String {
        "in-memory schedule".to_string()
    }

    async fn shutdown(&self) {
        let doctors = self.doctors.read().await;
        let booked: usize = doctors
            .iter()
            .flat_map(|doctor| doctor.availability.iter())
            .map(|entry| entry.slots.iter().filter(|slot| slot.booked).count())
            .sum();
        info!("Closing in-memory schedule: {} doctors, {} booked slots", doctors.len(), booked);
    }
}
