use std::convert::TryFrom;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::RepositoryError;
use crate::models::{AvailabilityDocument, Doctor, DoctorDocument, DoctorId, SlotUpdate};
use crate::services::repository::ScheduleRepository;

const DOCTORS_TABLE: &str = "doctors";
const DOCTOR_COLUMNS: &str = "id,name,availability,revision";

/// Schedule storage backed by a PostgREST `doctors` table whose `availability`
/// column holds the nested entries and slots. Bookings are optimistic: a write
/// only lands if the row's `revision` is unchanged since it was read.
pub struct SupabaseScheduleRepository {
    supabase: SupabaseClient,
    max_attempts: u32,
}

impl SupabaseScheduleRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            max_attempts: config.booking_max_retries.max(1),
        }
    }

    pub async fn verify_connection(&self, timeout: Duration) -> Result<(), RepositoryError> {
        self.supabase.probe(DOCTORS_TABLE, timeout).await?;
        info!("Connected to schedule storage at {}", self.supabase.get_base_url());
        Ok(())
    }

    async fn fetch_doctor_row(&self, doctor_id: &DoctorId) -> Result<Option<DoctorDocument>, RepositoryError> {
        let path = format!(
            "/rest/v1/{}?select={}&id=eq.{}",
            DOCTORS_TABLE, DOCTOR_COLUMNS, urlencoding::encode(doctor_id.as_str())
        );
        let rows: Vec<DoctorDocument> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }

    /// Writes the new availability only if nobody else bumped the revision.
    /// Returns false when the guard did not match.
    async fn write_if_unchanged(&self, doctor: &Doctor, revision: i64) -> Result<bool, RepositoryError> {
        let path = format!(
            "/rest/v1/{}?id=eq.{}&revision=eq.{}",
            DOCTORS_TABLE, urlencoding::encode(doctor.id.as_str()), revision
        );
        let availability: Vec<AvailabilityDocument> =
            doctor.availability.iter().map(AvailabilityDocument::from).collect();

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let updated: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(json!({
                "availability": availability,
                "revision": revision + 1,
            })),
            Some(headers),
        ).await?;

        Ok(!updated.is_empty())
    }
}

#[async_trait]
impl ScheduleRepository for SupabaseScheduleRepository {
    async fn find_doctors_by_name(&self, fragment: &str) -> Result<Vec<Doctor>, RepositoryError> {
        let path = format!(
            "/rest/v1/{}?select={}&name=ilike.*{}*",
            DOCTORS_TABLE,
            DOCTOR_COLUMNS,
            urlencoding::encode(&escape_like(fragment.trim()))
        );
        let rows: Vec<DoctorDocument> = self.supabase.request(Method::GET, &path, None, None).await?;

        let mut doctors = Vec::with_capacity(rows.len());
        for row in rows {
            let doctor = Doctor::try_from(row)?;
            if doctor.matches_name(fragment) {
                doctors.push(doctor);
            }
        }
        Ok(doctors)
    }

    async fn book_slot(
        &self,
        doctor_id: &DoctorId,
        date: NaiveDate,
        time: &str,
        patient_id: &str,
    ) -> Result<SlotUpdate, RepositoryError> {
        for attempt in 1..=self.max_attempts {
            let Some(row) = self.fetch_doctor_row(doctor_id).await? else {
                return Ok(SlotUpdate::DoctorMissing);
            };
            let revision = row.revision.ok_or_else(|| {
                RepositoryError::Malformed(format!("doctor {} row has no revision", doctor_id))
            })?;

            let mut doctor = Doctor::try_from(row)?;
            let outcome = doctor.book_slot(date, time, patient_id);
            if outcome != SlotUpdate::Booked {
                return Ok(outcome);
            }

            if self.write_if_unchanged(&doctor, revision).await? {
                debug!("Booked {} {} {} at revision {}", doctor_id, date, time, revision + 1);
                return Ok(SlotUpdate::Booked);
            }

            warn!(
                "Doctor {} changed while booking {} {} (attempt {}/{}), re-reading",
                doctor_id, date, time, attempt, self.max_attempts
            );
        }

        Err(RepositoryError::Unavailable(format!(
            "schedule for doctor {} kept changing during booking, giving up after {} attempts",
            doctor_id, self.max_attempts
        )))
    }

    fn describe(&self) -> String {
        format!("postgrest schedule at {}", self.supabase.get_base_url())
    }

    async fn shutdown(&self) {
        info!("Releasing schedule storage connection to {}", self.supabase.get_base_url());
    }
}

/// Turns a name fragment into a literal `ilike` pattern. LIKE metacharacters
/// get a backslash. PostgREST rewrites every `*` to `%`, so a literal `*`
/// becomes the single-character `_` wildcard and the caller re-checks rows.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_keeps_plain_names() {
        assert_eq!(escape_like("Sharma"), "Sharma");
        assert_eq!(escape_like("Dr. A. Mehta"), "Dr. A. Mehta");
    }

    #[test]
    fn test_escape_like_quotes_wildcards() {
        assert_eq!(escape_like("_"), r"\_");
        assert_eq!(escape_like("50%"), r"50\%");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("a*b"), "a_b");
    }
}
