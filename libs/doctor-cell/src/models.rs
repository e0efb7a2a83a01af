use std::collections::HashSet;
use std::convert::TryFrom;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Opaque patient reference, stored exactly as received.
pub type PatientId = String;

/// Storage-assigned doctor identity. Kept opaque so Mongo ObjectIds, UUIDs and
/// row keys all load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(String);

impl DoctorId {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DoctorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub time: String,
    pub booked: bool,
    pub booked_by: Option<PatientId>,
}

impl Slot {
    pub fn free(time: &str) -> Self {
        Self { time: time.to_string(), booked: false, booked_by: None }
    }

    pub fn status(&self) -> SlotStatus {
        if self.booked {
            SlotStatus::AlreadyBooked
        } else {
            SlotStatus::Available
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

impl AvailabilityEntry {
    pub fn slot(&self, time: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.time == time)
    }

    /// Unbooked time labels in stored order.
    pub fn free_times(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|slot| !slot.booked)
            .map(|slot| slot.time.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub availability: Vec<AvailabilityEntry>,
}

impl Doctor {
    pub fn matches_name(&self, fragment: &str) -> bool {
        self.name.to_lowercase().contains(&fragment.trim().to_lowercase())
    }

    pub fn entry(&self, date: NaiveDate) -> Option<&AvailabilityEntry> {
        self.availability.iter().find(|entry| entry.date == date)
    }

    /// Flips exactly the slot at (date, time) from free to booked.
    /// Leaves the document untouched unless the outcome is `Booked`.
    pub fn book_slot(&mut self, date: NaiveDate, time: &str, patient_id: &str) -> SlotUpdate {
        let Some(entry) = self.availability.iter_mut().find(|entry| entry.date == date) else {
            return SlotUpdate::DateMissing;
        };
        let Some(slot) = entry.slots.iter_mut().find(|slot| slot.time == time) else {
            return SlotUpdate::SlotMissing;
        };
        if slot.booked {
            return SlotUpdate::AlreadyBooked;
        }

        slot.booked = true;
        slot.booked_by = Some(patient_id.to_string());
        SlotUpdate::Booked
    }
}

/// Outcome of a conditional slot update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotUpdate {
    Booked,
    AlreadyBooked,
    DoctorMissing,
    DateMissing,
    SlotMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    AlreadyBooked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Availability {
    FreeSlots { available_slots: Vec<String> },
    Slot { time: String, status: SlotStatus },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub doctor_id: DoctorId,
    pub doctor_name: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub availability: Availability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub doctor_id: DoctorId,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub patient_id: PatientId,
}

impl BookingConfirmation {
    pub fn message(&self) -> String {
        format!(
            "Success! Your appointment with {} on {} at {} is confirmed.",
            self.doctor_name, self.date, self.time
        )
    }
}

// ==============================================================================
// STORAGE DOCUMENT SHAPE
// ==============================================================================

/// Doctor document as it sits in storage. Every field is optional here so that
/// missing data is reported by `TryFrom` instead of failing deserialization
/// with an opaque serde message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDocument {
    #[serde(alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<AvailabilityDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityDocument {
    pub date: Option<String>,
    pub slots: Option<Vec<SlotDocument>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDocument {
    pub time: Option<String>,
    pub is_booked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_by: Option<String>,
}

impl TryFrom<DoctorDocument> for Doctor {
    type Error = RepositoryError;

    fn try_from(doc: DoctorDocument) -> Result<Self, Self::Error> {
        let id = doc
            .id
            .and_then(DoctorId::new)
            .ok_or_else(|| malformed("doctor document has no id"))?;

        let name = doc
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| malformed(format!("doctor {} has no name", id)))?;

        let entries = doc
            .availability
            .ok_or_else(|| malformed(format!("doctor {} has no availability list", id)))?;

        let mut seen_dates = HashSet::new();
        let mut availability = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = AvailabilityEntry::try_from(entry)
                .map_err(|e| malformed(format!("doctor {}: {}", id, detail(e))))?;
            if !seen_dates.insert(entry.date) {
                return Err(malformed(format!("doctor {} lists {} more than once", id, entry.date)));
            }
            availability.push(entry);
        }

        Ok(Doctor { id, name: name.trim().to_string(), availability })
    }
}

impl TryFrom<AvailabilityDocument> for AvailabilityEntry {
    type Error = RepositoryError;

    fn try_from(doc: AvailabilityDocument) -> Result<Self, Self::Error> {
        let raw_date = doc.date.ok_or_else(|| malformed("availability entry has no date"))?;
        let date = parse_date(&raw_date).map_err(malformed)?;

        let slot_docs = doc
            .slots
            .ok_or_else(|| malformed(format!("entry {} has no slots list", date)))?;

        let mut seen_times = HashSet::new();
        let mut slots = Vec::with_capacity(slot_docs.len());
        for slot_doc in slot_docs {
            let slot = Slot::try_from(slot_doc)
                .map_err(|e| malformed(format!("entry {}: {}", date, detail(e))))?;
            if !seen_times.insert(slot.time.clone()) {
                return Err(malformed(format!("entry {} lists slot {} more than once", date, slot.time)));
            }
            slots.push(slot);
        }

        Ok(AvailabilityEntry { date, slots })
    }
}

impl TryFrom<SlotDocument> for Slot {
    type Error = RepositoryError;

    fn try_from(doc: SlotDocument) -> Result<Self, Self::Error> {
        let raw_time = doc.time.ok_or_else(|| malformed("slot has no time"))?;
        let time = parse_time_label(&raw_time).map_err(malformed)?;
        let booked = doc
            .is_booked
            .ok_or_else(|| malformed(format!("slot {} has no isBooked flag", time)))?;

        let booked_by = doc.booked_by.filter(|patient| !patient.trim().is_empty());
        if booked != booked_by.is_some() {
            return Err(malformed(format!(
                "slot {} has isBooked={} but bookedBy is {}",
                time,
                booked,
                if booked_by.is_some() { "set" } else { "missing" }
            )));
        }

        Ok(Slot { time, booked, booked_by })
    }
}

impl From<&Slot> for SlotDocument {
    fn from(slot: &Slot) -> Self {
        Self {
            time: Some(slot.time.clone()),
            is_booked: Some(slot.booked),
            booked_by: slot.booked_by.clone(),
        }
    }
}

impl From<&AvailabilityEntry> for AvailabilityDocument {
    fn from(entry: &AvailabilityEntry) -> Self {
        Self {
            date: Some(entry.date.format(DATE_FORMAT).to_string()),
            slots: Some(entry.slots.iter().map(SlotDocument::from).collect()),
        }
    }
}

impl From<&Doctor> for DoctorDocument {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: Some(doctor.id.to_string()),
            name: Some(doctor.name.clone()),
            availability: Some(doctor.availability.iter().map(AvailabilityDocument::from).collect()),
            revision: None,
        }
    }
}

// ==============================================================================
// INPUT PARSING
// ==============================================================================

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("date '{}' is not in YYYY-MM-DD format", raw.trim()))
}

/// Accepts `HH:MM` (24h) and `HH:MM AM|PM` labels. The trimmed label is kept
/// verbatim because slots are matched by label, not by clock value.
pub fn parse_time_label(raw: &str) -> Result<String, String> {
    let label = raw.trim();
    let is_clock_time = NaiveTime::parse_from_str(label, "%H:%M").is_ok()
        || NaiveTime::parse_from_str(label, "%I:%M %p").is_ok();

    if is_clock_time {
        Ok(label.to_string())
    } else {
        Err(format!("time '{}' is not a valid time such as 10:00 or 09:00 AM", label))
    }
}

fn malformed(message: impl Into<String>) -> RepositoryError {
    RepositoryError::Malformed(message.into())
}

fn detail(err: RepositoryError) -> String {
    match err {
        RepositoryError::Malformed(msg)
        | RepositoryError::Unavailable(msg)
        | RepositoryError::Rejected(msg) => msg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: serde_json::Value) -> DoctorDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_document_converts_with_mongo_object_id() {
        let doc = document(json!({
            "_id": "665f1c2a4e3b0d4c559a610c",
            "name": "Dr. Sharma",
            "availability": [{
                "date": "2024-06-01",
                "slots": [
                    {"time": "10:00", "isBooked": false},
                    {"time": "11:00", "isBooked": true, "bookedBy": "patient-7"}
                ]
            }]
        }));

        let doctor = Doctor::try_from(doc).unwrap();
        let entry = doctor.entry(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).unwrap();

        assert_eq!(doctor.id.as_str(), "665f1c2a4e3b0d4c559a610c");
        assert_eq!(doctor.name, "Dr. Sharma");
        assert_eq!(entry.free_times(), vec!["10:00".to_string()]);
        assert_eq!(entry.slot("11:00").unwrap().booked_by.as_deref(), Some("patient-7"));
    }

    #[test]
    fn test_blank_id_is_rejected() {
        let doc = document(json!({
            "id": "   ",
            "name": "Dr. Sharma",
            "availability": []
        }));

        let err = Doctor::try_from(doc).unwrap_err();
        assert!(err.to_string().contains("no id"));
    }

    #[test]
    fn test_doctor_id_serializes_as_plain_string() {
        let id = DoctorId::new(" 665f1c2a4e3b0d4c559a610c ").unwrap();

        assert_eq!(serde_json::to_value(&id).unwrap(), json!("665f1c2a4e3b0d4c559a610c"));
        assert_eq!(DoctorId::new(""), None);
    }

    #[test]
    fn test_missing_slots_list_is_rejected() {
        let doc = document(json!({
            "id": "665f1c2a4e3b0d4c559a610c",
            "name": "Dr. Sharma",
            "availability": [{"date": "2024-06-01"}]
        }));

        let err = Doctor::try_from(doc).unwrap_err();
        assert!(err.to_string().contains("no slots list"));
    }

    #[test]
    fn test_booked_flag_must_agree_with_booked_by() {
        let doc = document(json!({
            "id": "665f1c2a4e3b0d4c559a610c",
            "name": "Dr. Sharma",
            "availability": [{
                "date": "2024-06-01",
                "slots": [{"time": "10:00", "isBooked": true}]
            }]
        }));

        assert!(Doctor::try_from(doc).is_err());
    }

    #[test]
    fn test_duplicate_dates_are_rejected() {
        let doc = document(json!({
            "id": "665f1c2a4e3b0d4c559a610c",
            "name": "Dr. Sharma",
            "availability": [
                {"date": "2024-06-01", "slots": []},
                {"date": "2024-06-01", "slots": []}
            ]
        }));

        let err = Doctor::try_from(doc).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_book_slot_only_touches_matching_slot() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let other = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let mut doctor = Doctor {
            id: DoctorId::new("665f1c2a4e3b0d4c559a610d").unwrap(),
            name: "Dr. Sharma".to_string(),
            availability: vec![
                AvailabilityEntry { date, slots: vec![Slot::free("10:00"), Slot::free("11:00")] },
                AvailabilityEntry { date: other, slots: vec![Slot::free("10:00")] },
            ],
        };

        assert_eq!(doctor.book_slot(date, "10:00", "patient-42"), SlotUpdate::Booked);
        assert_eq!(doctor.book_slot(date, "10:00", "patient-99"), SlotUpdate::AlreadyBooked);
        assert_eq!(doctor.book_slot(date, "12:00", "patient-99"), SlotUpdate::SlotMissing);
        assert_eq!(doctor.book_slot(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(), "10:00", "p"), SlotUpdate::DateMissing);

        assert_eq!(doctor.entry(date).unwrap().slot("10:00").unwrap().booked_by.as_deref(), Some("patient-42"));
        assert!(!doctor.entry(date).unwrap().slot("11:00").unwrap().booked);
        assert!(!doctor.entry(other).unwrap().slot("10:00").unwrap().booked);
    }

    #[test]
    fn test_time_labels() {
        assert_eq!(parse_time_label(" 10:00 ").unwrap(), "10:00");
        assert_eq!(parse_time_label("09:00 AM").unwrap(), "09:00 AM");
        assert!(parse_time_label("25:00").is_err());
        assert!(parse_time_label("ten o'clock").is_err());
    }

    #[test]
    fn test_round_trip_through_document_keeps_bookings() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut doctor = Doctor {
            id: DoctorId::new("665f1c2a4e3b0d4c559a610d").unwrap(),
            name: "Dr. Sharma".to_string(),
            availability: vec![AvailabilityEntry { date, slots: vec![Slot::free("10:00")] }],
        };
        doctor.book_slot(date, "10:00", "patient-42");

        let restored = Doctor::try_from(DoctorDocument::from(&doctor)).unwrap();
        assert_eq!(restored, doctor);
    }
}
