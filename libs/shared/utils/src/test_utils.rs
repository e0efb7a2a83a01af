use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub const SHARMA_ID: &str = "665f1c2a4e3b0d4c559a610c";
pub const MEHTA_ID: &str = "665f1c2a4e3b0d4c559a6110";
pub const SCENARIO_DATE: &str = "2024-06-01";

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub doctor_directory_url: String,
    pub gemini_base_url: String,
    pub gemini_api_key: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            doctor_directory_url: "http://localhost:5000".to_string(),
            gemini_base_url: "http://localhost:5001/v1beta".to_string(),
            gemini_api_key: None,
        }
    }
}

impl TestConfig {
    /// Points every outbound HTTP collaborator at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            doctor_directory_url: uri.to_string(),
            gemini_base_url: format!("{}/v1beta", uri),
            gemini_api_key: Some("test-gemini-key".to_string()),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            doctor_directory_url: self.doctor_directory_url.clone(),
            gemini_base_url: self.gemini_base_url.clone(),
            gemini_api_key: self.gemini_api_key.clone(),
            storage_timeout_ms: 2_000,
            directory_timeout_secs: 2,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Doctor documents in the storage shape, for seeding stores and mocking rows.
pub struct ScheduleFixtures;

impl ScheduleFixtures {
    pub fn slot(time: &str, booked_by: Option<&str>) -> Value {
        match booked_by {
            Some(patient) => json!({"time": time, "isBooked": true, "bookedBy": patient}),
            None => json!({"time": time, "isBooked": false}),
        }
    }

    pub fn doctor(id: &str, name: &str, availability: Value) -> Value {
        json!({
            "_id": id,
            "name": name,
            "availability": availability
        })
    }

    /// Dr. Sharma on 2024-06-01: 10:00 free, 11:00 booked.
    pub fn sharma() -> Value {
        Self::doctor(SHARMA_ID, "Dr. Sharma", json!([
            {
                "date": SCENARIO_DATE,
                "slots": [
                    Self::slot("10:00", None),
                    Self::slot("11:00", Some("patient-7"))
                ]
            },
            {
                "date": "2024-06-02",
                "slots": [
                    Self::slot("10:00", None)
                ]
            }
        ]))
    }

    /// Fully booked on the scenario date.
    pub fn mehta() -> Value {
        Self::doctor(MEHTA_ID, "Dr. Mehta", json!([
            {
                "date": SCENARIO_DATE,
                "slots": [
                    Self::slot("09:00 AM", Some("patient-1")),
                    Self::slot("09:30 AM", Some("patient-2"))
                ]
            }
        ]))
    }

    pub fn clinic() -> Value {
        json!([Self::sharma(), Self::mehta()])
    }

    /// A storage row as PostgREST returns it, with the optimistic-lock revision.
    pub fn row(doctor: &Value, revision: i64) -> Value {
        json!({
            "id": doctor["_id"],
            "name": doctor["name"],
            "availability": doctor["availability"],
            "revision": revision
        })
    }

    pub fn random_doctor(name: &str, date: &str, times: &[&str]) -> Value {
        let slots: Vec<Value> = times.iter().map(|time| Self::slot(time, None)).collect();
        Self::doctor(&Uuid::new_v4().to_string(), name, json!([{"date": date, "slots": slots}]))
    }
}

pub struct MockDirectoryResponses;

impl MockDirectoryResponses {
    pub fn doctors(specialty: &str, city: &str) -> Value {
        json!([
            {
                "name": "Dr. ENT Specialist",
                "city": city,
                "clinicName": "Siwan ENT Clinic",
                "profileDetails": {"specialty": specialty, "experience": 10},
                "rating": 4.8,
                "numReviews": 12
            }
        ])
    }
}

pub struct MockGeminiResponses;

impl MockGeminiResponses {
    pub fn text(reply: &str) -> Value {
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": reply}]
                }
            }]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_mock_server("http://127.0.0.1:9999").to_app_config();

        assert_eq!(config.supabase_url, "http://127.0.0.1:9999");
        assert_eq!(config.gemini_base_url, "http://127.0.0.1:9999/v1beta");
        assert!(config.is_storage_configured());
        assert!(config.is_llm_configured());
    }

    #[test]
    fn test_row_carries_revision() {
        let row = ScheduleFixtures::row(&ScheduleFixtures::sharma(), 4);
        assert_eq!(row["id"], SHARMA_ID);
        assert_eq!(row["revision"], 4);
    }
}
