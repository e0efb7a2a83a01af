use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DirectoryError;

/// Search parameters forwarded to the external doctor directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySearch {
    pub city: Option<String>,
    pub specialty: Option<String>,
    pub name: Option<String>,
}

impl DirectorySearch {
    fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [("city", &self.city), ("specialty", &self.specialty), ("name", &self.name)]
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v))
            })
            .collect()
    }
}

/// Thin proxy over the doctor directory's search endpoint. Responses are
/// passed through untouched and failures are not retried.
#[derive(Clone)]
pub struct DirectoryClient {
    client: Client,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.directory_timeout())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.doctor_directory_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(&self, search: &DirectorySearch) -> Result<Value, DirectoryError> {
        let url = format!("{}/api/doctors/search", self.base_url);
        let params = search.query_pairs();
        debug!("Forwarding doctor search to {} with {:?}", url, params);

        let response = self.client.get(&url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Doctor directory error ({}): {}", status, body);
            return Err(DirectoryError::Status { status: status.as_u16(), body });
        }

        Ok(response.json::<Value>().await?)
    }
}
