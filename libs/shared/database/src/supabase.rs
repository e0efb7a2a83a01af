use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Storage API error ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid header value: {0}")]
    Header(String),

    #[error("Unexpected storage response body: {0}")]
    Decode(String),
}

impl DatabaseError {
    /// Server-side and transport failures are worth retrying; client errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            DatabaseError::Transport(_) => true,
            DatabaseError::Status { status, .. } => status.is_server_error(),
            DatabaseError::Header(_) | DatabaseError::Decode(_) => false,
        }
    }
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.storage_timeout())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key).map_err(|e| DatabaseError::Header(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let bearer = auth_token.unwrap_or(&self.anon_key);
        if !bearer.is_empty() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", bearer))
                    .map_err(|e| DatabaseError::Header(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage API error ({}): {}", status, error_text);
            return Err(DatabaseError::Status { status, body: error_text });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| DatabaseError::Decode(e.to_string()))
    }

    /// Cheap reachability check used once at startup.
    pub async fn probe(&self, table: &str, timeout: Duration) -> Result<(), DatabaseError> {
        let path = format!("/rest/v1/{}?select=id&limit=1", table);
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url)
            .headers(self.get_headers(None)?)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DatabaseError::Status { status, body });
        }

        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
