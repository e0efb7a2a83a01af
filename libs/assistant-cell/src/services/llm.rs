use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::AssistantError;

/// Text generation seam used when a chat message matches no keyword rule.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError>;
}

pub fn build_prompt(message: &str) -> String {
    format!(
        "You are a helpful health assistant. Your job is to help users find doctors.\n\n\
         If the user mentions a symptom like 'fever', 'headache', 'cold', 'stomach pain', \
         infer that they need a 'General Physician'.\n\n\
         User's message: '{}'\n\n\
         Give a short helpful reply or suggest a doctor type they should search.",
        message
    )
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }
}

/// Client for the Generative Language `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// `None` when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let api_key = config.gemini_api_key.clone()?;

        Some(Self {
            client: Client::new(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!("Calling language model {}", self.model);

        let response = self.client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{"text": prompt}]
                }]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Language model error ({}): {}", status, body);
            return Err(AssistantError::Status { status: status.as_u16(), body });
        }

        let data: GenerateContentResponse = response.json().await?;
        Ok(data.first_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_wraps_message() {
        let prompt = build_prompt("my back hurts");

        assert!(prompt.starts_with("You are a helpful health assistant."));
        assert!(prompt.contains("User's message: 'my back hurts'"));
    }

    #[test]
    fn test_missing_candidates_yield_empty_text() {
        let data: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(data.first_text(), "");

        let data: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "  See a GP.\n"}]}}]
        }))
        .unwrap();
        assert_eq!(data.first_text(), "See a GP.");
    }

    #[test]
    fn test_client_requires_api_key() {
        assert!(GeminiClient::from_config(&AppConfig::default()).is_none());
    }
}
