use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use doctor_cell::services::{DirectoryClient, DirectorySearch};
use shared_config::AppConfig;

use crate::error::AssistantError;
use crate::models::ChatReply;
use crate::services::classifier::{ChatIntent, IntentClassifier};
use crate::services::llm::{build_prompt, GeminiClient, LanguageModel};

pub const MISSING_API_KEY: &str = "Gemma API key missing. Set GEMINI_API_KEY in your environment.";
pub const NOT_UNDERSTOOD: &str = "Sorry, I couldn't understand your request.";

/// Routes a chat message to the directory, the symptom table or the language model.
pub struct ChatService {
    classifier: IntentClassifier,
    directory: DirectoryClient,
    model: Option<Arc<dyn LanguageModel>>,
}

impl ChatService {
    pub fn new(config: &AppConfig) -> Self {
        let model = GeminiClient::from_config(config)
            .map(|client| Arc::new(client) as Arc<dyn LanguageModel>);
        if model.is_none() {
            warn!("GEMINI_API_KEY not set, chat fallback will report a missing key");
        }

        Self::with_model(DirectoryClient::new(config), model)
    }

    pub fn with_model(directory: DirectoryClient, model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            directory,
            model,
        }
    }

    pub async fn respond(&self, message: &str) -> Result<ChatReply, AssistantError> {
        if message.trim().is_empty() {
            return Err(AssistantError::Validation("message is required".to_string()));
        }

        let intent = self.classifier.classify(message);
        debug!("Chat intent: {:?}", intent);

        let reply = match intent {
            ChatIntent::DoctorLookup { city, specialty } => self.lookup(city, specialty).await,
            ChatIntent::SymptomAdvice { specialty } => {
                ChatReply::text(format!("You may need to consult a {}.", specialty))
            }
            ChatIntent::Fallback => self.fallback(message).await,
        };

        Ok(reply)
    }

    async fn lookup(&self, city: Option<String>, specialty: Option<&'static str>) -> ChatReply {
        let search = DirectorySearch {
            city: city.clone(),
            specialty: specialty.map(str::to_string),
            name: None,
        };
        let location = city.map(|c| format!(" in {}", c)).unwrap_or_default();

        match self.directory.search(&search).await {
            Ok(doctors) if has_results(&doctors) => ChatReply {
                answer: format!("Here are some {}{}:", specialty.unwrap_or("doctors"), location),
                doctors: Some(doctors),
            },
            Ok(_) => ChatReply::text(format!(
                "No doctors found for {}{}.",
                specialty.unwrap_or("your query"),
                location
            )),
            Err(e) => {
                warn!("Doctor lookup from chat failed: {}", e);
                ChatReply::text(format!("Error finding doctors: {}", e))
            }
        }
    }

    async fn fallback(&self, message: &str) -> ChatReply {
        let Some(model) = &self.model else {
            return ChatReply::text(MISSING_API_KEY);
        };

        match model.generate(&build_prompt(message)).await {
            Ok(text) if text.trim().is_empty() => ChatReply::text(NOT_UNDERSTOOD),
            Ok(text) => ChatReply::text(text.trim()),
            Err(e) => {
                warn!("Language model fallback failed: {}", e);
                ChatReply::text(format!("Error: {}", e))
            }
        }
    }
}

fn has_results(doctors: &Value) -> bool {
    match doctors {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
    }
}
