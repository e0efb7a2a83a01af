use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctors: Option<Value>,
}

impl ChatReply {
    pub fn text(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), doctors: None }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SymptomRequest {
    pub symptoms: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomResponse {
    pub suggestion: String,
}
