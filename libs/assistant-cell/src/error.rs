use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("{0}")]
    Validation(String),

    #[error("Language model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Language model returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Validation(msg) => AppError::ValidationError(msg),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}
