pub mod chat;
pub mod classifier;
pub mod llm;

pub use chat::ChatService;
pub use classifier::{suggest_specialty, symptom_advice, ChatIntent, IntentClassifier};
pub use llm::{GeminiClient, LanguageModel};
