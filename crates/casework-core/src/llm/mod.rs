//! LLM provider abstraction.

pub mod box_provider;
pub mod provider;

use casework_types::config::LlmConfig;
use casework_types::llm::{CompletionRequest, Message};

/// Model parameters for one kind of generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationSettings {
    /// Settings for in-character agent replies.
    pub fn chat(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.chat_temperature,
            max_tokens: config.chat_max_tokens,
        }
    }

    /// Settings for rubric assessment (lower temperature).
    pub fn assessment(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.assessment_temperature,
            max_tokens: config.assessment_max_tokens,
        }
    }

    /// Build a single-turn request.
    pub fn request(&self, system: Option<String>, prompt: String) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            system,
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }
}
