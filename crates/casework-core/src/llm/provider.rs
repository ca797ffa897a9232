//! LlmProvider trait definition.
//!
//! The single abstraction agent replies and assessments go through. Uses RPITIT
//! for `complete`; `BoxLlmProvider` erases the concrete type for runtime wiring.

use casework_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends.
///
/// Implementations live in casework-infra (e.g., `OpenAiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
