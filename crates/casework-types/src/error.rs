use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in casework-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat not found")]
    NotFound,

    #[error("case not found")]
    CaseNotFound,

    #[error("no agent is assigned to this case")]
    AgentNotFound,

    #[error("Case has already been submitted")]
    AlreadySubmitted,

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("language model is not configured")]
    NotConfigured,

    #[error("failed to generate response: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from the assessment pipeline.
///
/// Every variant other than `AlreadySubmitted`, `ChatNotFound` and
/// `CaseNotFound` is an upstream failure and leaves the chat untouched.
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("chat not found")]
    ChatNotFound,

    #[error("case not found")]
    CaseNotFound,

    #[error("Case has already been submitted")]
    AlreadySubmitted,

    #[error("no JSON object found in assessment response")]
    NoJson,

    #[error("invalid assessment response: {0}")]
    Schema(String),

    #[error("language model is not configured")]
    NotConfigured,

    #[error("assessment model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors related to subscription billing.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("cannot create a checkout session for another user")]
    Forbidden,

    #[error("invalid price id")]
    InvalidPrice,

    #[error("subscription not found")]
    SubscriptionNotFound,

    #[error("billing is not configured")]
    NotConfigured,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("billing provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from audio transcription.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("no audio file provided")]
    MissingFile,

    #[error("transcription is not configured")]
    NotConfigured,

    #[error("transcription provider error: {0}")]
    Provider(String),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}
