//! Application error type mapping to HTTP status codes and envelope format.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use casework_types::error::{
    AssessmentError, BillingError, ChatError, RepositoryError, TranscriptionError,
};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Chat(ChatError),
    Assessment(AssessmentError),
    Billing(BillingError),
    Transcription(TranscriptionError),
    Repository(RepositoryError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    NotFound(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<AssessmentError> for AppError {
    fn from(e: AssessmentError) -> Self {
        AppError::Assessment(e)
    }
}

impl From<BillingError> for AppError {
    fn from(e: BillingError) -> Self {
        AppError::Billing(e)
    }
}

impl From<TranscriptionError> for AppError {
    fn from(e: TranscriptionError) -> Self {
        AppError::Transcription(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    /// Status, machine-readable code and message for the envelope.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(ChatError::NotFound) => {
                (StatusCode::NOT_FOUND, "CHAT_NOT_FOUND", "Chat not found".to_string())
            }
            AppError::Chat(ChatError::CaseNotFound) => {
                (StatusCode::NOT_FOUND, "CASE_NOT_FOUND", "Case not found".to_string())
            }
            AppError::Chat(ChatError::AgentNotFound) => {
                (StatusCode::NOT_FOUND, "AGENT_NOT_FOUND", "Agent not found".to_string())
            }
            AppError::Chat(e @ ChatError::AlreadySubmitted) => {
                (StatusCode::BAD_REQUEST, "ALREADY_SUBMITTED", e.to_string())
            }
            AppError::Chat(ChatError::InvalidStatus(msg) | ChatError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(e @ ChatError::NotConfigured) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED", e.to_string())
            }
            AppError::Chat(ChatError::Llm(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "LLM_ERROR",
                format!("Failed to generate AI response: {e}"),
            ),
            AppError::Chat(ChatError::Repository(e)) => repository_parts(e),

            AppError::Assessment(AssessmentError::ChatNotFound) => {
                (StatusCode::NOT_FOUND, "CHAT_NOT_FOUND", "Chat not found".to_string())
            }
            AppError::Assessment(AssessmentError::CaseNotFound) => {
                (StatusCode::NOT_FOUND, "CASE_NOT_FOUND", "Case not found".to_string())
            }
            AppError::Assessment(e @ AssessmentError::AlreadySubmitted) => {
                (StatusCode::BAD_REQUEST, "ALREADY_SUBMITTED", e.to_string())
            }
            AppError::Assessment(e @ AssessmentError::NotConfigured) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED", e.to_string())
            }
            AppError::Assessment(AssessmentError::Repository(e)) => repository_parts(e),
            AppError::Assessment(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ASSESSMENT_ERROR",
                format!("Failed to assess case: {e}"),
            ),

            AppError::Billing(e @ BillingError::Forbidden) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
            }
            AppError::Billing(BillingError::InvalidPrice) => {
                (StatusCode::BAD_REQUEST, "INVALID_PRICE", "Invalid price ID".to_string())
            }
            AppError::Billing(BillingError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Billing(BillingError::SubscriptionNotFound) => (
                StatusCode::NOT_FOUND,
                "SUBSCRIPTION_NOT_FOUND",
                "Subscription not found".to_string(),
            ),
            AppError::Billing(e @ BillingError::NotConfigured) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED", e.to_string())
            }
            AppError::Billing(BillingError::InvalidSignature(_) | BillingError::InvalidPayload(_)) => {
                (StatusCode::BAD_REQUEST, "WEBHOOK_ERROR", "Webhook error".to_string())
            }
            AppError::Billing(BillingError::Repository(e)) => repository_parts(e),
            AppError::Billing(e @ BillingError::Provider(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "BILLING_ERROR", e.to_string())
            }

            AppError::Transcription(e @ TranscriptionError::MissingFile) => {
                (StatusCode::BAD_REQUEST, "MISSING_FILE", e.to_string())
            }
            AppError::Transcription(e @ TranscriptionError::NotConfigured) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED", e.to_string())
            }
            AppError::Transcription(e @ TranscriptionError::Provider(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "TRANSCRIPTION_ERROR", e.to_string())
            }

            AppError::Repository(e) => repository_parts(e),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
        }
    }
}

fn repository_parts(e: &RepositoryError) -> (StatusCode, &'static str, String) {
    match e {
        RepositoryError::NotFound => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found".to_string())
        }
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        other => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", other.to_string()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            error!(code, %message, "request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": uuid::Uuid::now_v7().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casework_types::llm::LlmError;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().parts().0
    }

    #[test]
    fn test_chat_errors_map_to_status() {
        assert_eq!(status_of(ChatError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ChatError::AlreadySubmitted), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ChatError::InvalidRequest("message is required".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ChatError::NotConfigured), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(ChatError::Llm(LlmError::EmptyResponse)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_assessment_errors_map_to_status() {
        assert_eq!(status_of(AssessmentError::ChatNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AssessmentError::AlreadySubmitted), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AssessmentError::NoJson), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(AssessmentError::Schema("missing score".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_billing_errors_map_to_status() {
        assert_eq!(status_of(BillingError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_of(BillingError::InvalidPrice), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(BillingError::SubscriptionNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(BillingError::NotConfigured), StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _, message) =
            AppError::from(BillingError::InvalidSignature("signature mismatch".into())).parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Webhook error");
    }

    #[test]
    fn test_transcription_and_repository_errors_map_to_status() {
        assert_eq!(status_of(TranscriptionError::MissingFile), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(TranscriptionError::NotConfigured),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(RepositoryError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(RepositoryError::Conflict("email taken".into())),
            StatusCode::CONFLICT
        );
    }
}
