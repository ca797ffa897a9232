//! Chat handlers: lookup, creation, messages, replies, status and submission.
//!
//! Every handler is scoped to the authenticated caller; another user's chat
//! is reported as not found.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use casework_types::assessment::{AssessmentResult, SubmitCaseRequest};
use casework_types::chat::{
    CaseStatusEntry, Chat, ChatDetail, ChatId, ChatStatusSummary, CreateChatRequest, MessageKind,
};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::json::ApiJson;
use crate::http::extractors::query::CaseQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponseRequest {
    #[serde(default)]
    pub user_message: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedReply {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

/// GET /api/v1/chat?case_id= - The caller's current chat for a case, or null.
///
/// Without a `case_id` there is nothing to look up, so the answer is null too.
pub async fn current_chat(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Query(query): Query<CaseQuery>,
) -> Result<Json<ApiResponse<Option<ChatDetail>>>, AppError> {
    let start = Instant::now();
    if query.is_missing() {
        return Ok(Json(ApiResponse::success(None, start)));
    }
    let case_id = query.case_id()?;
    let chat = state.chat_service.current_for_case(&user.id, &case_id).await?;
    Ok(Json(ApiResponse::success(chat, start)))
}

/// POST /api/v1/chats - Start (or resume) a chat for a case.
pub async fn create_chat(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiJson(body): ApiJson<CreateChatRequest>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let chat = state.chat_service.create(&user.id, body).await?;
    let link = format!("/api/v1/chats/{}/messages", chat.id);
    Ok(Json(ApiResponse::success(chat, start).with_link("messages", link)))
}

/// GET /api/v1/chats/case-history?case_id= - Every attempt at a case, newest first.
pub async fn case_history(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Query(query): Query<CaseQuery>,
) -> Result<Json<ApiResponse<Vec<Chat>>>, AppError> {
    let start = Instant::now();
    let case_id = query.case_id()?;
    let chats = state.chat_service.history(&user.id, &case_id).await?;
    Ok(Json(ApiResponse::success(chats, start)))
}

/// GET /api/v1/chats/check-status?case_id= - Active chat and history flags.
pub async fn check_status(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Query(query): Query<CaseQuery>,
) -> Result<Json<ApiResponse<ChatStatusSummary>>, AppError> {
    let start = Instant::now();
    let case_id = query.case_id()?;
    let summary = state.chat_service.check_status(&user.id, &case_id).await?;
    Ok(Json(ApiResponse::success(summary, start)))
}

/// GET /api/v1/user-case-statuses - Status shown per case on the dashboard.
pub async fn user_case_statuses(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
) -> Result<Json<ApiResponse<BTreeMap<String, CaseStatusEntry>>>, AppError> {
    let start = Instant::now();
    let statuses = state.chat_service.case_statuses(&user.id).await?;
    Ok(Json(ApiResponse::success(statuses, start)))
}

/// POST /api/v1/chats/{id}/messages - Append a message.
pub async fn append_message(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<ChatId>,
    ApiJson(body): ApiJson<AppendMessageRequest>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let (Some(message), Some(kind)) = (body.message, body.kind) else {
        return Err(AppError::Validation("message and type are required".to_string()));
    };
    let kind: MessageKind = kind.parse().map_err(AppError::Validation)?;

    let chat = state
        .chat_service
        .append_message(&user.id, id, &message, kind)
        .await?;
    Ok(Json(ApiResponse::success(chat, start)))
}

/// POST /api/v1/chats/{id}/generate-response - Agent reply via the language model.
pub async fn generate_response(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<ChatId>,
    ApiJson(body): ApiJson<GenerateResponseRequest>,
) -> Result<Json<ApiResponse<GeneratedReply>>, AppError> {
    let start = Instant::now();
    let message = state
        .chat_service
        .generate_reply(&user.id, id, &body.user_message)
        .await?;
    Ok(Json(ApiResponse::success(
        GeneratedReply {
            success: true,
            message,
        },
        start,
    )))
}

/// PATCH /api/v1/chats/{id}/status - Manual status change.
pub async fn update_status(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<ChatId>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let status = body
        .status
        .ok_or_else(|| AppError::Validation("status is required".to_string()))?;
    let chat = state
        .chat_service
        .set_status(&user.id, id, &status)
        .await?;
    Ok(Json(ApiResponse::success(chat, start)))
}

/// POST /api/v1/chats/{id}/archive - Archive a chat so a new attempt can start.
pub async fn archive_chat(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<ChatId>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let chat = state.chat_service.archive(&user.id, id).await?;
    Ok(Json(ApiResponse::success(chat, start)))
}

/// POST /api/v1/chats/{id}/submit-case - Assess the transcript and close the chat.
pub async fn submit_case(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<ChatId>,
    body: Option<ApiJson<SubmitCaseRequest>>,
) -> Result<Json<ApiResponse<AssessmentResult>>, AppError> {
    let start = Instant::now();
    let request = body.map(|ApiJson(b)| b).unwrap_or_default();
    let result = state
        .assessment_service
        .submit(&user.id, id, request.final_reflection.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(result, start)))
}
