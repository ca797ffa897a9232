//! Chat repository trait definition.

use casework_types::case::CaseId;
use casework_types::chat::{Chat, ChatId, ChatMessage, ChatStatus, NewChat};
use casework_types::error::RepositoryError;
use casework_types::user::UserId;

/// Everything written to a chat when its assessment completes.
#[derive(Debug, Clone)]
pub struct AssessmentUpdate {
    pub status: ChatStatus,
    /// Clamped percentage.
    pub score: f64,
    /// The structured assessment, stored as-is.
    pub learning_outcomes: serde_json::Value,
    /// Markdown summary appended to the message log.
    pub summary: ChatMessage,
}

/// Repository trait for chat persistence.
///
/// Implementations live in casework-infra (e.g., SqliteChatRepository).
/// Every lookup is scoped to the owning user so one learner can never read or
/// mutate another learner's chat.
pub trait ChatRepository: Send + Sync {
    /// Insert a new chat in `created` status with an empty message log.
    fn create(
        &self,
        chat: &NewChat,
    ) -> impl std::future::Future<Output = Result<Chat, RepositoryError>> + Send;

    /// Get a chat by id, only if it belongs to `user_id`.
    fn get_for_user(
        &self,
        id: ChatId,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// The newest non-archived chat for (user, case), if any.
    fn find_unarchived(
        &self,
        user_id: &UserId,
        case_id: &CaseId,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// All chats for (user, case), newest first.
    fn list_for_case(
        &self,
        user_id: &UserId,
        case_id: &CaseId,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// All chats of a user across cases, newest first.
    fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// Append one message to the end of the log and set `status`.
    ///
    /// Only applies while the chat is open (not terminal); returns
    /// `RepositoryError::NotFound` when no open chat with this id exists.
    fn append_message(
        &self,
        id: ChatId,
        message: &ChatMessage,
        status: ChatStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite the status of an open chat.
    ///
    /// A closed chat only accepts its own status again; any other change
    /// touches no row and reports [`RepositoryError::NotFound`].
    fn set_status(
        &self,
        id: ChatId,
        status: ChatStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist an assessment in a single write.
    ///
    /// Same open-chat guard as [`ChatRepository::append_message`], so two
    /// racing submissions cannot both land.
    fn record_assessment(
        &self,
        id: ChatId,
        update: &AssessmentUpdate,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Mark a chat archived.
    fn archive(
        &self,
        id: ChatId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
