//! Chat service: the case-study conversation lifecycle.
//!
//! A chat moves `created -> in progress` on the first learner message and is
//! closed by submission. Closed chats accept no more messages; the learner
//! archives them to start a fresh attempt at the same case.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use casework_types::case::{AgentId, CaseId};
use casework_types::chat::{
    CaseStatusEntry, Chat, ChatDetail, ChatId, ChatMessage, ChatStatus, ChatStatusSummary,
    CreateChatRequest, MessageKind, NewChat,
};
use casework_types::error::{ChatError, RepositoryError};
use casework_types::user::UserId;

use crate::llm::GenerationSettings;
use crate::llm::provider::LlmProvider;
use crate::prompt;
use crate::repository::case::CaseRepository;
use crate::repository::chat::ChatRepository;

/// Orchestrates chat creation, message logging and agent replies.
///
/// Generic over the repositories and the LLM provider so the crate never
/// depends on casework-infra. The provider is optional: without one, agent
/// replies fail with `ChatError::NotConfigured` and everything else works.
pub struct ChatService<C: ChatRepository, K: CaseRepository, P: LlmProvider> {
    chats: C,
    cases: K,
    llm: Option<Arc<P>>,
    settings: GenerationSettings,
}

impl<C: ChatRepository, K: CaseRepository, P: LlmProvider> ChatService<C, K, P> {
    pub fn new(chats: C, cases: K, llm: Option<Arc<P>>, settings: GenerationSettings) -> Self {
        Self {
            chats,
            cases,
            llm,
            settings,
        }
    }

    /// Start an attempt at a case, or return the one already open.
    ///
    /// Idempotent: while the learner has a non-archived chat for the case,
    /// that chat is returned unchanged.
    pub async fn create(
        &self,
        user_id: &UserId,
        request: CreateChatRequest,
    ) -> Result<Chat, ChatError> {
        let (Some(case_id), Some(agent_id)) = (request.case_id, request.agent_id) else {
            return Err(ChatError::InvalidRequest(
                "case_id and agent_id are required".to_string(),
            ));
        };
        let case_id = CaseId::from_uuid(case_id);

        if self.cases.get(&case_id).await?.is_none() {
            return Err(ChatError::CaseNotFound);
        }

        if let Some(existing) = self.chats.find_unarchived(user_id, &case_id).await? {
            debug!(chat_id = %existing.id, %case_id, "returning existing chat");
            return Ok(existing);
        }

        let chat = self
            .chats
            .create(&NewChat {
                user_id: *user_id,
                case_id,
                agent_id: Some(AgentId::from_uuid(agent_id)),
                created_at: Utc::now(),
            })
            .await?;

        info!(chat_id = %chat.id, %case_id, %user_id, "chat created");
        Ok(chat)
    }

    /// Get one of the caller's chats.
    pub async fn get(&self, user_id: &UserId, id: ChatId) -> Result<Chat, ChatError> {
        self.chats
            .get_for_user(id, user_id)
            .await?
            .ok_or(ChatError::NotFound)
    }

    /// The caller's current chat for a case, joined with the case and agent.
    pub async fn current_for_case(
        &self,
        user_id: &UserId,
        case_id: &CaseId,
    ) -> Result<Option<ChatDetail>, ChatError> {
        let Some(chat) = self.chats.find_unarchived(user_id, case_id).await? else {
            return Ok(None);
        };

        let case = self.cases.get(&chat.case_id).await?;
        let agent_id = chat
            .agent_id
            .or_else(|| case.as_ref().and_then(|c| c.agent_id));
        let agent = match agent_id {
            Some(id) => self.cases.get_agent(&id).await?,
            None => None,
        };

        Ok(Some(ChatDetail { chat, case, agent }))
    }

    /// Every attempt the caller made at a case, newest first.
    pub async fn history(&self, user_id: &UserId, case_id: &CaseId) -> Result<Vec<Chat>, ChatError> {
        Ok(self.chats.list_for_case(user_id, case_id).await?)
    }

    /// Which attempt to show for a case, plus history counters.
    ///
    /// The active chat is the newest non-archived one. Without one, the newest
    /// archived chat that reached a terminal status is shown instead.
    pub async fn check_status(
        &self,
        user_id: &UserId,
        case_id: &CaseId,
    ) -> Result<ChatStatusSummary, ChatError> {
        let chats = self.chats.list_for_case(user_id, case_id).await?;

        let has_history = !chats.is_empty();
        let has_completed_history = chats.iter().any(|c| c.is_archived);
        let total_chats = chats.len();

        let active_chat = chats
            .iter()
            .find(|c| !c.is_archived)
            .or_else(|| {
                chats
                    .iter()
                    .find(|c| c.is_archived && c.status.is_terminal())
            })
            .cloned();

        Ok(ChatStatusSummary {
            active_chat,
            has_history,
            has_completed_history,
            total_chats,
        })
    }

    /// The status to show for every case the caller has attempted.
    ///
    /// Per case: the newest chat still in progress, otherwise the newest chat.
    pub async fn case_statuses(
        &self,
        user_id: &UserId,
    ) -> Result<BTreeMap<String, CaseStatusEntry>, ChatError> {
        let chats = self.chats.list_for_user(user_id).await?;

        let mut by_case: BTreeMap<String, Vec<&Chat>> = BTreeMap::new();
        for chat in &chats {
            by_case.entry(chat.case_id.to_string()).or_default().push(chat);
        }

        Ok(by_case
            .into_iter()
            .filter_map(|(case_id, case_chats)| {
                let chosen = case_chats
                    .iter()
                    .find(|c| matches!(c.status, ChatStatus::Created | ChatStatus::InProgress))
                    .or_else(|| case_chats.first())?;
                Some((
                    case_id,
                    CaseStatusEntry {
                        status: chosen.status,
                        chat_id: chosen.id,
                    },
                ))
            })
            .collect())
    }

    /// Append a message to an open chat.
    ///
    /// The first learner message moves the chat from `created` to
    /// `in progress`. Closed chats reject the message untouched.
    pub async fn append_message(
        &self,
        user_id: &UserId,
        id: ChatId,
        text: &str,
        kind: MessageKind,
    ) -> Result<Chat, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::InvalidRequest("message is required".to_string()));
        }

        let chat = self.get(user_id, id).await?;
        if chat.status.is_terminal() {
            return Err(ChatError::AlreadySubmitted);
        }

        let status = if chat.status == ChatStatus::Created && kind == MessageKind::User {
            ChatStatus::InProgress
        } else {
            chat.status
        };

        let message = ChatMessage::now(kind, text);
        self.write_message(id, &message, status).await?;

        debug!(chat_id = %id, kind = %kind, %status, "message appended");
        self.get(user_id, id).await
    }

    /// Generate the agent's in-character reply and append it to the chat.
    ///
    /// One model call with the persona prompt; no retries.
    pub async fn generate_reply(
        &self,
        user_id: &UserId,
        id: ChatId,
        user_message: &str,
    ) -> Result<String, ChatError> {
        if user_message.is_empty() {
            return Err(ChatError::InvalidRequest("userMessage is required".to_string()));
        }
        let llm = self.llm.as_ref().ok_or(ChatError::NotConfigured)?;

        let chat = self.get(user_id, id).await?;
        if chat.status.is_terminal() {
            return Err(ChatError::AlreadySubmitted);
        }

        let case = self
            .cases
            .get(&chat.case_id)
            .await?
            .ok_or(ChatError::CaseNotFound)?;
        let agent_id = chat
            .agent_id
            .or(case.agent_id)
            .ok_or(ChatError::AgentNotFound)?;
        let agent = self
            .cases
            .get_agent(&agent_id)
            .await?
            .ok_or(ChatError::AgentNotFound)?;

        let system = prompt::chat_system_prompt(&agent, &case, &chat.messages);
        let request = self
            .settings
            .request(Some(system), format!("User: {user_message}"));

        let response = llm.complete(&request).await?;
        info!(
            chat_id = %id,
            provider = llm.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "agent reply generated"
        );

        let message = ChatMessage::now(MessageKind::Agent, response.content.clone());
        self.write_message(id, &message, chat.status).await?;

        Ok(response.content)
    }

    /// Set a status by hand. Only `created`, `in progress` and `submitted`
    /// are accepted, and a chat that is already closed stays closed.
    pub async fn set_status(
        &self,
        user_id: &UserId,
        id: ChatId,
        status: &str,
    ) -> Result<Chat, ChatError> {
        let status: ChatStatus = status
            .parse()
            .ok()
            .filter(ChatStatus::is_manual)
            .ok_or_else(|| {
                ChatError::InvalidStatus(
                    "Must be one of: created, in progress, submitted".to_string(),
                )
            })?;

        let chat = self.get(user_id, id).await?;
        if chat.status.is_terminal() && chat.status != status {
            return Err(ChatError::AlreadySubmitted);
        }

        match self.chats.set_status(id, status).await {
            Ok(()) => {}
            // Closed by a submission after our read.
            Err(RepositoryError::NotFound) => return Err(ChatError::AlreadySubmitted),
            Err(e) => return Err(e.into()),
        }
        info!(chat_id = %id, from = %chat.status, to = %status, "chat status changed");
        self.get(user_id, id).await
    }

    /// Archive a chat so the learner can start over.
    pub async fn archive(&self, user_id: &UserId, id: ChatId) -> Result<Chat, ChatError> {
        let chat = self.get(user_id, id).await?;
        if !chat.is_archived {
            self.chats.archive(id).await?;
            info!(chat_id = %id, "chat archived");
        }
        self.get(user_id, id).await
    }

    async fn write_message(
        &self,
        id: ChatId,
        message: &ChatMessage,
        status: ChatStatus,
    ) -> Result<(), ChatError> {
        match self.chats.append_message(id, message, status).await {
            Ok(()) => Ok(()),
            // The chat was closed between our read and the write.
            Err(RepositoryError::NotFound) => Err(ChatError::AlreadySubmitted),
            Err(e) => Err(e.into()),
        }
    }
}
