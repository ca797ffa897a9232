//! Chat types for case-study conversations.
//!
//! A chat is a single attempt by a user at a case: an append-only message log
//! plus a status that walks `created -> in progress -> <terminal>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::case::{Agent, AgentId, Case, CaseId};
use crate::user::UserId;

/// Database identifier of a chat (SQLite `INTEGER PRIMARY KEY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Lifecycle status of a chat.
///
/// `Submitted`, `Passed`, `CanBeImproved` and `NotPassed` are terminal: a chat
/// in one of these states accepts no further messages or submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatStatus {
    #[default]
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "passed")]
    Passed,
    #[serde(rename = "can_be_improved")]
    CanBeImproved,
    #[serde(rename = "not_passed")]
    NotPassed,
}

impl ChatStatus {
    /// Statuses a client may set directly via the status endpoint.
    pub const MANUAL: [ChatStatus; 3] = [
        ChatStatus::Created,
        ChatStatus::InProgress,
        ChatStatus::Submitted,
    ];

    /// Whether the chat has been handed in (no more messages or submissions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatStatus::Submitted
                | ChatStatus::Passed
                | ChatStatus::CanBeImproved
                | ChatStatus::NotPassed
        )
    }

    /// Whether the learner is still working on the chat.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether a client may set this status directly.
    pub fn is_manual(&self) -> bool {
        Self::MANUAL.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Created => "created",
            ChatStatus::InProgress => "in progress",
            ChatStatus::Submitted => "submitted",
            ChatStatus::Passed => "passed",
            ChatStatus::CanBeImproved => "can_be_improved",
            ChatStatus::NotPassed => "not_passed",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(ChatStatus::Created),
            "in progress" => Ok(ChatStatus::InProgress),
            "submitted" => Ok(ChatStatus::Submitted),
            "passed" => Ok(ChatStatus::Passed),
            "can_be_improved" => Ok(ChatStatus::CanBeImproved),
            "not_passed" => Ok(ChatStatus::NotPassed),
            other => Err(format!("invalid chat status: '{other}'")),
        }
    }
}

/// Who wrote a message in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Agent,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::User => write!(f, "user"),
            MessageKind::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageKind::User),
            "agent" => Ok(MessageKind::Agent),
            other => Err(format!("type must be either \"user\" or \"agent\", got '{other}'")),
        }
    }
}

/// A single entry in a chat's message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// A message stamped with the current time.
    pub fn now(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One attempt by a user at a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub user_id: UserId,
    pub case_id: CaseId,
    pub agent_id: Option<AgentId>,
    pub status: ChatStatus,
    pub messages: Vec<ChatMessage>,
    /// Clamped assessment percentage, set once the chat has been assessed.
    pub assessment: Option<f64>,
    /// Full structured assessment result as returned by the assessor.
    pub learning_outcomes: Option<serde_json::Value>,
    pub is_archived: bool,
    pub user_rating: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// Append a message to the log, preserving every prior entry in order.
    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}

/// Fields needed to insert a new chat row; the database assigns the id.
#[derive(Debug, Clone)]
pub struct NewChat {
    pub user_id: UserId,
    pub case_id: CaseId,
    pub agent_id: Option<AgentId>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub case_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
}

/// A chat joined with its case and agent, as shown when a learner opens a case.
#[derive(Debug, Clone, Serialize)]
pub struct ChatDetail {
    #[serde(flatten)]
    pub chat: Chat,
    pub case: Option<Case>,
    pub agent: Option<Agent>,
}

/// Summary of a user's attempts at one case.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStatusSummary {
    pub active_chat: Option<Chat>,
    pub has_history: bool,
    pub has_completed_history: bool,
    pub total_chats: usize,
}

/// The status shown for a case on the user's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStatusEntry {
    pub status: ChatStatus,
    pub chat_id: ChatId,
}
