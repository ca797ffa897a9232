//! SQLite chat repository.
//!
//! The message log is a JSON array column. Appends go through `json_insert`
//! with an open-status guard in the same statement, so a message or an
//! assessment can never land on a chat that has already been submitted.

use casework_core::repository::chat::{AssessmentUpdate, ChatRepository};
use casework_types::case::{AgentId, CaseId};
use casework_types::chat::{Chat, ChatId, ChatMessage, ChatStatus, NewChat};
use casework_types::error::RepositoryError;
use casework_types::user::UserId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_json, parse_uuid, query_error};

/// Statuses in which a chat still accepts writes.
const OPEN_STATUSES: &str = "('created', 'in progress')";

pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ChatRow {
    id: i64,
    user_id: String,
    case_id: String,
    agent_id: Option<String>,
    status: String,
    messages: String,
    assessment: Option<f64>,
    learning_outcomes: Option<String>,
    is_archived: bool,
    user_rating: Option<i64>,
    created_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            case_id: row.try_get("case_id")?,
            agent_id: row.try_get("agent_id")?,
            status: row.try_get("status")?,
            messages: row.try_get("messages")?,
            assessment: row.try_get("assessment")?,
            learning_outcomes: row.try_get("learning_outcomes")?,
            is_archived: row.try_get("is_archived")?,
            user_rating: row.try_get("user_rating")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_chat(self) -> Result<Chat, RepositoryError> {
        let status: ChatStatus = self.status.parse().map_err(RepositoryError::Query)?;
        let messages: Vec<ChatMessage> = serde_json::from_str(&self.messages)
            .map_err(|e| RepositoryError::Query(format!("invalid messages: {e}")))?;
        let agent_id = self
            .agent_id
            .as_deref()
            .map(|s| parse_uuid(s, "agent_id").map(AgentId::from_uuid))
            .transpose()?;
        let learning_outcomes = self
            .learning_outcomes
            .as_deref()
            .map(|s| parse_json(s, "learning_outcomes"))
            .transpose()?;

        Ok(Chat {
            id: ChatId(self.id),
            user_id: UserId(parse_uuid(&self.user_id, "user_id")?),
            case_id: CaseId::from_uuid(parse_uuid(&self.case_id, "case_id")?),
            agent_id,
            status,
            messages,
            assessment: self.assessment,
            learning_outcomes,
            is_archived: self.is_archived,
            user_rating: self.user_rating.map(|v| v as i32),
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Chat>, RepositoryError> {
    let mut chats = Vec::with_capacity(rows.len());
    for row in rows {
        chats.push(ChatRow::from_row(row).map_err(query_error)?.into_chat()?);
    }
    Ok(chats)
}

fn message_json(message: &ChatMessage) -> Result<String, RepositoryError> {
    serde_json::to_string(message).map_err(|e| RepositoryError::Query(e.to_string()))
}

fn require_row(result: sqlx::sqlite::SqliteQueryResult) -> Result<(), RepositoryError> {
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

impl ChatRepository for SqliteChatRepository {
    async fn create(&self, chat: &NewChat) -> Result<Chat, RepositoryError> {
        let row = sqlx::query(
            r#"INSERT INTO chats (user_id, case_id, agent_id, status, messages, is_archived, created_at)
               VALUES (?, ?, ?, 'created', '[]', 0, ?)
               RETURNING *"#,
        )
        .bind(chat.user_id.to_string())
        .bind(chat.case_id.to_string())
        .bind(chat.agent_id.map(|id| id.to_string()))
        .bind(format_datetime(&chat.created_at))
        .fetch_one(&self.pool.writer)
        .await
        .map_err(query_error)?;

        ChatRow::from_row(&row).map_err(query_error)?.into_chat()
    }

    async fn get_for_user(
        &self,
        id: ChatId,
        user_id: &UserId,
    ) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ? AND user_id = ?")
            .bind(id.0)
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(ChatRow::from_row(&row).map_err(query_error)?.into_chat()?)),
            None => Ok(None),
        }
    }

    async fn find_unarchived(
        &self,
        user_id: &UserId,
        case_id: &CaseId,
    ) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT * FROM chats
               WHERE user_id = ? AND case_id = ? AND is_archived = 0
               ORDER BY created_at DESC, id DESC
               LIMIT 1"#,
        )
        .bind(user_id.to_string())
        .bind(case_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(ChatRow::from_row(&row).map_err(query_error)?.into_chat()?)),
            None => Ok(None),
        }
    }

    async fn list_for_case(
        &self,
        user_id: &UserId,
        case_id: &CaseId,
    ) -> Result<Vec<Chat>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM chats
               WHERE user_id = ? AND case_id = ?
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(user_id.to_string())
        .bind(case_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        map_rows(&rows)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Chat>, RepositoryError> {
        let rows =
            sqlx::query("SELECT * FROM chats WHERE user_id = ? ORDER BY created_at DESC, id DESC")
                .bind(user_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(query_error)?;

        map_rows(&rows)
    }

    async fn append_message(
        &self,
        id: ChatId,
        message: &ChatMessage,
        status: ChatStatus,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            "UPDATE chats SET messages = json_insert(messages, '$[#]', json(?)), status = ? \
             WHERE id = ? AND status IN {OPEN_STATUSES}"
        );
        let result = sqlx::query(&sql)
            .bind(message_json(message)?)
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        require_row(result)
    }

    async fn set_status(&self, id: ChatId, status: ChatStatus) -> Result<(), RepositoryError> {
        let sql = format!(
            "UPDATE chats SET status = ? \
             WHERE id = ? AND (status IN {OPEN_STATUSES} OR status = ?)"
        );
        let result = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(id.0)
            .bind(status.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        require_row(result)
    }

    async fn record_assessment(
        &self,
        id: ChatId,
        update: &AssessmentUpdate,
    ) -> Result<(), RepositoryError> {
        let sql = format!(
            "UPDATE chats SET status = ?, assessment = ?, learning_outcomes = ?, \
             messages = json_insert(messages, '$[#]', json(?)) \
             WHERE id = ? AND status IN {OPEN_STATUSES}"
        );
        let result = sqlx::query(&sql)
            .bind(update.status.as_str())
            .bind(update.score)
            .bind(update.learning_outcomes.to_string())
            .bind(message_json(&update.summary)?)
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        require_row(result)
    }

    async fn archive(&self, id: ChatId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chats SET is_archived = 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        require_row(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_support::{seed_case, seed_user, test_pool};
    use casework_types::chat::MessageKind;
    use chrono::{Duration, Utc};

    async fn setup() -> (SqliteChatRepository, UserId, CaseId, AgentId) {
        let pool = test_pool().await;
        let user = seed_user(&pool).await;
        let (case, agent) = seed_case(&pool, "late-shipment").await;
        (SqliteChatRepository::new(pool), user, case, agent)
    }

    fn new_chat(user: UserId, case: CaseId, agent: AgentId) -> NewChat {
        NewChat {
            user_id: user,
            case_id: case,
            agent_id: Some(agent),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_scoped_to_owner() {
        let (repo, user, case, agent) = setup().await;
        let chat = repo.create(&new_chat(user, case, agent)).await.unwrap();
        assert_eq!(chat.status, ChatStatus::Created);
        assert!(chat.messages.is_empty());
        assert!(chat.id.0 > 0);

        let found = repo.get_for_user(chat.id, &user).await.unwrap().unwrap();
        assert_eq!(found.agent_id, Some(agent));
        assert!(repo.get_for_user(chat.id, &UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let (repo, user, case, agent) = setup().await;
        let chat = repo.create(&new_chat(user, case, agent)).await.unwrap();

        for (i, kind) in [MessageKind::User, MessageKind::Agent, MessageKind::User]
            .into_iter()
            .enumerate()
        {
            repo.append_message(chat.id, &ChatMessage::now(kind, format!("m{i}")), ChatStatus::InProgress)
                .await
                .unwrap();
        }

        let chat = repo.get_for_user(chat.id, &user).await.unwrap().unwrap();
        let texts: Vec<&str> = chat.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["m0", "m1", "m2"]);
        assert_eq!(chat.messages[1].kind, MessageKind::Agent);
        assert_eq!(chat.status, ChatStatus::InProgress);
    }

    #[tokio::test]
    async fn test_terminal_chat_rejects_writes() {
        let (repo, user, case, agent) = setup().await;
        let chat = repo.create(&new_chat(user, case, agent)).await.unwrap();
        repo.set_status(chat.id, ChatStatus::Submitted).await.unwrap();

        let err = repo
            .append_message(chat.id, &ChatMessage::now(MessageKind::User, "late"), ChatStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        let update = AssessmentUpdate {
            status: ChatStatus::Passed,
            score: 90.0,
            learning_outcomes: serde_json::json!({}),
            summary: ChatMessage::now(MessageKind::Agent, "summary"),
        };
        let err = repo.record_assessment(chat.id, &update).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        let chat = repo.get_for_user(chat.id, &user).await.unwrap().unwrap();
        assert_eq!(chat.status, ChatStatus::Submitted);
        assert!(chat.messages.is_empty());
        assert!(chat.assessment.is_none());
    }

    #[tokio::test]
    async fn test_graded_chat_cannot_be_reopened() {
        let (repo, user, case, agent) = setup().await;
        let chat = repo.create(&new_chat(user, case, agent)).await.unwrap();
        let graded = AssessmentUpdate {
            status: ChatStatus::Passed,
            score: 90.0,
            learning_outcomes: serde_json::json!({}),
            summary: ChatMessage::now(MessageKind::Agent, "summary"),
        };
        repo.record_assessment(chat.id, &graded).await.unwrap();

        let err = repo.set_status(chat.id, ChatStatus::Created).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        repo.set_status(chat.id, ChatStatus::Passed).await.unwrap();

        let regrade = AssessmentUpdate {
            status: ChatStatus::NotPassed,
            score: 5.0,
            ..graded
        };
        let err = repo.record_assessment(chat.id, &regrade).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        let chat = repo.get_for_user(chat.id, &user).await.unwrap().unwrap();
        assert_eq!(chat.status, ChatStatus::Passed);
        assert_eq!(chat.assessment, Some(90.0));
        assert_eq!(chat.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_record_assessment() {
        let (repo, user, case, agent) = setup().await;
        let chat = repo.create(&new_chat(user, case, agent)).await.unwrap();
        repo.append_message(chat.id, &ChatMessage::now(MessageKind::User, "hi"), ChatStatus::InProgress)
            .await
            .unwrap();

        let update = AssessmentUpdate {
            status: ChatStatus::CanBeImproved,
            score: 55.5,
            learning_outcomes: serde_json::json!({"assessment_percentage": 55.5}),
            summary: ChatMessage::now(MessageKind::Agent, "## Assessment Complete!"),
        };
        repo.record_assessment(chat.id, &update).await.unwrap();

        let chat = repo.get_for_user(chat.id, &user).await.unwrap().unwrap();
        assert_eq!(chat.status, ChatStatus::CanBeImproved);
        assert_eq!(chat.assessment, Some(55.5));
        assert_eq!(chat.learning_outcomes.unwrap()["assessment_percentage"], 55.5);
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[1].text, "## Assessment Complete!");
    }

    #[tokio::test]
    async fn test_listing_and_archive() {
        let (repo, user, case, agent) = setup().await;
        let mut older = new_chat(user, case, agent);
        older.created_at = Utc::now() - Duration::minutes(5);
        let first = repo.create(&older).await.unwrap();
        let second = repo.create(&new_chat(user, case, agent)).await.unwrap();

        let listed = repo.list_for_case(&user, &case).await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), [second.id, first.id]);
        assert_eq!(repo.list_for_user(&user).await.unwrap().len(), 2);

        repo.archive(second.id).await.unwrap();
        let active = repo.find_unarchived(&user, &case).await.unwrap().unwrap();
        assert_eq!(active.id, first.id);

        repo.archive(first.id).await.unwrap();
        assert!(repo.find_unarchived(&user, &case).await.unwrap().is_none());
        assert!(matches!(repo.archive(ChatId(999)).await, Err(RepositoryError::NotFound)));
    }
}
