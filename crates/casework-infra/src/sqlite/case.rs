//! SQLite case and agent repository.

use casework_core::repository::case::CaseRepository;
use casework_types::case::{Agent, AgentId, Case, CaseId, CaseWithAgent};
use casework_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_json, parse_uuid, query_error};

pub struct SqliteCaseRepository {
    pool: DatabasePool,
}

impl SqliteCaseRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct CaseRow {
    id: String,
    slug: String,
    title: Option<String>,
    description: Option<String>,
    story: Option<String>,
    criteria_outcomes: Option<String>,
    difficulty: Option<i64>,
    tags: String,
    is_public: bool,
    can_be_done_after: Option<String>,
    agent_id: Option<String>,
    created_at: String,
}

impl CaseRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            story: row.try_get("story")?,
            criteria_outcomes: row.try_get("criteria_outcomes")?,
            difficulty: row.try_get("difficulty")?,
            tags: row.try_get("tags")?,
            is_public: row.try_get("is_public")?,
            can_be_done_after: row.try_get("can_be_done_after")?,
            agent_id: row.try_get("agent_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_case(self) -> Result<Case, RepositoryError> {
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| RepositoryError::Query(format!("invalid tags: {e}")))?;

        Ok(Case {
            id: CaseId::from_uuid(parse_uuid(&self.id, "case id")?),
            slug: self.slug,
            title: self.title,
            description: self.description,
            story: self.story,
            criteria_outcomes: self
                .criteria_outcomes
                .as_deref()
                .map(|s| parse_json(s, "criteria_outcomes"))
                .transpose()?,
            difficulty: self.difficulty.map(|d| d as i32),
            tags,
            is_public: self.is_public,
            can_be_done_after: self
                .can_be_done_after
                .as_deref()
                .map(|s| parse_uuid(s, "can_be_done_after").map(CaseId::from_uuid))
                .transpose()?,
            agent_id: self
                .agent_id
                .as_deref()
                .map(|s| parse_uuid(s, "agent_id").map(AgentId::from_uuid))
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn agent_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Agent, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_error)?;
    let created_at: String = row.try_get("created_at").map_err(query_error)?;
    Ok(Agent {
        id: AgentId::from_uuid(parse_uuid(&id, "agent id")?),
        name: row.try_get("name").map_err(query_error)?,
        position: row.try_get("position").map_err(query_error)?,
        prompt: row.try_get("prompt").map_err(query_error)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl CaseRepository for SqliteCaseRepository {
    async fn list(&self) -> Result<Vec<Case>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM cases ORDER BY id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut cases = Vec::with_capacity(rows.len());
        for row in &rows {
            cases.push(CaseRow::from_row(row).map_err(query_error)?.into_case()?);
        }
        Ok(cases)
    }

    async fn get(&self, id: &CaseId) -> Result<Option<Case>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM cases WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(CaseRow::from_row(&row).map_err(query_error)?.into_case()?)),
            None => Ok(None),
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<CaseWithAgent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM cases WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let case = CaseRow::from_row(&row).map_err(query_error)?.into_case()?;
        let agent = match &case.agent_id {
            Some(agent_id) => self.get_agent(agent_id).await?,
            None => None,
        };
        Ok(Some(CaseWithAgent { case, agent }))
    }

    async fn get_agent(&self, id: &AgentId) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(agent_from_row).transpose()
    }

    async fn upsert_agent(&self, agent: &Agent) -> Result<AgentId, RepositoryError> {
        let row = sqlx::query(
            r#"INSERT INTO agents (id, name, position, prompt, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(name) DO UPDATE SET position = excluded.position, prompt = excluded.prompt
               RETURNING id"#,
        )
        .bind(agent.id.to_string())
        .bind(&agent.name)
        .bind(&agent.position)
        .bind(&agent.prompt)
        .bind(format_datetime(&agent.created_at))
        .fetch_one(&self.pool.writer)
        .await
        .map_err(query_error)?;

        let id: String = row.try_get("id").map_err(query_error)?;
        Ok(AgentId::from_uuid(parse_uuid(&id, "agent id")?))
    }

    async fn upsert_case(&self, case: &Case) -> Result<CaseId, RepositoryError> {
        let tags = serde_json::to_string(&case.tags)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = sqlx::query(
            r#"INSERT INTO cases (id, slug, title, description, story, criteria_outcomes, difficulty,
                                  tags, is_public, can_be_done_after, agent_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(slug) DO UPDATE SET
                   title = excluded.title,
                   description = excluded.description,
                   story = excluded.story,
                   criteria_outcomes = excluded.criteria_outcomes,
                   difficulty = excluded.difficulty,
                   tags = excluded.tags,
                   is_public = excluded.is_public,
                   can_be_done_after = excluded.can_be_done_after,
                   agent_id = excluded.agent_id
               RETURNING id"#,
        )
        .bind(case.id.to_string())
        .bind(&case.slug)
        .bind(&case.title)
        .bind(&case.description)
        .bind(&case.story)
        .bind(case.criteria_outcomes.as_ref().map(|v| v.to_string()))
        .bind(case.difficulty)
        .bind(tags)
        .bind(case.is_public)
        .bind(case.can_be_done_after.map(|id| id.to_string()))
        .bind(case.agent_id.map(|id| id.to_string()))
        .bind(format_datetime(&case.created_at))
        .fetch_one(&self.pool.writer)
        .await
        .map_err(query_error)?;

        let id: String = row.try_get("id").map_err(query_error)?;
        Ok(CaseId::from_uuid(parse_uuid(&id, "case id")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_support::test_pool;
    use chrono::Utc;

    fn make_agent(name: &str) -> Agent {
        Agent {
            id: AgentId::new(),
            name: name.to_string(),
            position: Some("head of procurement".to_string()),
            prompt: Some("Be brief.".to_string()),
            created_at: Utc::now(),
        }
    }

    fn make_case(slug: &str, agent_id: Option<AgentId>) -> Case {
        Case {
            id: CaseId::new(),
            slug: slug.to_string(),
            title: Some("Supplier audit".to_string()),
            description: None,
            story: Some("The audit is due Friday.".to_string()),
            criteria_outcomes: Some(serde_json::json!({"risk": "Name the main risk"})),
            difficulty: Some(2),
            tags: vec!["procurement".to_string()],
            is_public: true,
            can_be_done_after: None,
            agent_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get_by_slug() {
        let repo = SqliteCaseRepository::new(test_pool().await);
        let agent_id = repo.upsert_agent(&make_agent("Priya")).await.unwrap();
        let case_id = repo.upsert_case(&make_case("audit", Some(agent_id))).await.unwrap();

        let found = repo.get_by_slug("audit").await.unwrap().unwrap();
        assert_eq!(found.case.id, case_id);
        assert_eq!(found.case.tags, ["procurement"]);
        assert_eq!(found.case.criteria_outcomes.unwrap()["risk"], "Name the main risk");
        assert_eq!(found.agent.unwrap().name, "Priya");
        assert!(repo.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_original_ids() {
        let repo = SqliteCaseRepository::new(test_pool().await);
        let first_agent = repo.upsert_agent(&make_agent("Priya")).await.unwrap();
        let mut renamed = make_agent("Priya");
        renamed.position = Some("CFO".to_string());
        let second_agent = repo.upsert_agent(&renamed).await.unwrap();
        assert_eq!(first_agent, second_agent);
        assert_eq!(
            repo.get_agent(&first_agent).await.unwrap().unwrap().position.as_deref(),
            Some("CFO")
        );

        let first_case = repo.upsert_case(&make_case("audit", None)).await.unwrap();
        let mut edited = make_case("audit", Some(first_agent));
        edited.title = Some("Supplier audit v2".to_string());
        let second_case = repo.upsert_case(&edited).await.unwrap();
        assert_eq!(first_case, second_case);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title.as_deref(), Some("Supplier audit v2"));
        assert_eq!(listed[0].agent_id, Some(first_agent));
    }

    #[tokio::test]
    async fn test_prerequisite_round_trip() {
        let repo = SqliteCaseRepository::new(test_pool().await);
        let basic = repo.upsert_case(&make_case("basic", None)).await.unwrap();
        let mut advanced = make_case("advanced", None);
        advanced.can_be_done_after = Some(basic);
        let advanced_id = repo.upsert_case(&advanced).await.unwrap();

        let found = repo.get(&advanced_id).await.unwrap().unwrap();
        assert_eq!(found.can_be_done_after, Some(basic));
    }
}
