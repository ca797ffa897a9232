//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. `DatabasePool` pairs a
//! multi-connection reader pool with a single-connection writer pool, so every
//! write (including the guarded chat appends) is serialized.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: up to 8 read-only connections for SELECT queries.
/// - `writer`: one connection for INSERT/UPDATE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (or create) the database and run migrations on the writer.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Reader connections are read-only, so the schema must exist first.
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }
}

/// `sqlite://{data_dir}/casework.db`
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}/casework.db", data_dir.display())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::DatabasePool;

    /// A migrated pool on a temp file that outlives the test.
    pub async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    /// Insert a bare user row and return its id.
    pub async fn seed_user(pool: &DatabasePool) -> casework_types::user::UserId {
        let id = casework_types::user::UserId::new();
        sqlx::query("INSERT INTO users (id, email, token_hash, created_at) VALUES (?, NULL, ?, ?)")
            .bind(id.to_string())
            .bind(format!("hash-{id}"))
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&pool.writer)
            .await
            .unwrap();
        id
    }

    /// Insert an agent and a case fronted by it.
    pub async fn seed_case(
        pool: &DatabasePool,
        slug: &str,
    ) -> (casework_types::case::CaseId, casework_types::case::AgentId) {
        let case_id = casework_types::case::CaseId::new();
        let agent_id = casework_types::case::AgentId::new();
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO agents (id, name, created_at) VALUES (?, ?, ?)")
            .bind(agent_id.to_string())
            .bind(format!("agent-{slug}"))
            .bind(&now)
            .execute(&pool.writer)
            .await
            .unwrap();
        sqlx::query("INSERT INTO cases (id, slug, agent_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(case_id.to_string())
            .bind(slug)
            .bind(agent_id.to_string())
            .bind(&now)
            .execute(&pool.writer)
            .await
            .unwrap();
        (case_id, agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::test_pool;
    use super::*;

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let pool = test_pool().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(names, ["agents", "cases", "chats", "subscriptions", "users"]);
    }

    #[tokio::test]
    async fn test_pool_wal_and_foreign_keys() {
        let pool = test_pool().await;

        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(mode.0.to_lowercase(), "wal");

        let fk: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(fk.0, 1, "foreign keys should be enabled");
    }

    #[test]
    fn test_database_url() {
        let url = database_url(Path::new("/tmp/cw"));
        assert_eq!(url, "sqlite:///tmp/cw/casework.db");
    }
}
