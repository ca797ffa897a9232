//! SQLite user repository.

use casework_core::repository::user::UserRepository;
use casework_types::error::RepositoryError;
use casework_types::user::{User, UserId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: String,
    email: Option<String>,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: UserId(parse_uuid(&self.id, "user id")?),
            email: self.email,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl SqliteUserRepository {
    async fn fetch_one_where(&self, column: &str, value: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT id, email, created_at FROM users WHERE {column} = ?");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(UserRow::from_row(&row).map_err(query_error)?.into_user()?)),
            None => Ok(None),
        }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &User, token_hash: &str) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, token_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(token_hash)
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict("email or token already registered".to_string()),
            ),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("token_hash", token_hash).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("email", email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_support::test_pool;
    use chrono::Utc;

    fn make_user(email: &str) -> User {
        User {
            id: UserId::new(),
            email: Some(email.to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = make_user("a@example.com");
        repo.create(&user, "hash-a").await.unwrap();

        let by_token = repo.find_by_token_hash("hash-a").await.unwrap().unwrap();
        assert_eq!(by_token.id, user.id);
        let by_email = repo.get_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(repo.find_by_token_hash("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create(&make_user("a@example.com"), "h1").await.unwrap();
        let err = repo.create(&make_user("a@example.com"), "h2").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
