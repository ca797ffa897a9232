//! SQLite subscription repository: the local mirror of provider billing state.

use casework_core::repository::subscription::SubscriptionRepository;
use casework_types::error::RepositoryError;
use casework_types::subscription::{Plan, Subscription, SubscriptionStatus, SubscriptionSync};
use casework_types::user::UserId;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

pub struct SqliteSubscriptionRepository {
    pool: DatabasePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct SubscriptionRow {
    user_id: String,
    plan: String,
    status: String,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    stripe_price_id: Option<String>,
    current_period_start: Option<String>,
    current_period_end: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SubscriptionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            plan: row.try_get("plan")?,
            status: row.try_get("status")?,
            stripe_customer_id: row.try_get("stripe_customer_id")?,
            stripe_subscription_id: row.try_get("stripe_subscription_id")?,
            stripe_price_id: row.try_get("stripe_price_id")?,
            current_period_start: row.try_get("current_period_start")?,
            current_period_end: row.try_get("current_period_end")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_subscription(self) -> Result<Subscription, RepositoryError> {
        let plan: Plan = self.plan.parse().map_err(RepositoryError::Query)?;
        let status: SubscriptionStatus = self.status.parse().map_err(RepositoryError::Query)?;

        Ok(Subscription {
            user_id: UserId(parse_uuid(&self.user_id, "user_id")?),
            plan,
            status,
            stripe_customer_id: self.stripe_customer_id,
            stripe_subscription_id: self.stripe_subscription_id,
            stripe_price_id: self.stripe_price_id,
            current_period_start: self
                .current_period_start
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            current_period_end: self
                .current_period_end
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl SqliteSubscriptionRepository {
    async fn fetch_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let sql = format!("SELECT * FROM subscriptions WHERE {column} = ?");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(
                SubscriptionRow::from_row(&row)
                    .map_err(query_error)?
                    .into_subscription()?,
            )),
            None => Ok(None),
        }
    }
}

fn now() -> String {
    format_datetime(&Utc::now())
}

fn require_row(result: sqlx::sqlite::SqliteQueryResult) -> Result<(), RepositoryError> {
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn create(&self, subscription: &Subscription) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO subscriptions (user_id, plan, status, stripe_customer_id, stripe_subscription_id,
                                          stripe_price_id, current_period_start, current_period_end,
                                          created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(subscription.user_id.to_string())
        .bind(subscription.plan.to_string())
        .bind(subscription.status.as_str())
        .bind(&subscription.stripe_customer_id)
        .bind(&subscription.stripe_subscription_id)
        .bind(&subscription.stripe_price_id)
        .bind(subscription.current_period_start.as_ref().map(format_datetime))
        .bind(subscription.current_period_end.as_ref().map(format_datetime))
        .bind(format_datetime(&subscription.created_at))
        .bind(format_datetime(&subscription.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!(
                    "subscription for user '{}' already exists",
                    subscription.user_id
                )),
            ),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn get_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, RepositoryError> {
        self.fetch_where("user_id", &user_id.to_string()).await
    }

    async fn get_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError> {
        self.fetch_where("stripe_customer_id", customer_id).await
    }

    async fn set_customer(&self, user_id: &UserId, customer_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET stripe_customer_id = ?, updated_at = ? WHERE user_id = ?",
        )
        .bind(customer_id)
        .bind(now())
        .bind(user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        require_row(result)
    }

    async fn link_subscription(
        &self,
        user_id: &UserId,
        subscription_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE subscriptions
               SET stripe_subscription_id = ?, status = 'active', updated_at = ?
               WHERE user_id = ?"#,
        )
        .bind(subscription_id)
        .bind(now())
        .bind(user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        require_row(result)
    }

    async fn sync(&self, user_id: &UserId, sync: &SubscriptionSync) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE subscriptions
               SET plan = ?, status = ?, stripe_subscription_id = ?, stripe_price_id = ?,
                   current_period_start = ?, current_period_end = ?, updated_at = ?
               WHERE user_id = ?"#,
        )
        .bind(sync.plan.to_string())
        .bind(sync.status.as_str())
        .bind(&sync.stripe_subscription_id)
        .bind(&sync.stripe_price_id)
        .bind(sync.current_period_start.as_ref().map(format_datetime))
        .bind(sync.current_period_end.as_ref().map(format_datetime))
        .bind(now())
        .bind(user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        require_row(result)
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE subscriptions SET status = ?, updated_at = ? WHERE user_id = ?")
                .bind(status.as_str())
                .bind(now())
                .bind(user_id.to_string())
                .execute(&self.pool.writer)
                .await
                .map_err(query_error)?;

        require_row(result)
    }

    async fn set_status_by_customer(
        &self,
        customer_id: &str,
        status: SubscriptionStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = ?, updated_at = ? WHERE stripe_customer_id = ?",
        )
        .bind(status.as_str())
        .bind(now())
        .bind(customer_id)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        require_row(result)
    }

    async fn cancel_by_customer(
        &self,
        customer_id: &str,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE subscriptions
               SET plan = 'free', status = 'canceled', current_period_end = ?, updated_at = ?
               WHERE stripe_customer_id = ?"#,
        )
        .bind(current_period_end.as_ref().map(format_datetime))
        .bind(now())
        .bind(customer_id)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        require_row(result)
    }
}
