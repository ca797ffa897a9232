//! Subscription repository trait definition.

use chrono::{DateTime, Utc};

use casework_types::error::RepositoryError;
use casework_types::subscription::{Subscription, SubscriptionStatus, SubscriptionSync};
use casework_types::user::UserId;

/// Repository trait for mirrored billing state. One row per user.
pub trait SubscriptionRepository: Send + Sync {
    /// Insert the row for a new user.
    fn create(
        &self,
        subscription: &Subscription,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_by_user(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Subscription>, RepositoryError>> + Send;

    fn get_by_customer(
        &self,
        customer_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Subscription>, RepositoryError>> + Send;

    fn set_customer(
        &self,
        user_id: &UserId,
        customer_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Link a provider subscription after checkout and mark the row `active`.
    fn link_subscription(
        &self,
        user_id: &UserId,
        subscription_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Copy a provider subscription object onto the row.
    fn sync(
        &self,
        user_id: &UserId,
        sync: &SubscriptionSync,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Set the status of a user's row.
    fn set_status(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Set the status of the row belonging to a provider customer.
    fn set_status_by_customer(
        &self,
        customer_id: &str,
        status: SubscriptionStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Downgrade the customer's row to `free` / `canceled`.
    fn cancel_by_customer(
        &self,
        customer_id: &str,
        current_period_end: Option<DateTime<Utc>>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
