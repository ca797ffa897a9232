//! User registration and token lookup.

use chrono::Utc;
use tracing::info;

use casework_types::error::RepositoryError;
use casework_types::subscription::Subscription;
use casework_types::user::{User, UserId};

use crate::repository::subscription::SubscriptionRepository;
use crate::repository::user::UserRepository;

/// Users are created out of band (CLI) and authenticate with a bearer token.
/// Only the token's hash is ever stored.
pub struct UserService<U: UserRepository, S: SubscriptionRepository> {
    users: U,
    subscriptions: S,
}

impl<U: UserRepository, S: SubscriptionRepository> UserService<U, S> {
    pub fn new(users: U, subscriptions: S) -> Self {
        Self {
            users,
            subscriptions,
        }
    }

    /// Create a user on the free plan.
    pub async fn register(
        &self,
        email: Option<&str>,
        token_hash: &str,
    ) -> Result<User, RepositoryError> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        if let Some(email) = email {
            if self.users.get_by_email(email).await?.is_some() {
                return Err(RepositoryError::Conflict(format!(
                    "user with email '{email}' already exists"
                )));
            }
        }

        let user = User {
            id: UserId::new(),
            email: email.map(str::to_string),
            created_at: Utc::now(),
        };
        let user = self.users.create(&user, token_hash).await?;
        self.subscriptions.create(&Subscription::free(user.id)).await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn authenticate(&self, token_hash: &str) -> Result<Option<User>, RepositoryError> {
        self.users.find_by_token_hash(token_hash).await
    }
}
