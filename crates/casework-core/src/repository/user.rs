//! User repository trait definition.

use casework_types::error::RepositoryError;
use casework_types::user::User;

/// Repository trait for users and their access tokens.
pub trait UserRepository: Send + Sync {
    /// Create a user with the hash of their access token.
    fn create(
        &self,
        user: &User,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Look up the user owning a token hash.
    fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn get_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
