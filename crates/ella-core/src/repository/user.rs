//! User repository trait definition.

use ella_types::error::RepositoryError;
use ella_types::user::{Plan, User};

/// Repository trait for user persistence.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UserRepository: Send + Sync {
    fn get_user(
        &self,
        clerk_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Insert a user. Returns `Conflict` if the clerk id is taken.
    fn create_user(
        &self,
        user: &User,
        token_hash: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Look up the user whose bearer token hashes to `token_hash`.
    fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Returns `NotFound` if the user does not exist.
    fn update_plan(
        &self,
        clerk_id: &str,
        plan: Plan,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
