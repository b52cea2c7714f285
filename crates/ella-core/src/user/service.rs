//! User service: registration, plan changes and token authentication.

use chrono::Utc;
use ella_types::error::{RepositoryError, UserError};
use ella_types::user::{Plan, User, UserProfile};

use super::token::{TokenHasher, generate_token};
use crate::repository::user::UserRepository;

/// A freshly registered user and the only copy of their bearer token.
#[derive(Debug, Clone)]
pub struct IssuedUser {
    pub user: User,
    pub token: String,
}

pub struct UserService<U: UserRepository, H: TokenHasher> {
    repo: U,
    hasher: H,
}

impl<U: UserRepository, H: TokenHasher> UserService<U, H> {
    pub fn new(repo: U, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// Register a user and issue their bearer token.
    pub async fn register(
        &self,
        clerk_id: &str,
        profile: UserProfile,
        plan: Plan,
    ) -> Result<IssuedUser, UserError> {
        let clerk_id = clerk_id.trim();
        if clerk_id.is_empty() {
            return Err(UserError::InvalidInput("clerk id must not be empty".to_string()));
        }
        let token = generate_token();
        let user = new_user(clerk_id, profile, plan);
        self.repo
            .create_user(&user, Some(&self.hasher.hash_token(&token)))
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => UserError::AlreadyExists(clerk_id.to_string()),
                other => other.into(),
            })?;
        tracing::info!(clerk_id, plan = %user.plan, "User registered");
        Ok(IssuedUser { user, token })
    }

    /// Return the caller's record, inserting a free-plan record without a
    /// token if none exists. The flag reports whether a row was created.
    pub async fn get_or_create_user(
        &self,
        clerk_id: &str,
        profile: UserProfile,
    ) -> Result<(User, bool), UserError> {
        if let Some(user) = self.repo.get_user(clerk_id).await? {
            return Ok((user, false));
        }
        let user = new_user(clerk_id, profile, Plan::Free);
        match self.repo.create_user(&user, None).await {
            Ok(()) => {
                tracing::info!(clerk_id, "User created");
                Ok((user, true))
            }
            // Lost a race with a concurrent insert.
            Err(RepositoryError::Conflict(_)) => {
                let user = self
                    .repo
                    .get_user(clerk_id)
                    .await?
                    .ok_or_else(|| UserError::NotFound(clerk_id.to_string()))?;
                Ok((user, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_user(&self, clerk_id: &str) -> Result<User, UserError> {
        self.repo
            .get_user(clerk_id)
            .await?
            .ok_or_else(|| UserError::NotFound(clerk_id.to_string()))
    }

    pub async fn set_plan(&self, clerk_id: &str, plan: Plan) -> Result<User, UserError> {
        self.repo.update_plan(clerk_id, plan).await.map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound(clerk_id.to_string()),
            other => other.into(),
        })?;
        tracing::info!(clerk_id, %plan, "User plan changed");
        self.get_user(clerk_id).await
    }

    /// Resolve a presented bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<User, UserError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(UserError::InvalidToken);
        }
        self.repo
            .find_by_token_hash(&self.hasher.hash_token(token))
            .await?
            .ok_or(UserError::InvalidToken)
    }
}

fn new_user(clerk_id: &str, profile: UserProfile, plan: Plan) -> User {
    User {
        clerk_id: clerk_id.to_string(),
        name: profile.name,
        email: profile.email,
        image_url: profile.image_url,
        plan,
        created_at: Utc::now(),
    }
}
