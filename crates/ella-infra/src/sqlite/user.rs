//! SQLite user repository.

use ella_core::repository::user::UserRepository;
use ella_types::error::RepositoryError;
use ella_types::user::{Plan, User};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    clerk_id: String,
    name: String,
    email: String,
    image_url: String,
    plan: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            clerk_id: row.try_get("clerk_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            image_url: row.try_get("image_url")?,
            plan: row.try_get("plan")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            clerk_id: self.clerk_id,
            name: self.name,
            email: self.email,
            image_url: self.image_url,
            plan: self.plan.parse().map_err(RepositoryError::Query)?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

const SELECT_USER: &str =
    "SELECT clerk_id, name, email, image_url, plan, created_at FROM users";

impl UserRepository for SqliteUserRepository {
    async fn get_user(&self, clerk_id: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE clerk_id = ?"))
            .bind(clerk_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.map(|row| UserRow::from_row(&row).map_err(query_error)?.into_user())
            .transpose()
    }

    async fn create_user(&self, user: &User, token_hash: Option<&str>) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO users (clerk_id, name, email, image_url, plan, token_hash, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&user.clerk_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image_url)
        .bind(user.plan.to_string())
        .bind(token_hash)
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.message().contains("UNIQUE")
            {
                return RepositoryError::Conflict(format!("user {} already exists", user.clerk_id));
            }
            query_error(e)
        })?;
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE token_hash = ?"))
            .bind(token_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;
        row.map(|row| UserRow::from_row(&row).map_err(query_error)?.into_user())
            .transpose()
    }

    async fn update_plan(&self, clerk_id: &str, plan: Plan) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET plan = ? WHERE clerk_id = ?")
            .bind(plan.to_string())
            .bind(clerk_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::tests::test_pool;
    use chrono::Utc;

    fn user(clerk_id: &str) -> User {
        User {
            clerk_id: clerk_id.to_string(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            image_url: String::new(),
            plan: Plan::Free,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let alice = user("user_alice");
        repo.create_user(&alice, Some("hash-a")).await.unwrap();

        let loaded = repo.get_user("user_alice").await.unwrap().unwrap();
        assert_eq!(loaded, alice);
        assert!(repo.get_user("user_bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create_user(&user("u1"), None).await.unwrap();
        let err = repo.create_user(&user("u1"), None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_tokenless_users_coexist() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create_user(&user("u1"), None).await.unwrap();
        repo.create_user(&user("u2"), None).await.unwrap();
        assert!(repo.get_user("u2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_by_token_hash() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create_user(&user("u1"), Some("abc123")).await.unwrap();

        let found = repo.find_by_token_hash("abc123").await.unwrap().unwrap();
        assert_eq!(found.clerk_id, "u1");
        assert!(repo.find_by_token_hash("zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_plan() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create_user(&user("u1"), None).await.unwrap();
        repo.update_plan("u1", Plan::Pro).await.unwrap();
        assert_eq!(repo.get_user("u1").await.unwrap().unwrap().plan, Plan::Pro);

        let err = repo.update_plan("ghost", Plan::Pro).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
