use thiserror::Error;

/// Errors from repository operations (used by trait definitions in ella-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to conversation and message operations.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("conversation not found")]
    NotFound,

    #[error("message not found")]
    MessageNotFound,

    #[error("not authorized to access this conversation")]
    Forbidden,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<RepositoryError> for ConversationError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ConversationError::NotFound,
            other => ConversationError::StorageError(other.to_string()),
        }
    }
}

/// Errors related to user records and bearer-token authentication.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(String),

    #[error("user already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid or unknown token")]
    InvalidToken,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<RepositoryError> for UserError {
    fn from(e: RepositoryError) -> Self {
        UserError::StorageError(e.to_string())
    }
}
