//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use ella_core::chat::service::SubmissionError;
use ella_core::job::JobError;
use ella_types::error::{ConversationError, UserError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Conversation(ConversationError),
    User(UserError),
    Submission(SubmissionError),
    Job(JobError),
    /// Authentication failure.
    Unauthorized(String),
    Validation(String),
    NotFound(String),
    Internal(String),
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Conversation(e) => AppError::Conversation(e),
            other => AppError::Submission(other),
        }
    }
}

impl From<JobError> for AppError {
    fn from(e: JobError) -> Self {
        AppError::Job(e)
    }
}

impl AppError {
    /// Status, machine code and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Conversation(ConversationError::NotFound) => (
                StatusCode::NOT_FOUND,
                "CONVERSATION_NOT_FOUND",
                "Conversation not found".to_string(),
            ),
            AppError::Conversation(ConversationError::MessageNotFound) => (
                StatusCode::NOT_FOUND,
                "MESSAGE_NOT_FOUND",
                "Message not found".to_string(),
            ),
            AppError::Conversation(ConversationError::Forbidden) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Not authorized to access this conversation".to_string(),
            ),
            AppError::Conversation(ConversationError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Conversation(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONVERSATION_ERROR",
                e.to_string(),
            ),
            AppError::User(UserError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                format!("User '{id}' not found"),
            ),
            AppError::User(UserError::AlreadyExists(id)) => (
                StatusCode::CONFLICT,
                "USER_CONFLICT",
                format!("User '{id}' already exists"),
            ),
            AppError::User(UserError::InvalidToken) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid or unknown token".to_string(),
            ),
            AppError::User(UserError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::User(e) => (StatusCode::INTERNAL_SERVER_ERROR, "USER_ERROR", e.to_string()),
            AppError::Submission(SubmissionError::NotPending(id)) => (
                StatusCode::CONFLICT,
                "MESSAGE_NOT_PENDING",
                format!("Message {id} is not awaiting a response"),
            ),
            AppError::Submission(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SUBMISSION_ERROR", e.to_string())
            }
            AppError::Job(JobError::RunNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "JOB_NOT_FOUND",
                format!("Job run {id} not found"),
            ),
            AppError::Job(e) => (StatusCode::INTERNAL_SERVER_ERROR, "JOB_ERROR", e.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "Request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

/// Error for the two legacy routes (`/api/chat`, `/api/generate-title`),
/// which answer with a bare `{"error": ".."}` body.
#[derive(Debug)]
pub struct LegacyError {
    pub status: StatusCode,
    pub message: String,
}

impl LegacyError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<AppError> for LegacyError {
    fn from(e: AppError) -> Self {
        let (status, _, message) = e.parts();
        Self { status, message }
    }
}

impl IntoResponse for LegacyError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(message = %self.message, "Request failed");
        }
        (self.status, axum::Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_conversation_errors_map_to_status() {
        assert_eq!(
            AppError::from(ConversationError::NotFound).parts().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ConversationError::Forbidden).parts().0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(ConversationError::InvalidInput("x".into())).parts().0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_submission_errors_unwrap_conversation_errors() {
        let err = AppError::from(SubmissionError::Conversation(ConversationError::Forbidden));
        assert!(matches!(err, AppError::Conversation(ConversationError::Forbidden)));

        let (status, code, _) = AppError::from(SubmissionError::NotPending(Uuid::nil())).parts();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "MESSAGE_NOT_PENDING");
    }

    #[test]
    fn test_invalid_token_is_unauthorized() {
        assert_eq!(
            AppError::from(UserError::InvalidToken).parts().0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_legacy_error_keeps_status() {
        let legacy = LegacyError::from(AppError::Unauthorized("User not found".into()));
        assert_eq!(legacy.status, StatusCode::UNAUTHORIZED);
        assert_eq!(legacy.message, "User not found");
    }
}
