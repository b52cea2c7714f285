//! Bearer token authentication extractor.
//!
//! Extracts the caller's token from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//!
//! and resolves it to a user through `UserService::authenticate`, which
//! compares SHA-256 hashes against the `users` table.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use ella_core::chat::service::Caller;
use ella_types::error::UserError;
use ella_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated user. Extracting this validates the token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn clerk_id(&self) -> &str {
        &self.0.clerk_id
    }

    pub fn caller(&self) -> Caller {
        Caller {
            clerk_id: self.0.clerk_id.clone(),
            has_pro_plan: self.0.plan.is_pro(),
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        match state.user_service.authenticate(&token).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(UserError::InvalidToken) => Err(AppError::Unauthorized(
                "Invalid token. Provide a valid token via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

/// Extract the token from request headers.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/chat");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_header() {
        let token = extract_token(&parts(&[("authorization", "Bearer ella_abc ")])).unwrap();
        assert_eq!(token, "ella_abc");
    }

    #[test]
    fn test_api_key_header_fallback() {
        let token = extract_token(&parts(&[
            ("authorization", "Basic xyz"),
            ("x-api-key", "ella_def"),
        ]))
        .unwrap();
        assert_eq!(token, "ella_def");
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let err = extract_token(&parts(&[])).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
