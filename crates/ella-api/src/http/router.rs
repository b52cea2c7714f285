//! Axum router configuration with middleware.
//!
//! Legacy routes live at `/api/chat` and `/api/generate-title`; the REST
//! API lives under `/api/v1/`. Middleware: CORS, request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/users/me",
            get(handlers::user::get_me).post(handlers::user::ensure_me),
        )
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations)
                .post(handlers::conversation::create_conversation),
        )
        .route(
            "/conversations/search",
            get(handlers::conversation::search_conversations),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation)
                .patch(handlers::conversation::rename_conversation)
                .delete(handlers::conversation::delete_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::conversation::list_messages).post(handlers::conversation::submit_turn),
        )
        .route("/library/images", get(handlers::library::list_images))
        .route("/jobs/{id}", get(handlers::job::get_job));

    Router::new()
        .route("/api/chat", post(handlers::chat::chat))
        .route(
            "/api/generate-title",
            post(handlers::chat::generate_conversation_title),
        )
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - no auth required.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tokio::sync::mpsc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use ella_core::chat::gate::UPGRADE_NOTICE;
    use ella_core::llm::box_provider::BoxLlmProvider;
    use ella_core::llm::provider::LlmProvider;
    use ella_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};
    use ella_types::user::{Plan, UserProfile};

    use super::*;
    use crate::http::handlers::chat::MESSAGES_REQUIRED;
    use crate::state::Storage;

    /// Answers every completion with the same text.
    struct CannedLlm(&'static str);

    impl LlmProvider for CannedLlm {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: self.0.to_string(),
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    struct Harness {
        router: Router,
        rx: mpsc::Receiver<Uuid>,
        free_token: String,
        pro_token: String,
        _dir: tempfile::TempDir,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open_at(dir.path().to_path_buf()).await.unwrap();
        let users = storage.user_service();
        let free = users
            .register("user_free", UserProfile::default(), Plan::Free)
            .await
            .unwrap();
        let pro = users
            .register("user_pro", UserProfile::default(), Plan::Pro)
            .await
            .unwrap();

        let llm = Arc::new(BoxLlmProvider::new(CannedLlm("Seattle Hiking Trails")));
        let (state, rx) = AppState::new(&storage, llm);
        Harness {
            router: build_router(state),
            rx,
            free_token: free.token,
            pro_token: pro.token,
            _dir: dir,
        }
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Create a conversation and submit a turn; returns (conversation, placeholder).
    async fn submit(router: &Router, token: &str, text: &str) -> (String, String) {
        let (status, conv) = send(router, "POST", "/api/v1/conversations", Some(token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let conv_id = conv["data"]["id"].as_str().unwrap().to_string();

        let (status, turn) = send(
            router,
            "POST",
            &format!("/api/v1/conversations/{conv_id}/messages"),
            Some(token),
            Some(json!({ "message": text })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(turn["data"]["placeholder"]["status"], "pending");
        let placeholder = turn["data"]["placeholder"]["id"].as_str().unwrap().to_string();
        (conv_id, placeholder)
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let h = harness().await;
        let (status, body) = send(&h.router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_chat_requires_auth() {
        let mut h = harness().await;
        let body = json!({
            "message": "hi",
            "conversationId": Uuid::now_v7(),
            "tool": "text",
            "AIMessageId": Uuid::now_v7(),
        });
        let (status, json) = send(&h.router, "POST", "/api/chat", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(json["error"].is_string());

        let (status, _) =
            send(&h.router, "POST", "/api/chat", Some("ella_wrong"), Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_free_plan_web_request_is_denied_through_placeholder() {
        let mut h = harness().await;
        let (conv_id, placeholder) = submit(&h.router, &h.free_token, "/web trails").await;

        let (status, body) = send(
            &h.router,
            "POST",
            "/api/chat",
            Some(&h.free_token),
            Some(json!({
                "message": "trails",
                "conversationId": conv_id,
                "tool": "web",
                "AIMessageId": placeholder,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "trails");
        assert!(h.rx.try_recv().is_err());

        let (_, messages) = send(
            &h.router,
            "GET",
            &format!("/api/v1/conversations/{conv_id}/messages"),
            Some(&h.free_token),
            None,
        )
        .await;
        let last = messages["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["id"] == placeholder.as_str())
            .unwrap();
        assert_eq!(last["status"], "failed");
        assert_eq!(last["type"], "text");
        assert_eq!(last["text"], UPGRADE_NOTICE);
    }

    #[tokio::test]
    async fn test_pro_plan_request_is_enqueued() {
        let mut h = harness().await;
        let (conv_id, placeholder) = submit(&h.router, &h.pro_token, "/image a red fox").await;

        let (status, body) = send(
            &h.router,
            "POST",
            "/api/chat",
            Some(&h.pro_token),
            Some(json!({
                "message": "a red fox",
                "conversationId": conv_id,
                "tool": "image",
                "AIMessageId": placeholder,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "a red fox");

        let run_id = h.rx.try_recv().unwrap();
        let (status, job) = send(
            &h.router,
            "GET",
            &format!("/api/v1/jobs/{run_id}"),
            Some(&h.pro_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(job["data"]["run"]["status"], "queued");
        assert_eq!(job["data"]["run"]["payload"]["tool"], "image");

        // Someone else's run is invisible.
        let (status, _) = send(
            &h.router,
            "GET",
            &format!("/api/v1/jobs/{run_id}"),
            Some(&h.free_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chat_on_resolved_placeholder_conflicts() {
        let h = harness().await;
        let (conv_id, placeholder) = submit(&h.router, &h.free_token, "/web trails").await;
        let body = json!({
            "message": "trails",
            "conversationId": conv_id,
            "tool": "web",
            "AIMessageId": placeholder,
        });
        send(&h.router, "POST", "/api/chat", Some(&h.free_token), Some(body.clone())).await;
        let (status, json) =
            send(&h.router, "POST", "/api/chat", Some(&h.free_token), Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_repeat_chat_for_running_placeholder_conflicts() {
        let mut h = harness().await;
        let (conv_id, placeholder) = submit(&h.router, &h.pro_token, "/web trails").await;
        let body = json!({
            "message": "trails",
            "conversationId": conv_id,
            "tool": "web",
            "AIMessageId": placeholder,
        });

        let (status, _) =
            send(&h.router, "POST", "/api/chat", Some(&h.pro_token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, json) =
            send(&h.router, "POST", "/api/chat", Some(&h.pro_token), Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(json["error"].is_string());

        assert!(h.rx.try_recv().is_ok());
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_search_lists_all_own_conversations() {
        let h = harness().await;
        submit(&h.router, &h.pro_token, "Planning a trip to Kyoto").await;
        submit(&h.router, &h.pro_token, "sourdough starter tips").await;
        submit(&h.router, &h.free_token, "someone else's chat").await;

        for uri in ["/api/v1/conversations/search?q=", "/api/v1/conversations/search"] {
            let (status, found) = send(&h.router, "GET", uri, Some(&h.pro_token), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(found["data"].as_array().unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_other_users_conversation_is_forbidden() {
        let h = harness().await;
        let (conv_id, _) = submit(&h.router, &h.pro_token, "hello").await;
        let uri = format!("/api/v1/conversations/{conv_id}");

        let (status, body) = send(&h.router, "GET", &uri, Some(&h.free_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errors"][0]["code"], "FORBIDDEN");

        let (status, _) = send(&h.router, "DELETE", &uri, Some(&h.free_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rename_search_and_delete() {
        let h = harness().await;
        let (conv_id, _) = submit(&h.router, &h.pro_token, "Planning a trip to Kyoto").await;
        let uri = format!("/api/v1/conversations/{conv_id}");

        let (status, renamed) = send(
            &h.router,
            "PATCH",
            &uri,
            Some(&h.pro_token),
            Some(json!({ "title": "Kyoto Trip" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["data"]["title"], "Kyoto Trip");

        let (_, found) = send(
            &h.router,
            "GET",
            "/api/v1/conversations/search?q=kyoto",
            Some(&h.pro_token),
            None,
        )
        .await;
        assert_eq!(found["data"].as_array().unwrap().len(), 1);

        let (status, _) = send(&h.router, "DELETE", &uri, Some(&h.pro_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.router, "DELETE", &uri, Some(&h.pro_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_title() {
        let h = harness().await;
        let (status, body) = send(
            &h.router,
            "POST",
            "/api/generate-title",
            Some(&h.free_token),
            Some(json!({ "messages": [{ "sender": "user", "text": "best hikes near Seattle" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Seattle Hiking Trails");

        let (status, body) = send(
            &h.router,
            "POST",
            "/api/generate-title",
            Some(&h.free_token),
            Some(json!({ "messages": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], MESSAGES_REQUIRED);
    }

    #[tokio::test]
    async fn test_users_me() {
        let h = harness().await;
        let (status, me) = send(&h.router, "GET", "/api/v1/users/me", Some(&h.pro_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["data"]["clerkId"], "user_pro");
        assert_eq!(me["data"]["plan"], "pro");

        let (status, record) =
            send(&h.router, "POST", "/api/v1/users/me", Some(&h.pro_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["data"]["created"], false);
    }
}
