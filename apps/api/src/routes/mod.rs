pub mod health;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::errors::AppError;
use crate::pr_statement::handlers;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound("No such route".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route(
            "/api/generate-pr-statement",
            post(handlers::handle_generate_pr_statement),
        )
        .fallback(not_found)
        .with_state(state)
}

/// CORS limited to the configured origins, GET/POST and any request header.
pub fn build_cors(config: &Config) -> Result<CorsLayer> {
    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::any()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::llm_client::{Completion, LlmError, Prompt};
    use crate::pr_statement::fallback::fallback_statement;
    use crate::pr_statement::workflow::{PrWorkflow, WorkflowSettings};

    /// Writes a topical draft and approves it.
    struct ApprovingLlm;

    #[async_trait]
    impl Completion for ApprovingLlm {
        async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError> {
            if prompt.user.starts_with("Review") {
                Ok(r#"{"grade": "good", "feedback": ""}"#.to_string())
            } else {
                Ok("We are excited to launch our AI-powered chatbot today.".to_string())
            }
        }
    }

    struct DownLlm;

    #[async_trait]
    impl Completion for DownLlm {
        async fn complete(&self, _prompt: &Prompt) -> Result<String, LlmError> {
            Err(LlmError::Unavailable("connection refused".to_string()))
        }
    }

    fn app(llm: Option<Arc<dyn Completion>>) -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        let workflow = llm.map(|llm| PrWorkflow::new(llm, WorkflowSettings::default()));
        build_router(AppState { workflow, config })
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn send_raw(app: Router, content_type: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/generate-pr-statement")
            .header("content-type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn cors_app() -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        let cors = build_cors(&config).unwrap();
        app(None).layer(cors)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(None), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "healthy", "message": "PR Statement Generator API is running"})
        );
    }

    #[tokio::test]
    async fn test_root_reports_service_info() {
        let (status, body) = send(app(None), Method::GET, "/", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "PR Statement Generator API");
        assert_eq!(body["health"], "/health");
        assert_eq!(body["generation_available"], false);
    }

    #[tokio::test]
    async fn test_generate_success_has_exact_shape() {
        let (status, body) = send(
            app(Some(Arc::new(ApprovingLlm))),
            Method::POST,
            "/api/generate-pr-statement",
            Some(json!({"topic": "AI-powered chatbot launch"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "PR statement generated successfully");
        assert!(body["pr_statement"].as_str().unwrap().contains("chatbot"));
    }

    #[tokio::test]
    async fn test_generate_with_llm_down_returns_fallback() {
        let (status, body) = send(
            app(Some(Arc::new(DownLlm))),
            Method::POST,
            "/api/generate-pr-statement",
            Some(json!({"topic": "X"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "fallback");
        assert_eq!(body["pr_statement"], fallback_statement("X"));
    }

    #[tokio::test]
    async fn test_generate_without_credentials_is_503() {
        let (status, body) = send(
            app(None),
            Method::POST,
            "/api/generate-pr-statement",
            Some(json!({"topic": "Test topic"})),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["error"]["message"],
            "PR Generator Service is not available"
        );
    }

    #[tokio::test]
    async fn test_topic_validation() {
        let too_long = "x".repeat(501);
        for topic in ["", "   ", too_long.as_str()] {
            let (status, body) = send(
                app(Some(Arc::new(ApprovingLlm))),
                Method::POST,
                "/api/generate-pr-statement",
                Some(json!({ "topic": topic })),
            )
            .await;

            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "topic {topic:?}");
            assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
        }
    }

    #[tokio::test]
    async fn test_topic_at_max_length_is_accepted() {
        let (status, _) = send(
            app(Some(Arc::new(ApprovingLlm))),
            Method::POST,
            "/api/generate-pr-statement",
            Some(json!({ "topic": "x".repeat(500) })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_topic_field_is_rejected() {
        let (status, body) = send(
            app(Some(Arc::new(ApprovingLlm))),
            Method::POST,
            "/api/generate-pr-statement",
            Some(json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
        assert!(body["error"]["message"].as_str().unwrap().contains("topic"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_422_envelope() {
        let (status, body) = send_raw(
            app(Some(Arc::new(ApprovingLlm))),
            "application/json",
            r#"{"topic": "test""#,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_non_json_content_type_is_422_envelope() {
        let (status, body) = send_raw(
            app(Some(Arc::new(ApprovingLlm))),
            "text/plain",
            r#"{"topic": "test"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_cors_echoes_configured_origin() {
        let request = Request::builder()
            .uri("/health")
            .header("origin", "http://localhost:8501")
            .body(Body::empty())
            .unwrap();

        let response = cors_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:8501"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unlisted_origin() {
        let request = Request::builder()
            .uri("/health")
            .header("origin", "http://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = cors_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_post() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/generate-pr-statement")
            .header("origin", "http://127.0.0.1:8501")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();

        let response = cors_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"],
            "http://127.0.0.1:8501"
        );
        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("POST"));
    }

    #[test]
    fn test_build_cors_rejects_invalid_origin() {
        let config = Config::from_lookup(|key| {
            (key == "CORS_ALLOWED_ORIGINS").then(|| "http://ok.example,bad\norigin".to_string())
        })
        .unwrap();

        assert!(build_cors(&config).is_err());
    }

    #[tokio::test]
    async fn test_wrong_methods_are_405() {
        let (status, _) = send(app(None), Method::GET, "/api/generate-pr-statement", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(app(None), Method::POST, "/health", Some(json!({}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, body) = send(app(None), Method::GET, "/nonexistent", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
