use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns the service version and which LLM providers have keys.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let providers: Vec<&str> = state
        .llm
        .registry()
        .configured_providers()
        .into_iter()
        .map(|p| p.as_str())
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "scistu-api",
        "providers": providers,
    }))
}

#[cfg(test)]
mod tests {
    use crate::state::test_support::app_for;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_health_lists_configured_providers() {
        let server = MockServer::start().await;
        let (app, _) = app_for(&server);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "scistu-api");

        let providers = json["providers"].as_array().unwrap();
        assert!(providers.iter().any(|p| p == "openai"));
        assert!(providers.iter().any(|p| p == "groq"));
        assert!(!providers.iter().any(|p| p == "gemini"));
    }
}
