use axum::{extract::State, response::Response, Json};
use serde::Deserialize;
use tracing::info;

use crate::chat::data_stream::{data_stream_response, DataStreamOptions};
use crate::chat::prompts::PLAYGROUND_SYSTEM;
use crate::errors::AppError;
use crate::llm_client::{
    ChatMessage, CompletionRequest, ModelId, SamplingOverrides, SamplingParams, REASONER_MODEL_ID,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    #[serde(flatten)]
    pub sampling: SamplingOverrides,
}

/// POST /api/chat
///
/// Streams the selected model's reply in the data stream format, reasoning
/// included.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    if request.messages.is_empty() {
        return Err(AppError::Validation(
            "At least one message is required".to_string(),
        ));
    }

    let model = ModelId::parse(request.model.as_deref().unwrap_or(REASONER_MODEL_ID))?;
    let system = request
        .system_prompt
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| PLAYGROUND_SYSTEM.to_string());

    let completion_request = CompletionRequest::new(model, system, request.messages)
        .with_params(request.sampling.resolve(SamplingParams::default()));

    info!(
        model = %completion_request.model,
        messages = completion_request.messages.len(),
        temperature = completion_request.params.temperature,
        max_tokens = completion_request.params.max_tokens,
        "Chat request"
    );

    let events = state.llm.stream(&completion_request).await?;

    Ok(data_stream_response(
        events,
        DataStreamOptions {
            send_reasoning: true,
            label: "chat",
        },
    ))
}

#[cfg(test)]
mod tests {
    use crate::chat::data_stream::DATA_STREAM_HEADER;
    use crate::llm_client::test_support::openai_sse;
    use crate::state::test_support::app_for;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .uri("/api/chat")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_default_model_streams_reasoning_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "deepseek-r1-distill-llama-70b",
                "top_p": 0.9
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                openai_sse(&["<think>derivative of x^2</think>", "It is 2x."]),
                "text/event-stream",
            ))
            .mount(&server)
            .await;
        let (app, _) = app_for(&server);

        let response = app
            .oneshot(chat_request(json!({
                "messages": [{"role": "user", "content": "d/dx x^2?"}]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[DATA_STREAM_HEADER], "v1");
        let body = body_text(response).await;
        assert!(body.contains("g:\"derivative of x^2\"\n"));
        assert!(body.contains("0:\"It is 2x.\"\n"));
        assert!(body.contains("\"finishReason\":\"stop\""));
    }

    #[tokio::test]
    async fn test_custom_system_prompt_and_params_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0,
                "max_tokens": 50,
                "messages": [
                    {"role": "system", "content": "Answer in French."},
                    {"role": "user", "content": "Hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                openai_sse(&["Bonjour"]),
                "text/event-stream",
            ))
            .mount(&server)
            .await;
        let (app, _) = app_for(&server);

        let response = app
            .oneshot(chat_request(json!({
                "messages": [{"role": "user", "content": "Hello"}],
                "model": "openai:gpt-4o-mini",
                "systemPrompt": "Answer in French.",
                "temperature": 0,
                "maxTokens": 50
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("0:\"Bonjour\""));
    }

    #[tokio::test]
    async fn test_empty_messages_rejected() {
        let server = MockServer::start().await;
        let (app, _) = app_for(&server);

        let response = app
            .oneshot(chat_request(json!({"messages": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let server = MockServer::start().await;
        let (app, _) = app_for(&server);

        let response = app
            .oneshot(chat_request(json!({
                "messages": [{"role": "user", "content": "hi"}],
                "model": "mistral:large"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
