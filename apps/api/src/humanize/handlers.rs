//! Axum route handlers for the Humanize API.

use axum::{extract::State, http::HeaderMap, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::humanize::history::HumanizeResult;
use crate::humanize::prompts::{HUMANIZE_REASONING_TAG, HUMANIZE_SYSTEM};
use crate::humanize::rate_limiter::RateLimitUsage;
use crate::llm_client::{
    ChatMessage, CompletionRequest, ModelId, SamplingOverrides, SamplingParams, REASONER_MODEL_ID,
};
use crate::state::AppState;

/// Header identifying the calling browser tab for rate limiting and history.
pub const CLIENT_ID_HEADER: &str = "x-client-id";
const ANONYMOUS_CLIENT: &str = "anonymous";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HumanizeRequest {
    /// Kept loose so a non-string value is a 400, not a deserialization failure.
    pub text: Option<Value>,
    pub model: Option<String>,
    #[serde(flatten)]
    pub sampling: SamplingOverrides,
}

#[derive(Debug, Serialize)]
pub struct HumanizeResponse {
    pub id: Uuid,
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/humanize
///
/// Rewrites the text through the selected model and records the result in the
/// caller's history. Limited to N requests per trailing window per client.
pub async fn handle_humanize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<HumanizeRequest>,
) -> Result<Json<HumanizeResponse>, AppError> {
    let text = match request.text {
        Some(Value::String(text)) if !text.is_empty() => text,
        _ => return Err(AppError::Validation("Invalid text input".to_string())),
    };

    let client = client_key(&headers);
    state.humanize_limiter.check(&client)?;

    let model = ModelId::parse(request.model.as_deref().unwrap_or(REASONER_MODEL_ID))?;
    let completion_request =
        CompletionRequest::new(model, HUMANIZE_SYSTEM, vec![ChatMessage::user(text.clone())])
            .with_params(request.sampling.resolve(SamplingParams::default()))
            .with_reasoning_tag(HUMANIZE_REASONING_TAG);

    let completion = state
        .llm
        .complete(&completion_request)
        .await
        .map_err(|e| AppError::Upstream {
            message: "Failed to process request".to_string(),
            details: e.to_string(),
        })?;

    state.humanize_limiter.record(&client);

    let humanized = completion.text.trim().to_string();
    let entry = HumanizeResult::new(text, humanized);
    let response = HumanizeResponse {
        id: entry.id,
        result: entry.humanized_text.clone(),
        timestamp: entry.timestamp,
    };
    state.humanize_history.push(&client, entry).await;

    info!(
        client = %client,
        model = %completion_request.model,
        output_tokens = completion.usage.completion_tokens,
        "Humanized text"
    );

    Ok(Json(response))
}

/// GET /api/humanize/history
pub async fn handle_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<Vec<HumanizeResult>> {
    Json(state.humanize_history.list(&client_key(&headers)).await)
}

/// GET /api/humanize/usage
pub async fn handle_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<RateLimitUsage> {
    Json(state.humanize_limiter.usage(&client_key(&headers)))
}

fn client_key(headers: &HeaderMap) -> String {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}
