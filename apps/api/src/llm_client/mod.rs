//! LLM Client: the single point of entry for all hosted-model calls.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! Handlers build a `CompletionRequest` and either stream it or collect it.
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod dialect;
pub mod prompts;
pub mod reasoning;
pub mod registry;
pub mod sse;

pub use registry::{ModelId, ModelRegistry, Provider, REASONER_MODEL_ID};

use dialect::{Delta, StreamState};
use reasoning::{Segment, TagExtractor};
use registry::ModelRoute;
use sse::SseDecoder;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid model id '{0}', expected 'provider:model'")]
    InvalidModelId(String),

    #[error("Unknown model provider '{0}'")]
    UnknownProvider(String),

    #[error("No API key configured for provider '{0}'")]
    MissingApiKey(Provider),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 0.9,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// Sampling parameters as sent by the pages: every field optional.
/// Explicit values, including zero, are kept; missing ones take the default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingOverrides {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
}

impl SamplingOverrides {
    pub fn resolve(&self, defaults: SamplingParams) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            top_p: self.top_p.unwrap_or(defaults.top_p),
            frequency_penalty: self.frequency_penalty.unwrap_or(defaults.frequency_penalty),
            presence_penalty: self.presence_penalty.unwrap_or(defaults.presence_penalty),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: ModelId,
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub params: SamplingParams,
    /// Tag wrapping inline reasoning for models that emit it in the text.
    pub reasoning_tag: &'static str,
}

impl CompletionRequest {
    pub fn new(model: ModelId, system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            system: system.into(),
            messages,
            params: SamplingParams::default(),
            reasoning_tag: "think",
        }
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_reasoning_tag(mut self, tag: &'static str) -> Self {
        self.reasoning_tag = tag;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Other,
    Unknown,
}

impl FinishReason {
    pub fn from_provider(raw: Option<&str>) -> Self {
        match raw {
            Some("stop") | Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
            Some("length") | Some("max_tokens") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some("tool_calls") | Some("tool_use") | Some("function_call") => {
                FinishReason::ToolCalls
            }
            Some(_) => FinishReason::Other,
            None => FinishReason::Unknown,
        }
    }
}

/// One item of a normalized model stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Text(String),
    Reasoning(String),
    Finish {
        finish_reason: FinishReason,
        usage: Usage,
    },
}

pub type EventStream = BoxStream<'static, Result<StreamEvent, LlmError>>;

/// A fully collected completion.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub reasoning: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Usage,
}

/// Upper bound on a single retry wait.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Exponential backoff before retry `attempt` (1-based): 1s, 2s, 4s, ... capped.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    Duration::from_millis(1000u64.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// The single LLM client used by all services.
/// Resolves models through the registry and normalizes every provider stream.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    registry: Arc<ModelRegistry>,
    max_retries: u32,
}

impl LlmClient {
    pub fn new(registry: ModelRegistry, timeout: Duration, max_retries: u32) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            registry: Arc::new(registry),
            max_retries,
        })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Starts a streaming completion.
    /// Errors before the first byte (bad model id, missing key, HTTP status)
    /// are returned directly; errors after that arrive inside the stream.
    pub async fn stream(&self, request: &CompletionRequest) -> Result<EventStream, LlmError> {
        let route = self.registry.resolve(&request.model)?;
        let body = dialect::request_body(&route, request);

        debug!(
            model = %request.model,
            provider = %route.provider,
            upstream_model = %route.upstream_model,
            messages = request.messages.len(),
            "Starting LLM stream"
        );

        let response = self.send(&route, &body).await?;
        let tag = route.tagged_reasoning.then_some(request.reasoning_tag);
        Ok(event_stream(response, route, tag))
    }

    /// Runs a completion to the end and returns the concatenated output.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let mut stream = self.stream(request).await?;
        let mut completion = Completion::default();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Text(text) => completion.text.push_str(&text),
                StreamEvent::Reasoning(reasoning) => completion.reasoning.push_str(&reasoning),
                StreamEvent::Finish {
                    finish_reason,
                    usage,
                } => {
                    completion.finish_reason = Some(finish_reason);
                    completion.usage = usage;
                }
            }
        }

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            completion.usage.prompt_tokens, completion.usage.completion_tokens
        );

        Ok(completion)
    }

    /// Convenience method that runs a completion and deserializes the text as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        request: &CompletionRequest,
    ) -> Result<T, LlmError> {
        let completion = self.complete(request).await?;
        if completion.text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_json_fences(&completion.text);

        serde_json::from_str(text).map_err(LlmError::Parse)
    }

    /// Sends the request, retrying on 429 (rate limit) and 5xx with exponential backoff.
    async fn send(
        &self,
        route: &ModelRoute,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let builder = self.client.post(&route.url).json(body);
            let response = match dialect::apply_auth(builder, route).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: dialect::error_message(&body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: dialect::error_message(&body),
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::EmptyContent))
    }
}

fn event_stream(
    response: reqwest::Response,
    route: ModelRoute,
    reasoning_tag: Option<&'static str>,
) -> EventStream {
    let stream = stream! {
        let mut bytes = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut state = StreamState::default();
        let mut extractor = reasoning_tag.map(TagExtractor::new);

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(LlmError::Http(e));
                    return;
                }
            };

            for event in decoder.push(&chunk) {
                match state.parse(route.dialect, &event) {
                    Ok(deltas) => {
                        for item in split_reasoning(&mut extractor, deltas) {
                            yield Ok(item);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
                if state.done {
                    break;
                }
            }
            if state.done {
                break;
            }
        }

        if !state.done {
            if let Some(event) = decoder.finish() {
                match state.parse(route.dialect, &event) {
                    Ok(deltas) => {
                        for item in split_reasoning(&mut extractor, deltas) {
                            yield Ok(item);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        if let Some(extractor) = extractor.as_mut() {
            for segment in extractor.flush() {
                yield Ok(segment.into());
            }
        }

        yield Ok(StreamEvent::Finish {
            finish_reason: state.finish_reason(),
            usage: state.usage,
        });
    };

    Box::pin(stream)
}

fn split_reasoning(extractor: &mut Option<TagExtractor>, deltas: Vec<Delta>) -> Vec<StreamEvent> {
    let mut events = Vec::with_capacity(deltas.len());
    for delta in deltas {
        match (delta, extractor.as_mut()) {
            (Delta::Text(text), Some(extractor)) => {
                events.extend(extractor.push(&text).into_iter().map(StreamEvent::from))
            }
            (Delta::Text(text), None) => events.push(StreamEvent::Text(text)),
            (Delta::Reasoning(reasoning), _) => events.push(StreamEvent::Reasoning(reasoning)),
        }
    }
    events
}

impl From<Segment> for StreamEvent {
    fn from(segment: Segment) -> Self {
        match segment {
            Segment::Text(text) => StreamEvent::Text(text),
            Segment::Reasoning(reasoning) => StreamEvent::Reasoning(reasoning),
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! SSE bodies shaped like real provider streams, for wiremock.

    pub fn openai_sse(deltas: &[&str]) -> String {
        let mut body = String::new();
        for delta in deltas {
            let chunk = serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion.chunk",
                "choices": [{"index": 0, "delta": {"content": delta}, "finish_reason": null}]
            });
            body.push_str(&format!("data: {chunk}\n\n"));
        }
        body.push_str(
            "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        );
        body.push_str(
            "data: {\"id\":\"chatcmpl-1\",\"choices\":[],\"usage\":{\"prompt_tokens\":11,\"completion_tokens\":4,\"total_tokens\":15}}\n\n",
        );
        body.push_str("data: [DONE]\n\n");
        body
    }
}
