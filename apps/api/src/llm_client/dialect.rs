//! Request bodies and stream-event parsing for each provider wire format.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm_client::registry::{Dialect, ModelRoute};
use crate::llm_client::sse::SseEvent;
use crate::llm_client::{CompletionRequest, FinishReason, LlmError, Role, Usage};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A raw delta before tagged reasoning is split out.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Text(String),
    Reasoning(String),
}

pub fn request_body(route: &ModelRoute, request: &CompletionRequest) -> Value {
    let params = &request.params;
    match route.dialect {
        Dialect::OpenAiCompatible => {
            let mut messages = Vec::with_capacity(request.messages.len() + 1);
            if !request.system.trim().is_empty() {
                messages.push(json!({ "role": "system", "content": request.system }));
            }
            messages.extend(
                request
                    .messages
                    .iter()
                    .map(|m| json!({ "role": m.role.as_str(), "content": m.content })),
            );

            json!({
                "model": route.upstream_model,
                "messages": messages,
                "stream": true,
                "stream_options": { "include_usage": true },
                "temperature": params.temperature,
                "max_tokens": params.max_tokens,
                "top_p": params.top_p,
                "frequency_penalty": params.frequency_penalty,
                "presence_penalty": params.presence_penalty,
            })
        }
        Dialect::Anthropic => {
            // The messages API takes the system prompt out of band.
            let mut system = request.system.trim().to_string();
            for extra in request.messages.iter().filter(|m| m.role == Role::System) {
                if !system.is_empty() {
                    system.push_str("\n\n");
                }
                system.push_str(&extra.content);
            }
            let messages: Vec<Value> = request
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                .collect();

            let mut body = json!({
                "model": route.upstream_model,
                "messages": messages,
                "max_tokens": params.max_tokens,
                "temperature": params.temperature,
                "top_p": params.top_p,
                "stream": true,
            });
            if !system.is_empty() {
                body["system"] = Value::String(system);
            }
            body
        }
    }
}

pub fn apply_auth(
    builder: reqwest::RequestBuilder,
    route: &ModelRoute,
) -> reqwest::RequestBuilder {
    match route.dialect {
        Dialect::OpenAiCompatible => builder.bearer_auth(&route.api_key),
        Dialect::Anthropic => builder
            .header("x-api-key", &route.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION),
    }
}

/// Extracts a readable message from a provider error body.
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }

    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Stream state
// ────────────────────────────────────────────────────────────────────────────

/// Accumulates finish metadata while a stream is parsed.
#[derive(Debug, Default)]
pub struct StreamState {
    pub finish_reason: Option<String>,
    pub usage: Usage,
    pub done: bool,
}

impl StreamState {
    pub fn parse(&mut self, dialect: Dialect, event: &SseEvent) -> Result<Vec<Delta>, LlmError> {
        match dialect {
            Dialect::OpenAiCompatible => self.parse_openai(&event.data),
            Dialect::Anthropic => self.parse_anthropic(&event.data),
        }
    }

    pub fn finish_reason(&self) -> FinishReason {
        FinishReason::from_provider(self.finish_reason.as_deref())
    }

    fn parse_openai(&mut self, data: &str) -> Result<Vec<Delta>, LlmError> {
        if data.trim() == "[DONE]" {
            self.done = true;
            return Ok(vec![]);
        }

        let chunk: OpenAiChunk = serde_json::from_str(data)?;
        if let Some(error) = chunk.error {
            return Err(LlmError::Stream(error.message));
        }
        if let Some(usage) = chunk.usage {
            self.usage = Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            };
        }

        let mut deltas = Vec::new();
        for choice in chunk.choices {
            if let Some(reasoning) = choice.delta.reasoning_content.or(choice.delta.reasoning) {
                if !reasoning.is_empty() {
                    deltas.push(Delta::Reasoning(reasoning));
                }
            }
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    deltas.push(Delta::Text(content));
                }
            }
            if choice.finish_reason.is_some() {
                self.finish_reason = choice.finish_reason;
            }
        }
        Ok(deltas)
    }

    fn parse_anthropic(&mut self, data: &str) -> Result<Vec<Delta>, LlmError> {
        let event: AnthropicEvent = serde_json::from_str(data)?;
        let delta = match event {
            AnthropicEvent::MessageStart { message } => {
                if let Some(usage) = message.usage {
                    self.usage.prompt_tokens = usage.input_tokens.unwrap_or(0);
                }
                None
            }
            AnthropicEvent::ContentBlockDelta { delta } => match delta {
                AnthropicDelta::TextDelta { text } => Some(Delta::Text(text)),
                AnthropicDelta::ThinkingDelta { thinking } => Some(Delta::Reasoning(thinking)),
                AnthropicDelta::Other => None,
            },
            AnthropicEvent::MessageDelta { delta, usage } => {
                if delta.stop_reason.is_some() {
                    self.finish_reason = delta.stop_reason;
                }
                if let Some(output) = usage.and_then(|u| u.output_tokens) {
                    self.usage.completion_tokens = output;
                }
                None
            }
            AnthropicEvent::MessageStop => {
                self.done = true;
                None
            }
            AnthropicEvent::Error { error } => return Err(LlmError::Stream(error.message)),
            AnthropicEvent::Other => None,
        };
        Ok(delta.into_iter().filter(|d| !d.is_empty()).collect())
    }
}

impl Delta {
    fn is_empty(&self) -> bool {
        match self {
            Delta::Text(t) | Delta::Reasoning(t) => t.is_empty(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OpenAiChunk {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
    /// DeepSeek's native reasoner field.
    reasoning_content: Option<String>,
    /// Groq's `reasoning_format: parsed` field.
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    MessageStart {
        message: AnthropicMessageStart,
    },
    ContentBlockDelta {
        delta: AnthropicDelta,
    },
    MessageDelta {
        delta: AnthropicMessageDelta,
        usage: Option<AnthropicUsage>,
    },
    MessageStop,
    Error {
        error: ErrorBody,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicMessageStart {
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicDelta {
    TextDelta {
        text: String,
    },
    ThinkingDelta {
        thinking: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicMessageDelta {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}
