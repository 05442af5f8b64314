//! Line-oriented data stream encoding consumed by the chat pages.
//!
//! Every part is `{code}:{json}\n`. A stream starts with `f:` carrying the
//! message id, carries `0:` text and `g:` reasoning parts, and closes with an
//! `e:` step-finish part followed by a `d:` message-finish part. An upstream
//! failure mid-stream becomes a single `3:` part and ends the stream.

use std::convert::Infallible;

use async_stream::stream;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::llm_client::{EventStream, FinishReason, StreamEvent, Usage};

pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";

/// Shown to the client in place of upstream error details, which are logged.
pub const STREAM_ERROR_MESSAGE: &str = "An error occurred.";

#[derive(Debug, Clone, PartialEq)]
pub enum DataStreamPart {
    Start { message_id: String },
    Text(String),
    Reasoning(String),
    Error(String),
    FinishStep {
        finish_reason: FinishReason,
        usage: Usage,
    },
    FinishMessage {
        finish_reason: FinishReason,
        usage: Usage,
    },
}

impl DataStreamPart {
    pub fn encode(&self) -> String {
        let (code, value) = match self {
            DataStreamPart::Start { message_id } => ('f', json!({ "messageId": message_id })),
            DataStreamPart::Text(text) => ('0', json!(text)),
            DataStreamPart::Reasoning(reasoning) => ('g', json!(reasoning)),
            DataStreamPart::Error(message) => ('3', json!(message)),
            DataStreamPart::FinishStep {
                finish_reason,
                usage,
            } => (
                'e',
                json!({
                    "finishReason": finish_reason,
                    "usage": usage,
                    "isContinued": false,
                }),
            ),
            DataStreamPart::FinishMessage {
                finish_reason,
                usage,
            } => (
                'd',
                json!({
                    "finishReason": finish_reason,
                    "usage": usage,
                }),
            ),
        };
        format!("{code}:{value}\n")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DataStreamOptions {
    pub send_reasoning: bool,
    /// Name of the calling feature, used in log lines.
    pub label: &'static str,
}

/// Maps normalized model events onto data stream parts.
/// Events the client should not see map to nothing.
pub fn parts_for(event: StreamEvent, send_reasoning: bool) -> Vec<DataStreamPart> {
    match event {
        StreamEvent::Text(text) if text.is_empty() => Vec::new(),
        StreamEvent::Text(text) => vec![DataStreamPart::Text(text)],
        StreamEvent::Reasoning(reasoning) if send_reasoning && !reasoning.is_empty() => {
            vec![DataStreamPart::Reasoning(reasoning)]
        }
        StreamEvent::Reasoning(_) => Vec::new(),
        StreamEvent::Finish {
            finish_reason,
            usage,
        } => vec![
            DataStreamPart::FinishStep {
                finish_reason,
                usage,
            },
            DataStreamPart::FinishMessage {
                finish_reason,
                usage,
            },
        ],
    }
}

/// Wraps a model event stream into a streamed HTTP response.
/// The body is produced as upstream deltas arrive; dropping it drops the
/// upstream request.
pub fn data_stream_response(events: EventStream, options: DataStreamOptions) -> Response {
    let message_id = format!("msg-{}", Uuid::new_v4().simple());

    let body = stream! {
        let mut events = events;
        yield Ok::<_, Infallible>(Bytes::from(
            DataStreamPart::Start { message_id: message_id.clone() }.encode(),
        ));

        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let StreamEvent::Finish { finish_reason, usage } = &event {
                        info!(
                            feature = options.label,
                            message_id = %message_id,
                            finish_reason = ?finish_reason,
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            "Stream finished"
                        );
                    }
                    for part in parts_for(event, options.send_reasoning) {
                        yield Ok(Bytes::from(part.encode()));
                    }
                }
                Err(e) => {
                    error!(feature = options.label, message_id = %message_id, "Stream failed: {e}");
                    yield Ok(Bytes::from(
                        DataStreamPart::Error(STREAM_ERROR_MESSAGE.to_string()).encode(),
                    ));
                    break;
                }
            }
        }
    };

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (
                header::HeaderName::from_static(DATA_STREAM_HEADER),
                HeaderValue::from_static("v1"),
            ),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;

    fn usage() -> Usage {
        Usage {
            prompt_tokens: 3,
            completion_tokens: 5,
        }
    }

    #[test]
    fn test_text_part_is_json_string() {
        assert_eq!(
            DataStreamPart::Text("say \"hi\"\n".into()).encode(),
            "0:\"say \\\"hi\\\"\\n\"\n"
        );
    }

    #[test]
    fn test_finish_parts() {
        let step = DataStreamPart::FinishStep {
            finish_reason: FinishReason::Stop,
            usage: usage(),
        }
        .encode();
        let step: serde_json::Value =
            serde_json::from_str(step.strip_prefix("e:").unwrap().trim_end()).unwrap();
        assert_eq!(
            step,
            json!({
                "finishReason": "stop",
                "usage": {"promptTokens": 3, "completionTokens": 5},
                "isContinued": false
            })
        );

        let done = DataStreamPart::FinishMessage {
            finish_reason: FinishReason::ContentFilter,
            usage: usage(),
        }
        .encode();
        assert!(done.starts_with("d:{\"finishReason\":\"content-filter\""));
    }

    #[test]
    fn test_reasoning_is_dropped_unless_requested() {
        let event = StreamEvent::Reasoning("hmm".into());
        assert!(parts_for(event.clone(), false).is_empty());
        assert_eq!(
            parts_for(event, true),
            vec![DataStreamPart::Reasoning("hmm".into())]
        );
    }

    #[tokio::test]
    async fn test_response_body_and_headers() {
        let events: EventStream = Box::pin(futures::stream::iter(vec![
            Ok(StreamEvent::Reasoning("think".into())),
            Ok(StreamEvent::Text("Hi".into())),
            Ok(StreamEvent::Finish {
                finish_reason: FinishReason::Stop,
                usage: usage(),
            }),
        ]));

        let response = data_stream_response(
            events,
            DataStreamOptions {
                send_reasoning: true,
                label: "test",
            },
        );
        assert_eq!(response.headers()[DATA_STREAM_HEADER], "v1");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("f:{\"messageId\":\"msg-"));
        assert_eq!(lines[1], "g:\"think\"");
        assert_eq!(lines[2], "0:\"Hi\"");
        assert!(lines[3].starts_with("e:"));
        assert!(lines[4].starts_with("d:"));
    }

    #[tokio::test]
    async fn test_error_mid_stream_ends_with_error_part() {
        let events: EventStream = Box::pin(futures::stream::iter(vec![
            Ok(StreamEvent::Text("partial".into())),
            Err(LlmError::Stream("connection reset".into())),
            Ok(StreamEvent::Text("never sent".into())),
        ]));

        let response = data_stream_response(
            events,
            DataStreamOptions {
                send_reasoning: false,
                label: "test",
            },
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();

        assert!(body.contains("0:\"partial\"\n"));
        assert!(body.ends_with("3:\"An error occurred.\"\n"));
        assert!(!body.contains("never sent"));
    }
}
