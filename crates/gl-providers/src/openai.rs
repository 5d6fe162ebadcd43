//! Chat-completions client for any OpenAI-compatible endpoint.
//!
//! `complete` posts a regular request and returns the first choice; `stream`
//! posts with `"stream": true` and turns the server-sent events into text
//! deltas. Calls are stateless and never cancelled: the engine discards
//! results it no longer wants.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, StreamExt};
use gl_core::{ChatMessage, LessonError};
use gl_runtime::{GenerationRequest, TextGenerator, TextStream};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error_map::{map_provider, map_provider_client};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl ProviderSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    settings: ProviderSettings,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, LessonError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.request_timeout)
            .build()
            .map_err(map_provider_client)?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest, stream: bool) -> ChatCompletionBody<'a> {
        ChatCompletionBody {
            model: &self.settings.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    async fn post(
        &self,
        body: &ChatCompletionBody<'_>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<reqwest::Response> {
        let mut builder = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(body);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder
            .send()
            .await
            .context("chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("chat completion returned {status}: {}", detail.trim());
        }
        Ok(response)
    }

    async fn complete_inner(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        let body = self.body(request, false);
        let response = self.post(&body, Some(self.settings.request_timeout)).await?;
        let raw = response
            .text()
            .await
            .context("chat completion body could not be read")?;
        parse_completion(&raw)
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<String, LessonError> {
        debug!(
            model = %self.settings.model,
            max_tokens = request.max_tokens,
            "requesting completion"
        );
        self.complete_inner(request)
            .await
            .map_err(|error| map_provider("PROVIDER_REQUEST_FAILED", error))
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<TextStream, LessonError> {
        debug!(
            model = %self.settings.model,
            max_tokens = request.max_tokens,
            "requesting streamed completion"
        );
        let body = self.body(request, true);
        // A whole-request timeout would also cut off a slow stream body, so
        // only the wait for response headers is bounded here.
        let response = tokio::time::timeout(self.settings.request_timeout, self.post(&body, None))
            .await
            .map_err(|_| {
                LessonError::new(
                    "PROVIDER_TIMEOUT",
                    format!(
                        "no response headers within {} ms",
                        self.settings.request_timeout.as_millis()
                    ),
                )
            })?
            .map_err(|error| map_provider("PROVIDER_REQUEST_FAILED", error))?;

        let deltas = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                future::ready(!matches!(event, Ok(event) if event.data.trim() == DONE_SENTINEL))
            })
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) => {
                        trace!(data = %event.data, "stream event");
                        parse_delta(&event.data)
                            .map_err(|error| map_provider("PROVIDER_STREAM_INVALID", error))
                            .transpose()
                    }
                    Err(error) => Some(Err(LessonError::new(
                        "PROVIDER_STREAM_FAILED",
                        error.to_string(),
                    ))),
                })
            });
        Ok(deltas.boxed())
    }
}

fn parse_completion(raw: &str) -> anyhow::Result<String> {
    let response: CompletionResponse =
        serde_json::from_str(raw).context("chat completion body is not valid JSON")?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("chat completion returned no content"))?;
    Ok(content)
}

/// Text carried by one SSE data payload, if any. Role-only and keepalive
/// chunks yield `None`.
fn parse_delta(data: &str) -> anyhow::Result<Option<String>> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .with_context(|| format!("stream chunk is not valid JSON: {data}"))?;
    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        bail!("stream reported an error: {message}");
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

#[cfg(test)]
mod openai_tests {
    use super::*;

    fn client(base_url: &str) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new(ProviderSettings {
            base_url: base_url.to_string(),
            ..ProviderSettings::new("test-key")
        })
        .expect("client should build")
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        assert_eq!(
            client("http://localhost:8080/v1/").endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            client(DEFAULT_BASE_URL).endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn body_serializes_in_chat_completions_shape() {
        let client = client(DEFAULT_BASE_URL);
        let request = GenerationRequest {
            messages: vec![
                ChatMessage::system("You are Ka Tala."),
                ChatMessage::user("Student answer: lava"),
            ],
            temperature: 0.3,
            max_tokens: 20,
        };
        let json = serde_json::to_value(client.body(&request, true)).expect("body json");
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 20);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Student answer: lava");
    }

    #[test]
    fn completion_content_is_taken_from_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Tama!"}}]}"#;
        assert_eq!(parse_completion(raw).expect("content"), "Tama!");

        let empty = parse_completion(r#"{"choices":[]}"#).expect_err("no content");
        assert!(empty.to_string().contains("no content"));
        assert!(parse_completion("not json").is_err());
    }

    #[test]
    fn deltas_skip_role_and_empty_chunks() {
        assert_eq!(
            parse_delta(r#"{"choices":[{"delta":{"content":"Correct! "}}]}"#).expect("delta"),
            Some("Correct! ".to_string())
        );
        assert_eq!(
            parse_delta(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).expect("delta"),
            None
        );
        assert_eq!(
            parse_delta(r#"{"choices":[{"delta":{"content":""}}]}"#).expect("delta"),
            None
        );
        assert_eq!(parse_delta(r#"{"choices":[]}"#).expect("delta"), None);
    }

    #[test]
    fn stream_errors_surface_their_message() {
        let error = parse_delta(r#"{"error":{"message":"rate limited"}}"#).expect_err("error");
        assert!(error.to_string().contains("rate limited"));
        assert!(parse_delta("{oops").is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_maps_to_provider_error() {
        let client = OpenAiCompatibleClient::new(ProviderSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_millis(500),
            ..ProviderSettings::new("test-key")
        })
        .expect("client should build");
        let request = GenerationRequest {
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 10,
        };
        let error = client.complete(&request).await.expect_err("no server");
        assert_eq!(error.code, "PROVIDER_REQUEST_FAILED");
        assert!(client.stream(&request).await.is_err());
    }

    #[tokio::test]
    async fn silent_server_times_out_before_streaming() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local address");
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = OpenAiCompatibleClient::new(ProviderSettings {
            base_url: format!("http://{}/v1", address),
            request_timeout: Duration::from_millis(200),
            ..ProviderSettings::new("test-key")
        })
        .expect("client should build");
        let request = GenerationRequest {
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 10,
        };
        let error = match client.stream(&request).await {
            Ok(_) => panic!("a silent server must not yield a stream"),
            Err(error) => error,
        };
        assert_eq!(error.code, "PROVIDER_TIMEOUT");
        server.abort();
    }
}
