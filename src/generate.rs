//! Generation client for cascade.
//!
//! Wraps the chat-completions endpoint of an OpenAI-compatible service
//! behind the [`Generator`] trait. One invocation issues exactly one
//! request; retry policy lives entirely in the approval loop, which treats
//! every [`GenerationFailure`] as recoverable.
//!
//! Message ordering is fixed: the system/identity message first, then (only
//! when a repository context exists) a separate user message carrying the
//! raw context description, then the rendered prompt body. An absent
//! repository context omits the message entirely rather than sending it
//! empty.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default endpoint; override with `OPENAI_BASE_URL` for gateways.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model when neither `--model` nor `OPENAI_MODEL` is given.
pub const DEFAULT_MODEL: &str = "gpt-5";

/// A recoverable generation failure.
///
/// Deliberately not a [`crate::error::CascadeError`]: the process never
/// terminates on one of these. The diagnostic is shown to the operator, who
/// decides whether to re-run, modify, skip, or stop.
#[derive(Debug, Clone)]
pub struct GenerationFailure {
    /// Human-readable diagnostic.
    pub message: String,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GenerationFailure {}

/// One completion request: rendered prompt plus its surrounding messages.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    /// System/identity message.
    pub system: &'a str,
    /// Repository/session context description, if the session has one.
    pub repo_context: Option<&'a str>,
    /// The rendered prompt body.
    pub user: &'a str,
    /// Model identifier.
    pub model: &'a str,
}

/// Abstraction over the external text-generation call.
pub trait Generator {
    /// Issue exactly one request; no internal retries.
    fn complete(&self, request: &CompletionRequest<'_>)
    -> std::result::Result<String, GenerationFailure>;
}

/// One chat message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Assemble the ordered message list for a request.
pub fn build_messages(request: &CompletionRequest<'_>) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::new("system", request.system)];
    if let Some(repo_context) = request.repo_context {
        messages.push(ChatMessage::new("user", repo_context));
    }
    messages.push(ChatMessage::new("user", request.user));
    messages
}

/// Production client over an OpenAI-compatible HTTP endpoint.
pub struct OpenAiClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client. `timeout` bounds each call end to end; `None`
    /// means no deadline, matching a human-paced supervised session.
    pub fn new(api_key: String, base_url: String, timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build();
        Self {
            agent: config.new_agent(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

impl Generator for OpenAiClient {
    fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> std::result::Result<String, GenerationFailure> {
        let messages = build_messages(request);
        let body = ChatRequest {
            model: request.model,
            messages: &messages,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|e| GenerationFailure {
                message: format!("chat completion request failed: {}", e),
            })?;

        let parsed: ChatResponse =
            response
                .body_mut()
                .read_json()
                .map_err(|e| GenerationFailure {
                    message: format!("failed to parse chat completion response: {}", e),
                })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
