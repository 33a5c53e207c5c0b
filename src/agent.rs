//! LLM agent module for summarisation.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint: the chosen
//! strategy prompt goes in the system turn, the extracted text in the
//! user turn, and the first choice plus the reported token total come
//! back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Completions can be slow on long inputs; allow well beyond the
/// scraping timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("request to completion service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion service error ({status}): {body}")]
    Service { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Generated text plus the token count the service reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: u32,
}

/// Summarisation seam used by the pipeline.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarise `text` under the given system `prompt`.
    async fn summarize(&self, text: &str, prompt: &str) -> Result<Completion, AgentError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Production summariser against the OpenAI chat-completions API.
pub struct OpenAiAgent {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiAgent {
    /// Create an agent for the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Set a custom base URL (useful for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_request<'a>(&'a self, text: &'a str, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        }
    }
}

/// Pull out exactly the first choice's content and the token total.
fn completion_from(response: ChatResponse) -> Result<Completion, AgentError> {
    let ChatResponse { choices, usage } = response;
    let text = choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AgentError::MalformedResponse("response contained no choices".to_string()))?;
    Ok(Completion {
        text,
        tokens_used: usage.total_tokens,
    })
}

#[async_trait]
impl Summarizer for OpenAiAgent {
    async fn summarize(&self, text: &str, prompt: &str) -> Result<Completion, AgentError> {
        let request = self.build_request(text, prompt);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "completion service returned an error");
            return Err(AgentError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedResponse(e.to_string()))?;
        let completion = completion_from(parsed)?;

        debug!(
            model = %self.model,
            tokens = completion.tokens_used,
            "completion finished"
        );
        Ok(completion)
    }
}
