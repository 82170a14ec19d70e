use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Chat assistant is not connected")]
    NotConnected,

    #[error("Chat request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Chat API error: status {0}")]
    HttpStatus(u16),

    #[error("Chat response contained no content")]
    EmptyResponse,
}

/// One turn of the chat history, in the wire format the API expects.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant", content: content.into() }
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
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Narrow chat-completions transport for the category assistant.
///
/// The core only needs one call: send the history, get raw assistant text
/// back. Everything else (action extraction, execution) happens locally.
pub struct AgentClient {
    client: reqwest::Client,
    base: String,
    model: String,
    api_key: SecretString,
}

impl AgentClient {
    pub fn new(
        client: reqwest::Client,
        base: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base))
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header(CONTENT_TYPE, "application/json")
            .json(&ChatRequest {
                model: &self.model,
                messages,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AgentError::HttpStatus(response.status().as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(content)
    }
}
