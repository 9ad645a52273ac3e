//! Completion gateway — the capability boundary around the generative
//! backend.
//!
//! The pipeline only ever needs `complete(prompt, role) -> text | failure`.
//! Both the labeler and the critic are instances of this same capability,
//! differing only in which configured model name is used. The HTTP
//! implementation targets any OpenAI-compatible `/chat/completions`
//! endpoint and enforces a hard request timeout; a call must fail, not
//! hang.

use crate::config::Config;
use crate::errors::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which configured model a completion call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Labeler,
    Critic,
}

/// Capability-typed access to a completion service.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Send a prompt, return the raw text of the completion.
    async fn complete(&self, prompt: &str, role: ModelRole) -> Result<String, GatewayError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible HTTP gateway.
pub struct OpenAiGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    labeler_model: String,
    critic_model: String,
    temperature: f64,
    max_tokens: u32,
    timeout_secs: u64,
}

impl OpenAiGateway {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(GatewayError::Request)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            labeler_model: config.labeler_model.clone(),
            critic_model: config.critic_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn model_for(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Labeler => &self.labeler_model,
            ModelRole::Critic => &self.critic_model,
        }
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(&self, prompt: &str, role: ModelRole) -> Result<String, GatewayError> {
        let request = ChatRequest {
            model: self.model_for(role),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout {
                        seconds: self.timeout_secs,
                    }
                } else {
                    GatewayError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(GatewayError::Request)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GatewayError::EmptyResponse)
    }
}
