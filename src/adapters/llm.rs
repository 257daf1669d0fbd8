use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "gemini-pro".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.2,
            max_tokens: 4000,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Failure of a single generation call. Never retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("could not reach {provider}: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} rejected the credentials ({status}): {body}")]
    Unauthorized {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{provider} rate limit or quota exceeded: {body}")]
    RateLimited { provider: &'static str, body: String },

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {provider} response: {source}")]
    MalformedResponse {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{model} returned no usable content: {reason}")]
    EmptyResponse { model: String, reason: String },
}

impl GenerationError {
    pub fn from_status(provider: &'static str, status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GenerationError::Unauthorized { provider, status, body }
            }
            StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited { provider, body },
            _ => GenerationError::Api { provider, status, body },
        }
    }

    pub fn empty(model: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerationError::EmptyResponse {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

/// Sends one request and decodes the JSON body, mapping every failure to a
/// `GenerationError`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, GenerationError> {
    let response = request
        .send()
        .await
        .map_err(|source| GenerationError::Transport { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GenerationError::from_status(provider, status, body));
    }

    response
        .json::<T>()
        .await
        .map_err(|source| GenerationError::MalformedResponse { provider, source })
}

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn complete(&self, request: LLMRequest) -> Result<LLMResponse, GenerationError>;
    fn model_name(&self) -> &str;
}

pub fn create_adapter(config: &ModelConfig) -> Result<Box<dyn LLMAdapter>> {
    match config.model_name.as_str() {
        name if name.starts_with("gemini") => {
            Ok(Box::new(crate::adapters::GeminiAdapter::new(config.clone())?))
        }
        name if name.starts_with("claude") => {
            Ok(Box::new(crate::adapters::AnthropicAdapter::new(config.clone())?))
        }
        name if name.starts_with("gpt-") || name.starts_with("o1-") => {
            Ok(Box::new(crate::adapters::OpenAIAdapter::new(config.clone())?))
        }
        name if name.starts_with("ollama:") => {
            Ok(Box::new(crate::adapters::OllamaAdapter::new(config.clone())?))
        }
        _name if config.base_url.as_ref().map_or(false, |u| u.contains("11434")) => {
            Ok(Box::new(crate::adapters::OllamaAdapter::new(config.clone())?))
        }
        // Anything else is assumed to speak the OpenAI chat API
        _ => Ok(Box::new(crate::adapters::OpenAIAdapter::new(config.clone())?)),
    }
}
