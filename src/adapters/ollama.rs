use crate::adapters::llm::{
    send_json, GenerationError, LLMAdapter, LLMRequest, LLMResponse, ModelConfig, Usage,
};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "Ollama";

pub struct OllamaAdapter {
    client: Client,
    config: ModelConfig,
    base_url: String,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    system: String,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    model: String,
    #[serde(default)]
    done: bool,
    prompt_eval_count: Option<usize>,
    eval_count: Option<usize>,
}

impl OllamaAdapter {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let base_url = config.base_url.clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        // Local models can be slow to load; never go below five minutes
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(300)))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }
}

#[async_trait]
impl LLMAdapter for OllamaAdapter {
    async fn complete(&self, request: LLMRequest) -> Result<LLMResponse, GenerationError> {
        let model_name = self.config.model_name
            .strip_prefix("ollama:")
            .unwrap_or(&self.config.model_name);

        let ollama_request = OllamaRequest {
            model: model_name.to_string(),
            prompt: request.user_prompt,
            system: request.system_prompt,
            options: OllamaOptions {
                temperature: request.temperature.unwrap_or(self.config.temperature),
                num_predict: request.max_tokens.unwrap_or(self.config.max_tokens),
            },
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let ollama_response: OllamaResponse =
            send_json(PROVIDER, self.client.post(&url).json(&ollama_request)).await?;

        if ollama_response.response.trim().is_empty() {
            return Err(GenerationError::empty(&self.config.model_name, "empty response"));
        }

        let prompt_tokens = ollama_response.prompt_eval_count.unwrap_or(0);
        let completion_tokens = ollama_response.eval_count.unwrap_or(0);

        Ok(LLMResponse {
            content: ollama_response.response,
            model: ollama_response.model,
            usage: ollama_response.done.then_some(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}
