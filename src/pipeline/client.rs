//! Completion service client

use crate::config::ModelConfig;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::prompt::{ChatPrompt, SamplingParams};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Trait for completion providers
///
/// One async implementation serves both execution flavors; synchronous
/// callers go through [`crate::pipeline::BlockingPipeline`] instead of a
/// duplicated blocking client.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete a system/user message pair, returning the raw text
    async fn complete(&self, prompt: &ChatPrompt, params: SamplingParams)
    -> PipelineResult<String>;

    /// Provider name for diagnostics
    fn name(&self) -> &str;
}

/// OpenAI-compatible chat-completions provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout_secs: u64,
    ) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PipelineError::Provider(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        prompt: &ChatPrompt,
        params: SamplingParams,
    ) -> PipelineResult<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            temperature: params.temperature,
            seed: params.seed,
        };

        debug!(
            model = %self.model,
            temperature = params.temperature,
            seed = ?params.seed,
            system_len = prompt.system.len(),
            user_len = prompt.user.len(),
            "calling completion service"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Provider(format!("failed to parse API response: {e}")))?;

        response_body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Provider("no choices in response".to_string()))
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Create the completion provider from configuration
pub fn create_provider(config: &ModelConfig) -> PipelineResult<Box<dyn CompletionProvider>> {
    let api_key = config.resolve_api_key().ok_or_else(|| {
        PipelineError::Configuration(
            "API key not configured. Set OPENAI_API_KEY environment variable or add api_key to the [model] section."
                .to_string(),
        )
    })?;

    let provider = OpenAiProvider::new(
        api_key,
        config.base_url.clone(),
        config.model.clone(),
        config.request_timeout_secs,
    )?;

    Ok(Box::new(provider))
}
