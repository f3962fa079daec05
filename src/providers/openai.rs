use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ProviderError};
use crate::translation::prompts::{TranslationPromptBuilder, parse_marked_reply};

use super::{Provider, TranslationRequest, TranslationResponse, http_client, read_body};

/// OpenAI chat completions client, also used for LM Studio's compatible server
#[derive(Debug)]
pub struct OpenAI {
    client: Client,
    /// Empty for local servers that do not check keys
    api_key: String,
    /// API base URL including the version, e.g. https://api.openai.com/v1
    endpoint: String,
    model: String,
    temperature: f32,
    system_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.into(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.into(),
                },
            ],
            temperature,
        }
    }
}

impl OpenAI {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.3,
            system_prompt: None,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.api_key)
        }
    }

    pub async fn chat(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let response = self.authorized(self.client.post(&url)).json(request).send().await?;
        let body = read_body(response).await.inspect_err(|e| error!("OpenAI API error: {}", e))?;
        serde_json::from_str::<ChatCompletionResponse>(&body)
            .map_err(|e| ProviderError::ParseError(format!("chat completion response: {}", e)))
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: &TranslationRequest) -> Result<TranslationResponse, ProviderError> {
        let (system, user) = TranslationPromptBuilder::new(request)
            .with_template(self.system_prompt.as_deref())
            .build();

        let response = self
            .chat(&ChatCompletionRequest::new(&self.model, system, user, self.temperature))
            .await?;
        let choice = response
            .choices
            .first()
            .ok_or_else(|| ProviderError::ParseError("chat completion has no choices".to_string()))?;
        parse_marked_reply(&choice.message.content)
    }

    /// List models, which checks both reachability and the key
    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/models", self.endpoint);
        let response = self.authorized(self.client.get(&url)).send().await?;
        read_body(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
