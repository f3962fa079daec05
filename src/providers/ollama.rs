use std::time::Duration;

use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ProviderError};
use crate::translation::prompts::{TranslationPromptBuilder, parse_marked_reply};

use super::{Provider, TranslationRequest, TranslationResponse, http_client, read_body, truncate_for_log};

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    model: String,
    temperature: f32,
    system_prompt: Option<String>,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
        });
        self
    }
}

impl Ollama {
    /// Create a new Ollama client from a base URL such as http://localhost:11434
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url
        } else {
            format!("http://{}", base_url)
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
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

    /// Generate text from the Ollama API
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        let body = read_body(response).await.inspect_err(|e| error!("Ollama API error: {}", e))?;

        if let Ok(generated) = serde_json::from_str::<GenerationResponse>(&body) {
            return Ok(generated);
        }

        // Some servers stream JSON lines even when asked not to
        let pieces: Vec<GenerationResponse> = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<GenerationResponse>(line).ok())
            .collect();
        if pieces.is_empty() {
            return Err(ProviderError::ParseError(format!(
                "Ollama response is not valid JSON: {}",
                truncate_for_log(&body, 500)
            )));
        }
        Ok(GenerationResponse {
            done: pieces.iter().any(|p| p.done),
            response: pieces.into_iter().map(|p| p.response).collect(),
        })
    }
}

#[async_trait]
impl Provider for Ollama {
    async fn complete(&self, request: &TranslationRequest) -> Result<TranslationResponse, ProviderError> {
        let (system, user) = TranslationPromptBuilder::new(request)
            .with_template(self.system_prompt.as_deref())
            .build();

        let api_request = GenerationRequest::new(&self.model, user)
            .system(system)
            .temperature(self.temperature);

        let response = self.generate(&api_request).await?;
        parse_marked_reply(&response.response)
    }

    /// Check the server is reachable by asking for its version
    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send().await?;
        read_body(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
