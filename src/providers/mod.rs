/*!
 * Provider implementations for different translation services.
 *
 * Every provider speaks the same narrow contract: a request carrying
 * token-labelled items and a response mapping each token to its translation.
 * This module contains client implementations for:
 * - Gemini: Google Generative Language API
 * - OpenAI: OpenAI chat completions, also used for LM Studio
 * - Anthropic: Anthropic messages API
 * - Ollama: Local LLM server
 * - Mock: scriptable provider for tests
 */

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::{ConfigError, ProviderError};

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;

/// One cue's text labelled with its placeholder token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestItem {
    pub token: String,
    pub text: String,
}

/// A batch translation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// None lets the service detect the source language
    pub source_language: Option<String>,
    pub target_language: String,
    pub items: Vec<RequestItem>,
}

/// One translated item; items may come back in any order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseItem {
    pub token: String,
    pub translated_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub items: Vec<ResponseItem>,
}

impl TranslationResponse {
    pub fn from_pairs<I, T, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, S)>,
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            items: pairs
                .into_iter()
                .map(|(token, text)| ResponseItem {
                    token: token.into(),
                    translated_text: text.into(),
                })
                .collect(),
        }
    }
}

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the translation client.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate every item of the request in one round trip
    async fn complete(&self, request: &TranslationRequest) -> Result<TranslationResponse, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Shared HTTP client with the per-request timeout applied
pub(crate) fn http_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {}", e)))
}

/// Read a response body and map non-success statuses to provider errors
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ProviderError::from_status(status.as_u16(), truncate_for_log(&body, 500)))
    }
}

pub(crate) fn truncate_for_log(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}

/// Build the provider selected in the configuration
pub fn build_provider(config: &TranslationConfig, timeout: Duration) -> Result<Arc<dyn Provider>, ConfigError> {
    let model = config.get_model();
    let endpoint = config.get_endpoint();
    let api_key = config.get_api_key();
    let temperature = config.common.temperature;
    let system_prompt = config.common.system_prompt.clone();

    if let Some(env_var) = config.provider.api_key_env_var() {
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey {
                provider: config.provider.display_name().to_string(),
                env_var: env_var.to_string(),
            });
        }
    }

    let provider: Arc<dyn Provider> = match config.provider {
        TranslationProvider::Gemini => Arc::new(
            gemini::Gemini::new(api_key, endpoint, model, timeout)?
                .with_temperature(temperature)
                .with_system_prompt(system_prompt),
        ),
        TranslationProvider::OpenAI | TranslationProvider::LMStudio => Arc::new(
            openai::OpenAI::new(api_key, endpoint, model, timeout)?
                .with_temperature(temperature)
                .with_system_prompt(system_prompt),
        ),
        TranslationProvider::Anthropic => Arc::new(
            anthropic::Anthropic::new(api_key, endpoint, model, timeout)?
                .with_temperature(temperature)
                .with_system_prompt(system_prompt),
        ),
        TranslationProvider::Ollama => Arc::new(
            ollama::Ollama::new(endpoint, model, timeout)?
                .with_temperature(temperature)
                .with_system_prompt(system_prompt),
        ),
    };
    Ok(provider)
}
