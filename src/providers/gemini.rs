use std::time::Duration;

use async_trait::async_trait;
use log::{error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{ConfigError, ProviderError};
use crate::translation::prompts::{TranslationPromptBuilder, parse_marked_reply};

use super::{Provider, TranslationRequest, TranslationResponse, http_client, read_body};

/// Client for the Google Generative Language API
#[derive(Debug)]
pub struct Gemini {
    client: Client,
    api_key: String,
    /// API base URL, e.g. https://generativelanguage.googleapis.com/v1beta
    endpoint: String,
    model: String,
    temperature: f32,
    system_prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    temperature: f32,
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// generateContent response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

impl GenerateContentRequest {
    pub fn new(system: Option<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system_instruction: system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text }],
            }),
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: user.into() }],
            }],
            generation_config: GenerationConfig { temperature },
        }
    }
}

impl GenerateContentResponse {
    /// Text of the first candidate
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        Some(content.parts.iter().map(|p| p.text.as_str()).collect())
    }
}

impl Gemini {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
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

    /// `{endpoint}/models/{model}{suffix}?key=...`
    fn model_url(&self, suffix: &str) -> Result<Url, ProviderError> {
        let raw = format!("{}/models/{}{}", self.endpoint, self.model, suffix);
        Url::parse_with_params(&raw, &[("key", self.api_key.as_str())])
            .map_err(|e| ProviderError::RequestFailed(format!("invalid Gemini URL: {}", e)))
    }

    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let url = self.model_url(":generateContent")?;
        let response = self.client.post(url).json(request).send().await?;
        let body = read_body(response).await.inspect_err(|e| error!("Gemini API error: {}", e))?;
        serde_json::from_str::<GenerateContentResponse>(&body)
            .map_err(|e| ProviderError::ParseError(format!("Gemini response: {}", e)))
    }
}

#[async_trait]
impl Provider for Gemini {
    async fn complete(&self, request: &TranslationRequest) -> Result<TranslationResponse, ProviderError> {
        let (system, user) = TranslationPromptBuilder::new(request)
            .with_template(self.system_prompt.as_deref())
            .build();

        let response = self
            .generate_content(&GenerateContentRequest::new(Some(system), user, self.temperature))
            .await?;

        let Some(text) = response.text() else {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            warn!("Gemini returned no text ({})", reason);
            return Err(ProviderError::ParseError(format!("Gemini returned no text: {}", reason)));
        };
        parse_marked_reply(&text)
    }

    /// Fetch the model metadata, which needs a valid key
    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = self.model_url("")?;
        let response = self.client.get(url).send().await?;
        read_body(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
