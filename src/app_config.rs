use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::language_utils::LanguagePair;
use crate::translation::retry::RetryPolicy;

/// Application configuration module
/// This module handles loading, validating and saving configuration settings.
pub const DEFAULT_CONFIG_FILE: &str = "conf.json";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code, None to let the provider detect it
    #[serde(default)]
    pub source_language: Option<String>,

    /// Target language code (ISO 639-1)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation provider settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batching, concurrency and retry settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama
    Ollama,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    pub const ALL: [TranslationProvider; 5] = [
        Self::Gemini,
        Self::OpenAI,
        Self::Anthropic,
        Self::Ollama,
        Self::LMStudio,
    ];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    // @returns: Environment variable holding the API key, if the provider needs one
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GOOGLE_AI_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama | Self::LMStudio => None,
        }
    }

    pub fn default_model(&self) -> String {
        match self {
            Self::Gemini => "gemini-2.0-flash".to_string(),
            Self::OpenAI => "gpt-4o-mini".to_string(),
            Self::Anthropic => "claude-3-5-haiku-latest".to_string(),
            Self::Ollama => "llama3.2:3b".to_string(),
            // Placeholder; set to the model loaded in LM Studio
            Self::LMStudio => "local-model".to_string(),
        }
    }

    pub fn default_endpoint(&self) -> String {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta".to_string(),
            Self::OpenAI => "https://api.openai.com/v1".to_string(),
            Self::Anthropic => "https://api.anthropic.com".to_string(),
            Self::Ollama => "http://localhost:11434".to_string(),
            Self::LMStudio => "http://localhost:1234/v1".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key, empty to read it from the environment
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: provider_type.default_model(),
            api_key: String::new(),
            endpoint: provider_type.default_endpoint(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Replaces the built-in system prompt
    /// Placeholders: {source_language}, {target_language}
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            temperature: default_temperature(),
        }
    }
}

/// Batching, concurrency and retry settings for the translation pipeline
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Maximum cues per batch
    #[serde(default = "default_max_entries_per_batch")]
    pub max_entries_per_batch: usize,

    /// Maximum batches in flight at once
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Retries after the first attempt of a batch
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, doubled on each further retry
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,

    /// Upper bound for any single retry delay
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,

    /// Timeout for one request/response round trip
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Random extra delay in [0, jitter) added to each retry delay
    #[serde(default)]
    pub jitter_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_entries_per_batch: default_max_entries_per_batch(),
            concurrency_limit: default_concurrency_limit(),
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            jitter_secs: 0.0,
        }
    }
}

impl PipelineConfig {
    /// Check every value before any work starts
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_entries_per_batch == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        let delays_valid = self.base_delay_secs.is_finite()
            && self.max_delay_secs.is_finite()
            && self.jitter_secs.is_finite()
            && self.base_delay_secs >= 0.0
            && self.jitter_secs >= 0.0
            && self.max_delay_secs >= self.base_delay_secs;
        if !delays_valid {
            return Err(ConfigError::InvalidDelay {
                base_secs: self.base_delay_secs,
                max_secs: self.max_delay_secs,
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs_f64(self.max_delay_secs.max(0.0)),
            jitter: Duration::from_secs_f64(self.jitter_secs.max(0.0)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_entries_per_batch() -> usize {
    200
}

fn default_concurrency_limit() -> usize {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_secs() -> f64 {
    1.0
}

fn default_max_delay_secs() -> f64 {
    60.0
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.language_pair()?;
        self.pipeline.validate()?;

        let provider = &self.translation.provider;
        if let Some(env_var) = provider.api_key_env_var() {
            if self.translation.get_api_key().is_empty() {
                return Err(ConfigError::MissingApiKey {
                    provider: provider.display_name().to_string(),
                    env_var: env_var.to_string(),
                });
            }
        }

        let endpoint = self.translation.get_endpoint();
        url::Url::parse(&endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;

        if !(0.0..=2.0).contains(&self.translation.common.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.translation.common.temperature
            )));
        }

        Ok(())
    }

    /// Normalized source and target languages
    pub fn language_pair(&self) -> std::result::Result<LanguagePair, ConfigError> {
        LanguagePair::validated(self.source_language.as_deref(), &self.target_language)
    }

    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Load the configuration, writing a default file when none exists
    pub fn load_or_create(explicit_path: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = resolve_config_path(explicit_path);
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            return Ok((Self::from_file(&path)?, path));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(&path)?;
        Ok((config, path))
    }

    /// Replace the model of the active provider
    pub fn set_model(&mut self, model: &str) -> Result<()> {
        let provider_name = self.translation.provider.to_string();
        let provider_config = self
            .translation
            .active_provider_config_mut()
            .ok_or_else(|| anyhow!("No configuration for provider {}", provider_name))?;
        provider_config.model = model.to_string();
        Ok(())
    }
}

/// Explicit path, then ./conf.json, then the user config directory
pub fn resolve_config_path(explicit_path: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit_path {
        return path.to_path_buf();
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    if let Some(user_config) = dirs::config_dir().map(|dir| dir.join("srtwai").join(DEFAULT_CONFIG_FILE)) {
        if user_config.exists() {
            return user_config;
        }
    }
    local
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: None,
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    fn active_provider_config_mut(&mut self) -> Option<&mut ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        if !self.available_providers.iter().any(|p| p.provider_type == provider_str) {
            self.available_providers.push(ProviderConfig::new(self.provider.clone()));
        }
        self.available_providers.iter_mut().find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.model.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// API key from the config, falling back to the provider's environment variable
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }
        self.provider
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
            .map(|key| key.trim().to_string())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.endpoint.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: TranslationProvider::ALL.iter().cloned().map(ProviderConfig::new).collect(),
            common: TranslationCommonConfig::default(),
        }
    }
}
