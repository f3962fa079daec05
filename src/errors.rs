/*!
 * Error types for the srtwai application.
 *
 * Each stage of the pipeline has its own error enum built with thiserror.
 * Only parse, configuration and consistency errors abort a run; provider and
 * translation errors are retried per batch and end up recorded as a
 * `BatchFailure` when retries run out.
 */

use std::time::Duration;

use thiserror::Error;

/// Errors raised while decoding or parsing SRT input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input could not be decoded with any supported text encoding
    #[error("Unable to decode subtitle file: not valid UTF-8, Latin-1 or Windows-1252")]
    Encoding,

    /// A cue block does not start with a numeric sequence number
    #[error("Invalid sequence number at line {line}: '{found}'")]
    InvalidSequenceNumber {
        /// 1-based line number in the normalized input
        line: usize,
        /// The offending line
        found: String,
    },

    /// The timing line of a cue block is missing or malformed
    #[error("Invalid timestamp line at line {line}: '{found}'")]
    InvalidTimestamp {
        /// 1-based line number in the normalized input
        line: usize,
        /// The offending line
        found: String,
    },

    /// A cue has no text after trimming
    #[error("Subtitle cue {index} has no text")]
    EmptyText {
        /// 1-based position of the cue in the file
        index: u32,
    },

    /// A cue ends before it starts
    #[error("Subtitle cue {index} ends before it starts")]
    InvertedTimeRange {
        /// 1-based position of the cue in the file
        index: u32,
    },
}

/// Invalid configuration detected before any work starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("Concurrency limit must be greater than zero")]
    InvalidConcurrency,

    #[error("Invalid retry delays: base {base_secs}s, max {max_secs}s")]
    InvalidDelay { base_secs: f64, max_secs: f64 },

    #[error("Request timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Unsupported language code: '{0}'")]
    UnsupportedLanguage(String),

    #[error("Source and target language are both '{0}'")]
    SameLanguage(String),

    #[error("No API key configured for provider {provider} (set it in the config or in {env_var})")]
    MissingApiKey { provider: String, env_var: String },

    #[error("No configuration found for provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication or permissions
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map a non-success HTTP status and its body to a provider error
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            429 => Self::RateLimitExceeded(message),
            401 | 403 => Self::AuthenticationError(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ParseError(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 408,
            Self::AuthenticationError(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// A single failed translation attempt for one batch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The round trip took longer than the request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Expected {expected} translated entries, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Missing translation for token {0}")]
    MissingToken(String),

    #[error("Token {0} appears more than once in the response")]
    DuplicateToken(String),

    #[error("Unknown token {0} in the response")]
    UnknownToken(String),

    #[error("Empty translation for token {0}")]
    EmptyTranslation(String),
}

impl TranslationError {
    /// Whether the attempt should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            _ => true,
        }
    }
}

/// A batch that could not be translated; its cues keep their original text
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Batch {batch_id} failed after {attempts} attempt(s): {error}")]
pub struct BatchFailure {
    pub batch_id: usize,
    pub attempts: u32,
    pub error: TranslationError,
}

/// The merged document does not line up with the original
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("Translated cue {0} does not exist in the original document")]
    UnknownCue(u32),

    #[error("Cue {0} was translated by more than one batch")]
    DuplicateCue(u32),

    #[error("Batch {0} reported more than once")]
    DuplicateBatch(usize),

    #[error("Cue {0} has no text or ends before it starts")]
    InvalidCue(u32),

    #[error("Timing of cue {0} changed during translation")]
    TimingMismatch(u32),

    #[error("Cue count changed: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Cue order broken at position {position}: expected index {expected}, found {found}")]
    OrderMismatch { position: usize, expected: u32, found: u32 },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Malformed subtitle input
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Translated output failed the structural checks
    #[error("Consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
