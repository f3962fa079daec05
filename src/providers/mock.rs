/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scriptable provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::fail_first(n)` - Fails transiently n times, then succeeds
 * - `MockProvider::failing()` - Always fails with a transient server error
 * - `MockProvider::unauthorized()` - Fails with a permanent authentication error
 *
 * Clones share their counters and recorded requests, so a test can keep a
 * handle while the pipeline owns another.
 */

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{Provider, TranslationRequest, TranslationResponse};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Succeeds with items in reverse order
    Reversed,
    /// Leaves out the last item
    DropLast,
    /// Leaves out the last item for the first `n` requests, then works
    DropLastFirst { n: usize },
    /// Relabels the last item with the first item's token
    DuplicateFirst,
    /// Relabels the first item with a token that was never sent
    UnknownToken,
    /// Returns an empty translation for the first item
    EmptyTranslation,
    /// Fails transiently for the first `n` requests, then works
    FailFirst { n: usize },
    /// Always fails with a server error
    Failing,
    /// Always fails with a rate limit error
    RateLimited,
    /// Always fails with an authentication error
    Unauthorized,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Simulated latency per request
    delay: Duration,
    /// Requests containing any of these tokens fail with a server error
    failing_tokens: Arc<HashSet<String>>,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<TranslationRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            failing_tokens: Arc::new(HashSet::new()),
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn fail_first(n: usize) -> Self {
        Self::new(MockBehavior::FailFirst { n })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn unauthorized() -> Self {
        Self::new(MockBehavior::Unauthorized)
    }

    /// Simulate a slow service
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every request that carries one of these tokens
    pub fn with_failing_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing_tokens = Arc::new(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Translation produced for each item by the working behaviors
    pub fn translate_text(text: &str, target_language: &str) -> String {
        text.lines()
            .map(|line| format!("[{}] {}", target_language, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every request received so far, in arrival order
    pub fn recorded_requests(&self) -> Vec<TranslationRequest> {
        self.requests.lock().clone()
    }

    fn respond(&self, request: &TranslationRequest, count: usize) -> Result<TranslationResponse, ProviderError> {
        if request.items.iter().any(|item| self.failing_tokens.contains(&item.token)) {
            return Err(ProviderError::ApiError {
                status_code: 503,
                message: "Simulated failure for selected token".to_string(),
            });
        }

        let translated = || {
            TranslationResponse::from_pairs(
                request
                    .items
                    .iter()
                    .map(|item| (item.token.clone(), Self::translate_text(&item.text, &request.target_language))),
            )
        };

        match self.behavior {
            MockBehavior::Working => Ok(translated()),
            MockBehavior::Reversed => {
                let mut response = translated();
                response.items.reverse();
                Ok(response)
            }
            MockBehavior::DropLast => {
                let mut response = translated();
                response.items.pop();
                Ok(response)
            }
            MockBehavior::DropLastFirst { n } if count < n => {
                let mut response = translated();
                response.items.pop();
                Ok(response)
            }
            MockBehavior::DropLastFirst { .. } => Ok(translated()),
            MockBehavior::DuplicateFirst => {
                let mut response = translated();
                if let Some(first_token) = response.items.first().map(|i| i.token.clone()) {
                    if let Some(last) = response.items.last_mut() {
                        last.token = first_token;
                    }
                }
                Ok(response)
            }
            MockBehavior::UnknownToken => {
                let mut response = translated();
                if let Some(first) = response.items.first_mut() {
                    first.token = "ENTRY_999999".to_string();
                }
                Ok(response)
            }
            MockBehavior::EmptyTranslation => {
                let mut response = translated();
                if let Some(first) = response.items.first_mut() {
                    first.translated_text = "   ".to_string();
                }
                Ok(response)
            }
            MockBehavior::FailFirst { n } if count < n => Err(ProviderError::ApiError {
                status_code: 503,
                message: format!("Simulated transient failure (request #{})", count + 1),
            }),
            MockBehavior::FailFirst { .. } => Ok(translated()),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),
            MockBehavior::RateLimited => Err(ProviderError::RateLimitExceeded("Simulated rate limit".to_string())),
            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError("Simulated invalid key".to_string())),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &TranslationRequest) -> Result<TranslationResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = self.respond(request, count);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError("Simulated invalid key".to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
