/*!
 * Core translation client.
 *
 * Turns one batch into a token-labelled request, sends it to the provider,
 * validates the reply and maps it back onto cues. Transient failures are
 * retried with capped exponential backoff. `translate_batch` never returns an
 * error: every batch ends in exactly one `TranslationOutcome`.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};

use crate::errors::{BatchFailure, TranslationError};
use crate::providers::{Provider, RequestItem, TranslationRequest, TranslationResponse};
use crate::subtitle_processor::Cue;

use super::batch::Batch;
use super::retry::RetryPolicy;

/// Prefix of every placeholder token
pub const TOKEN_PREFIX: &str = "ENTRY_";

/// Placeholder token for a cue, stable across retries
pub fn token_for(cue: &Cue) -> String {
    format!("{}{}", TOKEN_PREFIX, cue.index)
}

/// Final state of one batch
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    Success { translated_cues: Vec<Cue> },
    Failed { error: BatchFailure },
}

/// Result of translating one batch, including its retry history
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub batch_id: usize,
    pub status: OutcomeStatus,
    /// Attempts made, including the first
    pub attempts: u32,
    /// Backoff applied before each retry
    pub retry_delays: Vec<Duration>,
}

impl TranslationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }

    pub fn translated_cues(&self) -> Option<&[Cue]> {
        match &self.status {
            OutcomeStatus::Success { translated_cues } => Some(translated_cues),
            OutcomeStatus::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&BatchFailure> {
        match &self.status {
            OutcomeStatus::Failed { error } => Some(error),
            OutcomeStatus::Success { .. } => None,
        }
    }
}

/// Translates batches through a provider with retry and validation
#[derive(Debug, Clone)]
pub struct TranslationClient {
    provider: Arc<dyn Provider>,
    retry_policy: RetryPolicy,
    request_timeout: Duration,
}

impl TranslationClient {
    pub fn new(provider: Arc<dyn Provider>, retry_policy: RetryPolicy, request_timeout: Duration) -> Self {
        Self {
            provider,
            retry_policy,
            request_timeout,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One item per cue, labelled with the cue's token
    pub fn build_request(batch: &Batch) -> TranslationRequest {
        TranslationRequest {
            source_language: batch.languages.source.clone(),
            target_language: batch.languages.target.clone(),
            items: batch
                .cues
                .iter()
                .map(|cue| RequestItem {
                    token: token_for(cue),
                    text: cue.text(),
                })
                .collect(),
        }
    }

    /// Validate a response against the batch and build the translated cues
    pub fn apply_response(batch: &Batch, response: &TranslationResponse) -> Result<Vec<Cue>, TranslationError> {
        if response.items.len() != batch.cues.len() {
            return Err(TranslationError::CountMismatch {
                expected: batch.cues.len(),
                actual: response.items.len(),
            });
        }

        let expected: HashSet<String> = batch.cues.iter().map(token_for).collect();
        let mut by_token: HashMap<&str, &str> = HashMap::with_capacity(response.items.len());
        for item in &response.items {
            if !expected.contains(&item.token) {
                return Err(TranslationError::UnknownToken(item.token.clone()));
            }
            if by_token.insert(item.token.as_str(), item.translated_text.as_str()).is_some() {
                return Err(TranslationError::DuplicateToken(item.token.clone()));
            }
        }

        batch
            .cues
            .iter()
            .map(|cue| {
                let token = token_for(cue);
                let text = by_token
                    .get(token.as_str())
                    .ok_or_else(|| TranslationError::MissingToken(token.clone()))?;
                if text.trim().is_empty() {
                    return Err(TranslationError::EmptyTranslation(token));
                }
                Ok(cue.with_text(text))
            })
            .collect()
    }

    async fn attempt(&self, batch: &Batch, request: &TranslationRequest) -> Result<Vec<Cue>, TranslationError> {
        let response = tokio::time::timeout(self.request_timeout, self.provider.complete(request))
            .await
            .map_err(|_| TranslationError::Timeout(self.request_timeout))??;
        Self::apply_response(batch, &response)
    }

    /// Translate one batch, retrying transient failures
    pub async fn translate_batch(&self, batch: &Batch) -> TranslationOutcome {
        if batch.is_empty() {
            return TranslationOutcome {
                batch_id: batch.batch_id,
                status: OutcomeStatus::Success { translated_cues: Vec::new() },
                attempts: 0,
                retry_delays: Vec::new(),
            };
        }

        let request = Self::build_request(batch);
        let max_attempts = self.retry_policy.max_attempts();
        let mut retry_delays = Vec::new();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.attempt(batch, &request).await {
                Ok(translated_cues) => {
                    debug!(
                        "Batch {} translated {} cue(s) in {} attempt(s)",
                        batch.batch_id,
                        translated_cues.len(),
                        attempts
                    );
                    return TranslationOutcome {
                        batch_id: batch.batch_id,
                        status: OutcomeStatus::Success { translated_cues },
                        attempts,
                        retry_delays,
                    };
                }
                Err(error) if error.is_transient() && attempts < max_attempts => {
                    let delay = self.retry_policy.backoff(attempts);
                    warn!(
                        "Batch {} attempt {}/{} failed: {}. Retrying in {:.1}s",
                        batch.batch_id,
                        attempts,
                        max_attempts,
                        error,
                        delay.as_secs_f64()
                    );
                    retry_delays.push(delay);
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    let failure = BatchFailure {
                        batch_id: batch.batch_id,
                        attempts,
                        error,
                    };
                    error!("{}", failure);
                    return TranslationOutcome {
                        batch_id: batch.batch_id,
                        status: OutcomeStatus::Failed { error: failure },
                        attempts,
                        retry_delays,
                    };
                }
            }
        }
    }
}
