/*!
 * Concurrent batch dispatch.
 *
 * Runs batch translations with at most `concurrency_limit` in flight, starting
 * the next batch as soon as one finishes. Outcomes are returned sorted by
 * batch id regardless of completion order. Progress counters are atomics
 * updated once per finished batch. Cancellation is cooperative: it is checked
 * before each batch starts and never interrupts a running batch.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use log::{debug, info};

use crate::errors::ConfigError;

use super::batch::Batch;
use super::core::{TranslationClient, TranslationOutcome};

/// Shared flag used to stop dispatching new batches
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Point-in-time view of the dispatch counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub total_batches: usize,
    pub completed_batches: usize,
    pub succeeded_batches: usize,
    pub failed_batches: usize,
    pub translated_cues: usize,
}

/// Atomic progress counters, safe to read while a run is in progress
#[derive(Debug, Default)]
pub struct DispatchProgress {
    total_batches: AtomicUsize,
    completed_batches: AtomicUsize,
    succeeded_batches: AtomicUsize,
    failed_batches: AtomicUsize,
    translated_cues: AtomicUsize,
}

impl DispatchProgress {
    fn reset(&self, total_batches: usize) {
        self.total_batches.store(total_batches, Ordering::SeqCst);
        self.completed_batches.store(0, Ordering::SeqCst);
        self.succeeded_batches.store(0, Ordering::SeqCst);
        self.failed_batches.store(0, Ordering::SeqCst);
        self.translated_cues.store(0, Ordering::SeqCst);
    }

    fn record(&self, outcome: &TranslationOutcome) -> ProgressSnapshot {
        match outcome.translated_cues() {
            Some(cues) => {
                self.succeeded_batches.fetch_add(1, Ordering::SeqCst);
                self.translated_cues.fetch_add(cues.len(), Ordering::SeqCst);
            }
            None => {
                self.failed_batches.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.completed_batches.fetch_add(1, Ordering::SeqCst);
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_batches: self.total_batches.load(Ordering::SeqCst),
            completed_batches: self.completed_batches.load(Ordering::SeqCst),
            succeeded_batches: self.succeeded_batches.load(Ordering::SeqCst),
            failed_batches: self.failed_batches.load(Ordering::SeqCst),
            translated_cues: self.translated_cues.load(Ordering::SeqCst),
        }
    }
}

/// Called after every finished batch
pub type ProgressCallback = Arc<dyn Fn(ProgressSnapshot) + Send + Sync>;

/// Fans batches out to the translation client under a concurrency cap
pub struct Dispatcher {
    client: TranslationClient,
    concurrency_limit: usize,
    progress: Arc<DispatchProgress>,
    on_progress: Option<ProgressCallback>,
}

impl Dispatcher {
    pub fn new(client: TranslationClient, concurrency_limit: usize) -> Result<Self, ConfigError> {
        if concurrency_limit == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        Ok(Self {
            client,
            concurrency_limit,
            progress: Arc::new(DispatchProgress::default()),
            on_progress: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Counters of the current or last run
    pub fn progress(&self) -> Arc<DispatchProgress> {
        Arc::clone(&self.progress)
    }

    /// Translate all batches; batches not started before cancellation produce no outcome
    pub async fn run(&self, batches: Vec<Batch>, cancel: &CancellationFlag) -> Vec<TranslationOutcome> {
        let total = batches.len();
        self.progress.reset(total);
        info!(
            "Dispatching {} batch(es) to {} with up to {} in flight",
            total,
            self.client.provider_name(),
            self.concurrency_limit
        );

        let mut outcomes: Vec<TranslationOutcome> = stream::iter(batches)
            .map(|batch| {
                let client = &self.client;
                let progress = &self.progress;
                let on_progress = self.on_progress.as_ref();
                async move {
                    if cancel.is_cancelled() {
                        debug!("Skipping batch {}: run cancelled", batch.batch_id);
                        return None;
                    }
                    let outcome = client.translate_batch(&batch).await;
                    let snapshot = progress.record(&outcome);
                    if let Some(callback) = on_progress {
                        callback(snapshot);
                    }
                    Some(outcome)
                }
            })
            .buffer_unordered(self.concurrency_limit)
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await;

        outcomes.sort_by_key(|outcome| outcome.batch_id);

        let snapshot = self.progress.snapshot();
        if outcomes.len() < total {
            info!("Run cancelled: {} of {} batch(es) were not started", total - outcomes.len(), total);
        }
        info!(
            "Dispatch finished: {} succeeded, {} failed",
            snapshot.succeeded_batches, snapshot.failed_batches
        );
        outcomes
    }
}
