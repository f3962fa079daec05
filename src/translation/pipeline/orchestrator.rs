/*!
 * Pipeline orchestrator for coordinating translation stages.
 *
 * The orchestrator wires the stages together:
 * 1. Parse: raw SRT bytes into a document
 * 2. Split: document into ordered batches
 * 3. Dispatch: batches to the provider, concurrently and with retries
 * 4. Merge: outcomes back into a document with the original timing
 * 5. Serialize: the merged document as SRT text
 */

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;

use crate::app_config::PipelineConfig;
use crate::errors::{AppError, ConfigError};
use crate::language_utils::LanguagePair;
use crate::providers::Provider;
use crate::subtitle_processor::{SrtCodec, SubtitleDocument};
use crate::translation::batch::Batcher;
use crate::translation::core::TranslationClient;
use crate::translation::dispatcher::{CancellationFlag, DispatchProgress, Dispatcher, ProgressCallback};
use crate::translation::reassembly::{Reassembler, TranslationResult};

/// Report of one translation run
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationSummary {
    pub total_cues: usize,
    pub translated_cues: usize,
    pub failed_batches: usize,
    /// Batches never started because the run was cancelled
    pub skipped_batches: usize,
    pub elapsed: Duration,
}

impl fmt::Display for TranslationSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Translated {}/{} cues in {:.1}s",
            self.translated_cues,
            self.total_cues,
            self.elapsed.as_secs_f64()
        )?;
        if self.failed_batches > 0 {
            write!(f, ", {} batch(es) failed", self.failed_batches)?;
        }
        if self.skipped_batches > 0 {
            write!(f, ", {} batch(es) skipped", self.skipped_batches)?;
        }
        Ok(())
    }
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Translated document as SRT text
    pub srt: String,
    pub result: TranslationResult,
    pub summary: TranslationSummary,
}

/// Main entry point: SRT in, translated SRT and summary out
pub struct TranslationPipeline {
    config: PipelineConfig,
    batcher: Batcher,
    dispatcher: Dispatcher,
}

impl TranslationPipeline {
    /// Create a pipeline, rejecting invalid configuration up front
    pub fn new(provider: Arc<dyn Provider>, config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let batcher = Batcher::new(config.max_entries_per_batch)?;
        let client = TranslationClient::new(provider, config.retry_policy(), config.request_timeout());
        let dispatcher = Dispatcher::new(client, config.concurrency_limit)?;
        Ok(Self {
            config,
            batcher,
            dispatcher,
        })
    }

    /// Receive a progress snapshot after every finished batch
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.dispatcher = self.dispatcher.with_progress_callback(callback);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn progress(&self) -> Arc<DispatchProgress> {
        self.dispatcher.progress()
    }

    /// Number of batches a document of `total_cues` is split into
    pub fn batch_count(&self, total_cues: usize) -> usize {
        self.batcher.batch_count(total_cues)
    }

    /// Translate a parsed document
    pub async fn translate_document(
        &self,
        document: &SubtitleDocument,
        languages: &LanguagePair,
        cancel: &CancellationFlag,
    ) -> Result<(TranslationResult, TranslationSummary), AppError> {
        let started = Instant::now();
        let languages = LanguagePair::validated(languages.source.as_deref(), &languages.target)?;

        let batches = self.batcher.split(document, &languages);
        let total_batches = batches.len();
        info!(
            "Translating {} cue(s) from {} to {} in {} batch(es)",
            document.len(),
            languages.source_name(),
            languages.target_name(),
            total_batches
        );

        let outcomes = self.dispatcher.run(batches, cancel).await;
        let result = Reassembler::merge(document, &outcomes)?;

        let summary = TranslationSummary {
            total_cues: document.len(),
            translated_cues: result.translated_cues,
            failed_batches: result.failed_batches,
            skipped_batches: total_batches - outcomes.len(),
            elapsed: started.elapsed(),
        };
        info!("{}", summary);
        Ok((result, summary))
    }

    /// Parse, translate and serialize raw SRT bytes
    pub async fn translate_srt(
        &self,
        input: &[u8],
        languages: &LanguagePair,
        cancel: &CancellationFlag,
    ) -> Result<PipelineOutput, AppError> {
        let document = SrtCodec::parse_bytes(input)?;
        let (result, summary) = self.translate_document(&document, languages, cancel).await?;
        let srt = SrtCodec::serialize(&result.document);
        Ok(PipelineOutput { srt, result, summary })
    }
}
