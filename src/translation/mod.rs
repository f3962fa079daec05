/*!
 * Batch translation of subtitle documents.
 *
 * This module contains the translation engine, split into several submodules:
 *
 * - `batch`: Partitioning documents into ordered batches
 * - `core`: Translation client with token validation and retries
 * - `retry`: Capped exponential backoff policy
 * - `dispatcher`: Concurrent dispatch with progress and cancellation
 * - `reassembly`: Merging outcomes back into a document
 * - `prompts`: Prompt templates and reply parsing for LLM providers
 * - `pipeline`: End-to-end orchestration
 */

// Re-export main types for easier usage
pub use self::batch::{Batch, Batcher};
pub use self::core::{OutcomeStatus, TranslationClient, TranslationOutcome};
pub use self::dispatcher::{CancellationFlag, Dispatcher, ProgressCallback, ProgressSnapshot};
pub use self::pipeline::{PipelineOutput, TranslationPipeline, TranslationSummary};
pub use self::reassembly::{Reassembler, TranslationResult};
pub use self::retry::RetryPolicy;

// Submodules
pub mod batch;
pub mod core;
pub mod dispatcher;
pub mod pipeline;
pub mod prompts;
pub mod reassembly;
pub mod retry;
