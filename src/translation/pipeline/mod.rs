/*!
 * Translation pipeline for whole subtitle documents.
 *
 * The pipeline parses SRT input, splits it into batches, dispatches them to
 * the provider and reassembles the translated document with its original
 * timing.
 */

pub mod orchestrator;

// Re-export types used externally
pub use orchestrator::{PipelineOutput, TranslationPipeline, TranslationSummary};
