/*!
 * # SRTwAI - SRT subtitle translation with AI
 *
 * A Rust library for translating SRT subtitle files with LLM providers.
 *
 * ## Features
 *
 * - Tolerant SRT parsing (UTF-8, BOM, Latin-1 and Windows-1252 input)
 * - Translate subtitles using various AI providers:
 *   - Google Gemini API
 *   - OpenAI API and OpenAI-compatible local servers
 *   - Anthropic API
 *   - Ollama (local LLM)
 * - Token-labeled batches so replies can never be misaligned
 * - Concurrent dispatch with retries, backoff and cooperative cancellation
 * - Timing and order of every cue preserved exactly
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_processor`: SRT decoding, parsing and serialization
 * - `translation`: Batch translation engine:
 *   - `translation::batch`: Splitting documents into batches
 *   - `translation::core`: Per-batch translation with validation and retries
 *   - `translation::dispatcher`: Concurrent dispatch and progress
 *   - `translation::reassembly`: Merging results back into a document
 *   - `translation::pipeline`: End-to-end orchestration
 * - `providers`: Client implementations for various LLM providers
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations and subtitle file naming
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, PipelineConfig};
pub use errors::{AppError, ConfigError, ConsistencyError, ParseError, ProviderError, TranslationError};
pub use language_utils::{LanguagePair, get_language_name, language_codes_match, normalize_language_code};
pub use subtitle_processor::{Cue, SrtCodec, SubtitleDocument, Timestamp};
pub use translation::{CancellationFlag, TranslationPipeline, TranslationResult, TranslationSummary};
