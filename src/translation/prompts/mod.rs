/*!
 * Prompt engineering for subtitle translation.
 *
 * This module provides:
 * - The system prompt template and the marker-based user prompt
 * - Parsing of marker-formatted replies back into token/translation pairs
 */

pub mod markers;
pub mod templates;

// Re-export main types
pub use markers::{END_MARKER, format_marker, parse_marked_reply};
pub use templates::{PromptTemplate, TranslationPromptBuilder};
