/*!
 * Marker protocol for LLM replies.
 *
 * A reply lists `<<ENTRY_n>>` markers, each followed by its translation, and
 * ends with `<<END>>` on a line of its own. Parsing keeps duplicates and
 * unknown entry numbers so the translation client can reject them during
 * validation.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ProviderError;
use crate::providers::TranslationResponse;
use crate::translation::core::TOKEN_PREFIX;

pub const END_MARKER: &str = "<<END>>";

// Only tokens the client issues count as markers, so `<<word>>` in dialogue stays text
static MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"<<\s*({}\d+)\s*>>", regex::escape(TOKEN_PREFIX))).expect("marker regex is valid")
});

// The end marker stands on its own line
static END_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*<<\s*END\s*>>[ \t]*\r?$").expect("end regex is valid"));

pub fn format_marker(token: &str) -> String {
    format!("<<{}>>", token)
}

/// Split a marker-formatted reply into token/translation pairs
pub fn parse_marked_reply(reply: &str) -> Result<TranslationResponse, ProviderError> {
    let end = END_REGEX.find(reply).ok_or_else(|| {
        ProviderError::ParseError(format!("reply is truncated, no {} marker found", END_MARKER))
    })?;
    let body = &reply[..end.start()];

    let markers: Vec<(String, usize, usize)> = MARKER_REGEX
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((caps[1].to_string(), whole.start(), whole.end()))
        })
        .collect();

    if markers.is_empty() {
        return Err(ProviderError::ParseError("reply contains no entry markers".to_string()));
    }

    let pairs = markers.iter().enumerate().map(|(i, (token, _, text_start))| {
        let text_end = markers.get(i + 1).map_or(body.len(), |(_, next_start, _)| *next_start);
        (token.clone(), body[*text_start..text_end].trim().to_string())
    });

    Ok(TranslationResponse::from_pairs(pairs))
}
