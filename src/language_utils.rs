use isolang::Language;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Language utilities for the languages srtwai can translate between
///
/// Codes are ISO 639-1 (2-letter). ISO 639-2 codes (3-letter, T or B form)
/// are accepted on input and normalized to their 2-letter form.
pub const SUPPORTED_LANGUAGES: [&str; 21] = [
    "en", "es", "fr", "de", "it", "pt", "ru", "ja", "ko", "zh", "ar",
    "hi", "th", "vi", "nl", "sv", "da", "no", "fi", "pl", "tr",
];

/// Source and target language of a translation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    /// None lets the service detect the source language
    pub source: Option<String>,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: Option<&str>, target: &str) -> Self {
        LanguagePair {
            source: source.map(str::to_string),
            target: target.to_string(),
        }
    }

    /// Normalize both codes and check they are supported and distinct
    pub fn validated(source: Option<&str>, target: &str) -> Result<Self, ConfigError> {
        let target = normalize_language_code(target)?;
        let source = match source.map(str::trim).filter(|s| !s.is_empty() && *s != "auto") {
            Some(code) => Some(normalize_language_code(code)?),
            None => None,
        };
        if source.as_deref() == Some(target.as_str()) {
            return Err(ConfigError::SameLanguage(target));
        }
        Ok(LanguagePair { source, target })
    }

    /// Display name of the source language, or "auto-detected"
    pub fn source_name(&self) -> String {
        match &self.source {
            Some(code) => get_language_name(code).unwrap_or_else(|_| code.clone()),
            None => "auto-detected".to_string(),
        }
    }

    pub fn target_name(&self) -> String {
        get_language_name(&self.target).unwrap_or_else(|_| self.target.clone())
    }
}

// ISO 639-2/B codes that differ from their 639-2/T form
fn bibliographic_to_terminology(code: &str) -> &str {
    match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "chi" => "zho",
        "gre" => "ell",
        "cze" => "ces",
        "per" => "fas",
        "rum" => "ron",
        "slo" => "slk",
        _ => code,
    }
}

/// Map any ISO 639-1 or 639-2 code to its ISO 639-1 form
pub fn to_part1(code: &str) -> Option<String> {
    let code = code.trim().to_lowercase();
    let language = match code.len() {
        2 => Language::from_639_1(&code),
        3 => Language::from_639_3(bibliographic_to_terminology(&code)),
        _ => None,
    }?;
    language.to_639_1().map(str::to_string)
}

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&code)
}

/// Normalize a language code and check it belongs to the supported set
pub fn normalize_language_code(code: &str) -> Result<String, ConfigError> {
    match to_part1(code) {
        Some(part1) if is_supported(&part1) => Ok(part1),
        _ => Err(ConfigError::UnsupportedLanguage(code.trim().to_string())),
    }
}

/// Check if two language codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (to_part1(code1), to_part1(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// English name of a supported language
pub fn get_language_name(code: &str) -> Result<String, ConfigError> {
    let part1 = normalize_language_code(code)?;
    Language::from_639_1(&part1)
        .map(|lang| lang.to_name().to_string())
        .ok_or(ConfigError::UnsupportedLanguage(part1))
}

/// Name of a language in that language, falling back to the English name
pub fn get_native_name(code: &str) -> Option<String> {
    let part1 = to_part1(code)?;
    let language = Language::from_639_1(&part1)?;
    Some(language.to_autonym().unwrap_or_else(|| language.to_name()).to_string())
}

/// Supported languages as (code, English name) pairs
pub fn supported_languages() -> Vec<(&'static str, String)> {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|code| {
            let name = Language::from_639_1(code)
                .map(|lang| lang.to_name().to_string())
                .unwrap_or_else(|| code.to_uppercase());
            (*code, name)
        })
        .collect()
}
