/*!
 * Tests for language code handling
 */

use srtwai::errors::ConfigError;
use srtwai::language_utils::{
    self, LanguagePair, SUPPORTED_LANGUAGES, get_language_name, get_native_name, language_codes_match,
    normalize_language_code,
};

#[test]
fn test_normalizeLanguageCode_withThreeLetterForms_shouldReturnPart1() {
    assert_eq!(normalize_language_code("fre").unwrap(), "fr");
    assert_eq!(normalize_language_code("fra").unwrap(), "fr");
    assert_eq!(normalize_language_code(" FR ").unwrap(), "fr");
    assert_eq!(normalize_language_code("ger").unwrap(), "de");
    assert_eq!(normalize_language_code("jpn").unwrap(), "ja");
}

#[test]
fn test_normalizeLanguageCode_withUnsupportedCode_shouldFail() {
    assert_eq!(
        normalize_language_code("id"),
        Err(ConfigError::UnsupportedLanguage("id".to_string()))
    );
    assert!(normalize_language_code("xx").is_err());
    assert!(normalize_language_code("").is_err());
    assert!(normalize_language_code("english").is_err());
}

#[test]
fn test_languageCodesMatch_withMixedForms_shouldCompareLanguages() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("deu", "ger"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("xx", "xx"));
}

#[test]
fn test_languagePair_validated_withAuto_shouldLeaveSourceEmpty() {
    let pair = LanguagePair::validated(Some("auto"), "spa").unwrap();
    assert_eq!(pair.source, None);
    assert_eq!(pair.target, "es");
    assert_eq!(pair.source_name(), "auto-detected");
    assert_eq!(pair.target_name(), "Spanish");

    assert_eq!(LanguagePair::validated(Some("  "), "es").unwrap().source, None);
}

#[test]
fn test_languagePair_validated_withSameLanguage_shouldFail() {
    assert_eq!(
        LanguagePair::validated(Some("eng"), "en"),
        Err(ConfigError::SameLanguage("en".to_string()))
    );
}

#[test]
fn test_languagePair_validated_withUnsupportedSource_shouldFail() {
    assert_eq!(
        LanguagePair::validated(Some("xx"), "en"),
        Err(ConfigError::UnsupportedLanguage("xx".to_string()))
    );
}

#[test]
fn test_supportedLanguages_shouldListEveryCodeWithName() {
    let languages = language_utils::supported_languages();
    assert_eq!(languages.len(), SUPPORTED_LANGUAGES.len());
    assert_eq!(languages.len(), 21);
    assert!(languages.iter().all(|(code, name)| code.len() == 2 && !name.is_empty()));
    assert!(languages.contains(&("de", "German".to_string())));
}

#[test]
fn test_languageNames_withKnownCodes_shouldResolve() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("ita").unwrap(), "Italian");
    assert!(get_language_name("xx").is_err());
    assert!(get_native_name("fr").is_some_and(|name| !name.is_empty()));
    assert_eq!(get_native_name("xx"), None);
}
