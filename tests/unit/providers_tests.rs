/*!
 * Tests for provider selection and the marker prompt protocol
 */

use std::time::Duration;

use srtwai::app_config::{ProviderConfig, TranslationConfig, TranslationProvider};
use srtwai::errors::{ConfigError, ProviderError};
use srtwai::providers::{self, RequestItem, TranslationRequest};
use srtwai::translation::prompts::{END_MARKER, TranslationPromptBuilder, format_marker, parse_marked_reply};

fn config_for(provider: TranslationProvider, api_key: &str) -> TranslationConfig {
    let mut provider_config = ProviderConfig::new(provider.clone());
    provider_config.api_key = api_key.to_string();
    TranslationConfig {
        provider,
        available_providers: vec![provider_config],
        ..TranslationConfig::default()
    }
}

fn request() -> TranslationRequest {
    TranslationRequest {
        source_language: Some("en".to_string()),
        target_language: "es".to_string(),
        items: vec![
            RequestItem {
                token: "ENTRY_1".to_string(),
                text: "Hello there.".to_string(),
            },
            RequestItem {
                token: "ENTRY_2".to_string(),
                text: "Two\nlines".to_string(),
            },
        ],
    }
}

#[test]
fn test_buildProvider_withEachProvider_shouldSelectMatchingAdapter() {
    let cases = [
        (TranslationProvider::Gemini, "gemini"),
        (TranslationProvider::OpenAI, "openai"),
        (TranslationProvider::Anthropic, "anthropic"),
        (TranslationProvider::Ollama, "ollama"),
        (TranslationProvider::LMStudio, "openai"),
    ];

    for (provider, expected_name) in cases {
        let built = providers::build_provider(&config_for(provider, "test-key"), Duration::from_secs(10)).unwrap();
        assert_eq!(built.name(), expected_name);
    }
}

#[test]
fn test_buildProvider_withoutApiKey_shouldFail() {
    let provider = TranslationProvider::Anthropic;
    // The key may legitimately come from the environment on a developer machine
    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        return;
    }

    let result = providers::build_provider(&config_for(provider, ""), Duration::from_secs(10));
    assert!(matches!(result, Err(ConfigError::MissingApiKey { .. })));
}

#[test]
fn test_buildProvider_withLocalProviders_shouldNotNeedKey() {
    for provider in [TranslationProvider::Ollama, TranslationProvider::LMStudio] {
        assert!(providers::build_provider(&config_for(provider, ""), Duration::from_secs(10)).is_ok());
    }
}

#[test]
fn test_buildProvider_withBrokenEndpoint_shouldFail() {
    let mut config = config_for(TranslationProvider::Gemini, "key");
    config.available_providers[0].endpoint = "not a url".to_string();

    let result = providers::build_provider(&config, Duration::from_secs(10));
    assert!(matches!(result, Err(ConfigError::InvalidEndpoint { .. })));
}

#[test]
fn test_promptBuilder_build_shouldNameLanguagesAndMarkItems() {
    let request = request();
    let (system, user) = TranslationPromptBuilder::new(&request).build();

    assert!(system.contains("English"));
    assert!(system.contains("Spanish"));
    assert!(user.contains(&format!("{}\nHello there.", format_marker("ENTRY_1"))));
    assert!(user.contains(&format!("{}\nTwo\nlines", format_marker("ENTRY_2"))));
    assert!(user.trim_end().ends_with(END_MARKER));
}

#[test]
fn test_markerProtocol_withEchoedPrompt_shouldRecoverEveryItem() {
    let request = request();
    let (_, user) = TranslationPromptBuilder::new(&request).build();
    // A model that echoes the marked block back unchanged
    let reply = format!("Sure, here you go:\n{}", user);

    let response = parse_marked_reply(&reply).unwrap();

    assert_eq!(response.items.len(), 2);
    assert_eq!(response.items[0].token, "ENTRY_1");
    assert_eq!(response.items[0].translated_text, "Hello there.");
    assert_eq!(response.items[1].translated_text, "Two\nlines");
}

#[test]
fn test_markerProtocol_withTruncatedReply_shouldFailTransiently() {
    let reply = "<<ENTRY_1>>\nHola.\n<<ENTRY_2>>\nDos";

    let error = parse_marked_reply(reply).unwrap_err();
    assert!(matches!(error, ProviderError::ParseError(_)));
    assert!(error.is_transient());
}

#[test]
fn test_markerProtocol_withAngleQuotesInText_shouldKeepThemAsText() {
    let request = TranslationRequest {
        source_language: Some("fr".to_string()),
        target_language: "en".to_string(),
        items: vec![
            RequestItem {
                token: "ENTRY_1".to_string(),
                text: "Il a dit <<Bonjour>>".to_string(),
            },
            RequestItem {
                token: "ENTRY_2".to_string(),
                text: "Fin".to_string(),
            },
        ],
    };
    let (_, user) = TranslationPromptBuilder::new(&request).build();

    let response = parse_marked_reply(&user).unwrap();

    assert_eq!(response.items.len(), 2);
    assert_eq!(response.items[0].token, "ENTRY_1");
    assert_eq!(response.items[0].translated_text, "Il a dit <<Bonjour>>");
    assert_eq!(response.items[1].token, "ENTRY_2");
    assert_eq!(response.items[1].translated_text, "Fin");
}

#[test]
fn test_markerProtocol_withEndMarkerInsideText_shouldReadToRealEnd() {
    let request = TranslationRequest {
        source_language: Some("en".to_string()),
        target_language: "fr".to_string(),
        items: vec![
            RequestItem {
                token: "ENTRY_1".to_string(),
                text: "Type <<END>> to quit".to_string(),
            },
            RequestItem {
                token: "ENTRY_2".to_string(),
                text: "Bye".to_string(),
            },
        ],
    };
    let (_, user) = TranslationPromptBuilder::new(&request).build();

    let response = parse_marked_reply(&user).unwrap();

    assert_eq!(response.items.len(), 2);
    assert_eq!(response.items[0].translated_text, "Type <<END>> to quit");
    assert_eq!(response.items[1].translated_text, "Bye");
}
