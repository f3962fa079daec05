/*!
 * Prompt templates for subtitle translation.
 *
 * Entries are sent to the model as marker-delimited blocks so that each
 * translation can be mapped back to its cue by token, never by position.
 */

use crate::language_utils;
use crate::providers::TranslationRequest;

use super::markers::{END_MARKER, format_marker};

/// System prompt template for subtitle translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for subtitle translation.
    pub const SUBTITLE_TRANSLATOR: &'static str = r#"You are a professional subtitle translator. Translate the subtitle entries below from {source_language} to {target_language}.

## Rules
- Keep the tone, register and emotion of the original dialogue
- Keep non-dialogue cues such as [music], [door slams] or (laughs), translating the words inside them
- Translate idioms and slang naturally instead of word for word
- Use the correct gendered forms in {target_language} when the context makes them clear
- Preserve the line breaks inside each entry
- Keep subtitles concise, they have limited display time

## Output Format
- Each entry starts with a marker line such as <<ENTRY_1>>
- Reply with every marker exactly once, each followed by its translation
- Do not add, remove, merge or renumber markers
- Finish the reply with <<END>> on a line of its own
- Output only the marked translations, no notes or explanations"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default subtitle translator template.
    pub fn subtitle_translator() -> Self {
        Self::new(Self::SUBTITLE_TRANSLATOR)
    }

    /// Render the template with the given language names.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::subtitle_translator()
    }
}

/// Builds the system and user prompts for one translation request.
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder<'a> {
    request: &'a TranslationRequest,
    template: PromptTemplate,
}

impl<'a> TranslationPromptBuilder<'a> {
    pub fn new(request: &'a TranslationRequest) -> Self {
        Self {
            request,
            template: PromptTemplate::default(),
        }
    }

    /// Replace the built-in system prompt when a custom one is configured.
    pub fn with_template(mut self, custom: Option<&str>) -> Self {
        if let Some(custom) = custom.filter(|t| !t.trim().is_empty()) {
            self.template = PromptTemplate::new(custom);
        }
        self
    }

    /// Build the system prompt.
    pub fn build_system_prompt(&self) -> String {
        let source = match &self.request.source_language {
            Some(code) => language_utils::get_language_name(code).unwrap_or_else(|_| code.clone()),
            None => "the source language (detect it automatically)".to_string(),
        };
        let target = language_utils::get_language_name(&self.request.target_language)
            .unwrap_or_else(|_| self.request.target_language.clone());
        self.template.render(&source, &target)
    }

    /// Build the user prompt: one marker block per item, then the end marker.
    pub fn build_user_prompt(&self) -> String {
        let mut prompt = String::new();
        for item in &self.request.items {
            prompt.push_str(&format_marker(&item.token));
            prompt.push('\n');
            prompt.push_str(&item.text);
            prompt.push('\n');
        }
        prompt.push_str(END_MARKER);
        prompt
    }

    /// Build both system and user prompts.
    pub fn build(&self) -> (String, String) {
        (self.build_system_prompt(), self.build_user_prompt())
    }
}
