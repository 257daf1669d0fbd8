use crate::core::Language;
use serde::{Deserialize, Serialize};
use tracing::warn;

const UNKNOWN_LANGUAGE_PHRASE: &str = "an unknown language";
const CODE_FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStyle {
    /// Comments come back on their own, apart from the code.
    #[default]
    Separate,
    /// The code comes back with comments written into it.
    Inline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub system_prompt: String,
    pub comment_template: String,
    pub inline_comment_template: String,
    pub suggestion_template: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: r#"You are a patient senior engineer who explains source code to people who do not write software for a living. You describe what code does and why it exists in plain, friendly language, and you give concrete, practical advice when asked how code could be improved."#.to_string(),
            comment_template: r#"I have this code in {language}:

```
{code}
```

<instructions>
Write comments for this code and return them separately from the code.
1. Use clear, simple words that a non-programmer could understand
2. Explain the purpose of the key functions and blocks of code
3. Don't be overly technical: focus on the "what" and "why", not the "how"
4. Comment sparingly; skip lines that are already obvious
5. Format every comment using the idiomatic comment syntax of that language{comment_hint}
</instructions>"#.to_string(),
            inline_comment_template: r#"I have this code in {language}:

```
{code}
```

<instructions>
Return the same code with explanatory comments written directly into it.
1. Keep every original line of code unchanged and in the same order
2. Use clear, simple words that a non-programmer could understand
3. Explain the purpose of the key functions and blocks of code
4. Don't be overly technical: focus on the "what" and "why", not the "how"
5. Comment sparingly; skip lines that are already obvious
6. Use the idiomatic comment syntax of that language{comment_hint}
7. Return only the commented code, with no text before or after it
</instructions>"#.to_string(),
            suggestion_template: r#"I have this code in {language}:

```
{code}
```

<instructions>
Provide specific, actionable suggestions to improve this code in terms of:
1. Readability and maintainability
2. Potential bugs or edge cases
3. Performance improvements
4. Best practices and idioms of that language

Format your response as a numbered list of suggestions ("1.", "2.", ...), each followed by a brief explanation.
</instructions>"#.to_string(),
        }
    }
}

pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    pub fn system_prompt(&self) -> &str {
        &self.config.system_prompt
    }

    pub fn build_comment_prompt(&self, code: &str, language: Language, style: CommentStyle) -> String {
        let template = match style {
            CommentStyle::Separate => &self.config.comment_template,
            CommentStyle::Inline => &self.config.inline_comment_template,
        };
        Self::fill_template(template, code, language)
    }

    pub fn build_suggestion_prompt(&self, code: &str, language: Language) -> String {
        Self::fill_template(&self.config.suggestion_template, code, language)
    }

    fn fill_template(template: &str, code: &str, language: Language) -> String {
        if code.contains(CODE_FENCE) {
            warn!("Code contains a ``` fence; the prompt's code block may be cut short");
        }

        let comment_hint = language
            .comment_syntax()
            .map(|syntax| format!(" (`{}`)", syntax))
            .unwrap_or_default();

        // Code goes in last so placeholders inside it are left alone
        template
            .replacen("{language}", language_slot(language), 1)
            .replacen("{comment_hint}", &comment_hint, 1)
            .replacen("{code}", code, 1)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PromptConfig::default())
    }
}

fn language_slot(language: Language) -> &'static str {
    if language.is_unknown() {
        UNKNOWN_LANGUAGE_PHRASE
    } else {
        language.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "def add(a, b):\n    return a + b";

    #[test]
    fn comment_prompt_embeds_code_and_tag_once() {
        let prompt = PromptBuilder::default().build_comment_prompt(
            SAMPLE,
            Language::Python,
            CommentStyle::Separate,
        );
        assert_eq!(prompt.matches(SAMPLE).count(), 1);
        assert_eq!(prompt.matches("I have this code in python:").count(), 1);
        assert!(prompt.contains(&format!("```\n{}\n```", SAMPLE)));
        assert!(!prompt.contains("{language}"));
        assert!(!prompt.contains("{code}"));
    }

    #[test]
    fn every_template_names_each_language_once() {
        let builder = PromptBuilder::default();
        let code = "x = 1";
        for language in [
            Language::Python,
            Language::JavaScript,
            Language::Java,
            Language::C,
            Language::Cpp,
            Language::Html,
            Language::Css,
            Language::Unknown,
        ] {
            let slot = language_slot(language);
            for prompt in [
                builder.build_comment_prompt(code, language, CommentStyle::Separate),
                builder.build_comment_prompt(code, language, CommentStyle::Inline),
                builder.build_suggestion_prompt(code, language),
            ] {
                let intro = format!("I have this code in {}:", slot);
                assert!(prompt.starts_with(&intro), "{language}: {prompt}");
                assert_eq!(prompt.matches(&intro).count(), 1);
                let words = prompt
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|word| *word == language.tag())
                    .count();
                assert_eq!(words, 1, "{language} named {words} times");
                assert_eq!(prompt.matches(code).count(), 1);
                assert!(!prompt.contains('{'), "{language}: unfilled slot");
            }
        }
    }

    #[test]
    fn unknown_language_uses_fallback_phrase() {
        let prompt = PromptBuilder::default().build_suggestion_prompt("x", Language::Unknown);
        assert_eq!(prompt.matches(UNKNOWN_LANGUAGE_PHRASE).count(), 1);
        assert!(prompt.starts_with("I have this code in an unknown language:"));
    }

    #[test]
    fn inline_and_separate_templates_differ() {
        let builder = PromptBuilder::default();
        let separate = builder.build_comment_prompt(SAMPLE, Language::Python, CommentStyle::Separate);
        let inline = builder.build_comment_prompt(SAMPLE, Language::Python, CommentStyle::Inline);
        assert_ne!(separate, inline);
        assert!(separate.contains("separately from the code"));
        assert!(inline.contains("comments written directly into it"));
    }

    #[test]
    fn comment_prompt_names_comment_marker_when_known() {
        let builder = PromptBuilder::default();
        let python = builder.build_comment_prompt(SAMPLE, Language::Python, CommentStyle::Inline);
        assert!(python.contains("comment syntax of that language (`#`)"));

        let unknown = builder.build_comment_prompt("x", Language::Unknown, CommentStyle::Separate);
        assert!(unknown.contains("comment syntax of that language\n"));
        assert!(!unknown.contains("{comment_hint}"));
    }

    #[test]
    fn suggestion_prompt_asks_for_numbered_list() {
        let prompt = PromptBuilder::default().build_suggestion_prompt(SAMPLE, Language::Python);
        assert!(prompt.contains("numbered list"));
        assert!(prompt.contains("Potential bugs or edge cases"));
        assert!(prompt.contains("Performance improvements"));
        assert_eq!(prompt.matches(SAMPLE).count(), 1);
    }

    #[test]
    fn placeholders_inside_code_are_not_expanded() {
        let code = "print(\"{language} and {code}\")";
        let prompt = PromptBuilder::default().build_suggestion_prompt(code, Language::Python);
        assert_eq!(prompt.matches(code).count(), 1);
        assert_eq!(prompt.matches("I have this code in python:").count(), 1);
    }

    #[test]
    fn code_with_fence_is_embedded_verbatim() {
        let code = "x = \"```\"";
        let prompt = PromptBuilder::default().build_suggestion_prompt(code, Language::Python);
        assert!(prompt.contains(code));
    }
}
