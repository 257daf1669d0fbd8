use crate::adapters::llm::{GenerationError, LLMAdapter, LLMRequest};
use crate::core::{CommentStyle, Language, LanguageDetector, PromptBuilder};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Please enter some code to analyze.")]
pub struct EmptyInputError;

/// Rejects code that is empty or only whitespace.
pub fn ensure_code(code: &str) -> Result<(), EmptyInputError> {
    if code.trim().is_empty() {
        return Err(EmptyInputError);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    EmptyInput(#[from] EmptyInputError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub code: String,
    pub language: Language,
    pub style: CommentStyle,
}

impl AnalysisRequest {
    /// Detects the language up front; fails only on empty input.
    pub fn new(code: impl Into<String>, style: CommentStyle) -> Result<Self, EmptyInputError> {
        let code = code.into();
        ensure_code(&code)?;
        let language = LanguageDetector::detect(&code);
        Ok(Self { code, language, style })
    }
}

/// Both outputs of one analysis. Each succeeds or fails on its own.
#[derive(Debug)]
pub struct AnalysisResult {
    pub language: Language,
    pub explanation: Result<String, GenerationError>,
    pub suggestions: Result<String, GenerationError>,
}

impl AnalysisResult {
    pub fn is_complete(&self) -> bool {
        self.explanation.is_ok() && self.suggestions.is_ok()
    }
}

pub struct CodeAnalyzer {
    adapter: Box<dyn LLMAdapter>,
    prompts: PromptBuilder,
    default_style: CommentStyle,
}

impl CodeAnalyzer {
    pub fn new(adapter: Box<dyn LLMAdapter>, prompts: PromptBuilder, default_style: CommentStyle) -> Self {
        Self {
            adapter,
            prompts,
            default_style,
        }
    }

    pub fn model_name(&self) -> &str {
        self.adapter.model_name()
    }

    pub fn default_style(&self) -> CommentStyle {
        self.default_style
    }

    /// One call to the text-generation service.
    pub async fn generate(&self, prompt: String) -> Result<String, GenerationError> {
        let request = LLMRequest {
            system_prompt: self.prompts.system_prompt().to_string(),
            user_prompt: prompt,
            temperature: None,
            max_tokens: None,
        };

        let response = self.adapter.complete(request).await?;
        if response.content.trim().is_empty() {
            return Err(GenerationError::empty(response.model, "blank completion"));
        }
        if let Some(usage) = &response.usage {
            debug!(
                "{} used {} prompt + {} completion tokens",
                response.model, usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(response.content)
    }

    pub async fn explain(&self, code: &str) -> Result<String, AnalysisError> {
        self.explain_with_style(code, self.default_style).await
    }

    pub async fn explain_with_style(&self, code: &str, style: CommentStyle) -> Result<String, AnalysisError> {
        let request = AnalysisRequest::new(code, style)?;
        Ok(self.explain_request(&request).await?)
    }

    pub async fn suggest(&self, code: &str) -> Result<String, AnalysisError> {
        let request = AnalysisRequest::new(code, self.default_style)?;
        Ok(self.suggest_request(&request).await?)
    }

    /// Runs explain and suggest concurrently. Only empty input fails the
    /// whole call; generation failures are reported per output.
    pub async fn analyze(&self, code: &str, style: CommentStyle) -> Result<AnalysisResult, EmptyInputError> {
        let request = AnalysisRequest::new(code, style)?;
        info!(
            "Analyzing {} chars of {} code with {}",
            request.code.len(),
            request.language,
            self.model_name()
        );

        let (explanation, suggestions) =
            tokio::join!(self.explain_request(&request), self.suggest_request(&request));

        Ok(AnalysisResult {
            language: request.language,
            explanation,
            suggestions,
        })
    }

    async fn explain_request(&self, request: &AnalysisRequest) -> Result<String, GenerationError> {
        debug!("Requesting {:?} comments for {} code", request.style, request.language);
        let prompt = self
            .prompts
            .build_comment_prompt(&request.code, request.language, request.style);
        self.generate(prompt).await
    }

    async fn suggest_request(&self, request: &AnalysisRequest) -> Result<String, GenerationError> {
        debug!("Requesting suggestions for {} code", request.language);
        let prompt = self
            .prompts
            .build_suggestion_prompt(&request.code, request.language);
        self.generate(prompt).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::llm::LLMResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replies with canned text. Prompts containing `fail_on` get a real
    /// connection-refused error, as if the network were down.
    pub(crate) struct CannedAdapter {
        pub reply: String,
        pub fail_on: Option<&'static str>,
        pub calls: Arc<AtomicUsize>,
    }

    impl CannedAdapter {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                fail_on: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl LLMAdapter for CannedAdapter {
        async fn complete(&self, request: LLMRequest) -> Result<LLMResponse, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.fail_on {
                if request.user_prompt.contains(marker) {
                    let source = reqwest::Client::new()
                        .get("http://127.0.0.1:1")
                        .send()
                        .await
                        .unwrap_err();
                    return Err(GenerationError::Transport {
                        provider: "Canned",
                        source,
                    });
                }
            }
            Ok(LLMResponse {
                content: format!("{} [{}]", self.reply, request.user_prompt.len()),
                model: "canned".to_string(),
                usage: None,
            })
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn analyzer(adapter: CannedAdapter) -> CodeAnalyzer {
        CodeAnalyzer::new(Box::new(adapter), PromptBuilder::default(), CommentStyle::Separate)
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let adapter = CannedAdapter::replying("ok");
        let calls = adapter.calls.clone();
        let analyzer = analyzer(adapter);

        assert!(matches!(
            analyzer.analyze("", CommentStyle::Separate).await,
            Err(EmptyInputError)
        ));
        assert!(matches!(analyzer.explain("  \n").await, Err(AnalysisError::EmptyInput(_))));
        assert!(matches!(analyzer.suggest("\t").await, Err(AnalysisError::EmptyInput(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn explain_failure_does_not_block_suggestions() {
        let adapter = CannedAdapter {
            fail_on: Some("Write comments for this code"),
            ..CannedAdapter::replying("1. Add null checks")
        };
        let calls = adapter.calls.clone();
        let result = analyzer(adapter)
            .analyze("def add(a, b):\n    return a + b", CommentStyle::Separate)
            .await
            .unwrap();

        assert_eq!(result.language, Language::Python);
        assert!(matches!(
            result.explanation,
            Err(GenerationError::Transport { .. })
        ));
        assert!(result
            .explanation
            .as_ref()
            .unwrap_err()
            .to_string()
            .starts_with("could not reach Canned"));
        assert!(result.suggestions.as_deref().unwrap().starts_with("1. Add null checks"));
        assert!(!result.is_complete());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn suggest_failure_keeps_comments() {
        let adapter = CannedAdapter {
            fail_on: Some("numbered list"),
            ..CannedAdapter::replying("// adds two numbers")
        };
        let result = analyzer(adapter)
            .analyze("function add(a,b) { return a+b; }", CommentStyle::Inline)
            .await
            .unwrap();

        assert_eq!(result.language, Language::JavaScript);
        assert!(result.explanation.as_deref().unwrap().starts_with("// adds two numbers"));
        assert!(matches!(
            result.suggestions,
            Err(GenerationError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn explain_returns_text_as_is() {
        let text = analyzer(CannedAdapter::replying("# adds two numbers"))
            .explain("function add(a,b) { return a+b; }")
            .await
            .unwrap();
        assert!(text.starts_with("# adds two numbers ["));
    }

    #[tokio::test]
    async fn inline_style_uses_inline_template() {
        let adapter = CannedAdapter {
            fail_on: Some("comments written directly into it"),
            ..CannedAdapter::replying("ok")
        };
        let analyzer = analyzer(adapter);

        assert!(analyzer.explain("x = 1").await.is_ok());
        assert!(analyzer
            .explain_with_style("x = 1", CommentStyle::Inline)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn blank_completion_is_generation_error() {
        struct BlankAdapter;

        #[async_trait]
        impl LLMAdapter for BlankAdapter {
            async fn complete(&self, _request: LLMRequest) -> Result<LLMResponse, GenerationError> {
                Ok(LLMResponse {
                    content: "   ".to_string(),
                    model: "blank".to_string(),
                    usage: None,
                })
            }

            fn model_name(&self) -> &str {
                "blank"
            }
        }

        let analyzer = CodeAnalyzer::new(Box::new(BlankAdapter), PromptBuilder::default(), CommentStyle::Separate);
        let err = analyzer.suggest("int main() {}").await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Generation(GenerationError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn request_detects_language() {
        let request = AnalysisRequest::new("#include <stdio.h>", CommentStyle::Inline).unwrap();
        assert_eq!(request.language, Language::C);
        assert!(matches!(
            AnalysisRequest::new(" ", CommentStyle::Inline),
            Err(EmptyInputError)
        ));
    }
}
