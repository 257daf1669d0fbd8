pub mod analyzer;
pub mod language;
pub mod prompt;
pub mod samples;
pub mod suggestions;

pub use analyzer::{ensure_code, AnalysisResult, CodeAnalyzer, EmptyInputError};
pub use language::{Language, LanguageDetector};
pub use prompt::{CommentStyle, PromptBuilder, PromptConfig};
pub use samples::Sample;
pub use suggestions::{group_suggestions, SuggestionItem};
