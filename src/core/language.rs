use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Java,
    C,
    Cpp,
    Html,
    Css,
    Unknown,
}

impl Language {
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Html => "html",
            Language::Css => "css",
            Language::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Html => "HTML",
            Language::Css => "CSS",
            Language::Unknown => "Unknown",
        }
    }

    /// Comment marker a reader of this language expects to see.
    pub fn comment_syntax(&self) -> Option<&'static str> {
        match self {
            Language::Python => Some("#"),
            Language::JavaScript | Language::Java | Language::C | Language::Cpp => Some("//"),
            Language::Html => Some("<!-- -->"),
            Language::Css => Some("/* */"),
            Language::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Language::Unknown)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" => Ok(Language::Python),
            "javascript" => Ok(Language::JavaScript),
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            "cpp" => Ok(Language::Cpp),
            "html" => Ok(Language::Html),
            "css" => Ok(Language::Css),
            "unknown" => Ok(Language::Unknown),
            other => anyhow::bail!("Unknown language tag: {}", other),
        }
    }
}

/// Detection rules in precedence order. The first language with any matching
/// pattern wins, so a snippet with both `#include` and `std::` is `c`.
const LANGUAGE_PATTERNS: &[(Language, &[&str])] = &[
    (
        Language::Python,
        &[r"def\s+\w+\s*\(", r"import\s+\w+", r"from\s+\w+\s+import"],
    ),
    (
        Language::JavaScript,
        &[r"function\s+\w+\s*\(", r"const\s+\w+\s*=", r"let\s+\w+\s*="],
    ),
    (
        Language::Java,
        &[r"public\s+class", r"public\s+static\s+void\s+main"],
    ),
    (Language::C, &[r"#include", r"int\s+main\s*\("]),
    (Language::Cpp, &[r"#include\s*<\w+>", r"namespace", r"std::"]),
    (Language::Html, &[r"<html.*>", r"<body.*>", r"<div.*>"]),
    (Language::Css, &[r"\w+\s*\{\s*\w+:", r"\.\w+\s*\{"]),
];

static COMPILED_PATTERNS: Lazy<Vec<(Language, Vec<Regex>)>> = Lazy::new(|| {
    LANGUAGE_PATTERNS
        .iter()
        .map(|(language, patterns)| {
            let compiled = patterns
                .iter()
                .map(|pattern| Regex::new(&format!("(?i){}", pattern)).unwrap())
                .collect();
            (*language, compiled)
        })
        .collect()
});

pub struct LanguageDetector;

impl LanguageDetector {
    pub fn detect(code: &str) -> Language {
        COMPILED_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|regex| regex.is_match(code)))
            .map(|(language, _)| *language)
            .unwrap_or(Language::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_python_function() {
        let code = "def add(a, b):\n    return a + b";
        assert_eq!(LanguageDetector::detect(code), Language::Python);
    }

    #[test]
    fn detects_javascript_function() {
        let code = "function add(a,b) { return a+b; }";
        assert_eq!(LanguageDetector::detect(code), Language::JavaScript);
    }

    #[test]
    fn empty_and_whitespace_are_unknown() {
        assert_eq!(LanguageDetector::detect(""), Language::Unknown);
        assert_eq!(LanguageDetector::detect("   \n\t  \n"), Language::Unknown);
    }

    #[test]
    fn c_takes_precedence_over_cpp() {
        let code = "#include <iostream>\nint run() { std::cout << 1; }";
        assert_eq!(LanguageDetector::detect(code), Language::C);
    }

    #[test]
    fn cpp_without_include_is_cpp() {
        let code = "namespace app {\n  void run() { std::cout << 1; }\n}";
        assert_eq!(LanguageDetector::detect(code), Language::Cpp);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            LanguageDetector::detect("PUBLIC CLASS Main {}"),
            Language::Java
        );
        assert_eq!(LanguageDetector::detect("<DIV id=\"x\">"), Language::Html);
    }

    #[test]
    fn css_rules_are_detected() {
        assert_eq!(
            LanguageDetector::detect(".header { color: red; }"),
            Language::Css
        );
        assert_eq!(LanguageDetector::detect("body{margin:0}"), Language::Css);
    }

    #[test]
    fn earlier_language_wins_over_later_match() {
        // `import os` is python even though the braces also look like CSS.
        let code = "import os\nstyle { color: red }";
        assert_eq!(LanguageDetector::detect(code), Language::Python);
    }

    #[test]
    fn plain_prose_is_unknown() {
        assert_eq!(
            LanguageDetector::detect("just some words here"),
            Language::Unknown
        );
    }

    #[test]
    fn detect_is_idempotent() {
        let code = "const total = items.length;";
        let first = LanguageDetector::detect(code);
        let second = LanguageDetector::detect(code);
        assert_eq!(first, second);
        assert_eq!(first, Language::JavaScript);
    }

    #[test]
    fn tag_round_trips_through_from_str() {
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
            assert_eq!(language.tag().parse::<Language>().unwrap(), language);
        }
        assert!("rust".parse::<Language>().is_err());
    }
}
