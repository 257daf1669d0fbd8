use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\.").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionItem {
    /// The numeral that opened this item, if any.
    pub number: Option<u32>,
    pub lines: Vec<String>,
}

impl SuggestionItem {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Splits a suggestion response into display items. A line such as `3. ...`
/// opens a new item and following non-empty lines join it. Anything before
/// the first numbered line becomes an unnumbered leading item, so a response
/// with no numbering comes back as one combined item.
pub fn group_suggestions(text: &str) -> Vec<SuggestionItem> {
    let mut items: Vec<SuggestionItem> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(captures) = NUMBERED_LINE.captures(line) {
            let number = captures.get(1).and_then(|m| m.as_str().parse().ok());
            items.push(SuggestionItem {
                number,
                lines: vec![trimmed.to_string()],
            });
            continue;
        }

        match items.last_mut() {
            Some(current) => current.lines.push(trimmed.to_string()),
            None => items.push(SuggestionItem {
                number: None,
                lines: vec![trimmed.to_string()],
            }),
        }
    }

    items
}
