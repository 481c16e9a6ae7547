//! Parsing generated definition text.

use std::sync::LazyLock;

use regex::Regex;

use super::cache::Definition;

static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)definition:\s*(.+?)\s*(?:\n|example:|$)").expect("valid regex")
});

static EXAMPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)example:\s*(.+?)\s*$").expect("valid regex"));

/// Split a generated answer into definition and example.
///
/// Tries `Definition: ... Example: ...` labels first, then "first non-empty
/// line is the definition, second is the example", then takes the whole
/// answer as the definition.
pub fn parse_definition(content: &str) -> Definition {
    let labeled_def = DEFINITION_RE
        .captures(content)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty());

    if let Some(definition) = labeled_def {
        let example = EXAMPLE_RE
            .captures(content)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        return Definition {
            definition,
            example,
        };
    }

    let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
    match (lines.next(), lines.next()) {
        (Some(first), Some(second)) => Definition {
            definition: first.to_string(),
            example: second.to_string(),
        },
        _ => Definition {
            definition: content.trim().to_string(),
            example: String::new(),
        },
    }
}

/// The example sentence of an answer that should contain only one: the
/// labeled `Example:` field, else the first non-empty line.
pub fn parse_example(content: &str) -> String {
    if let Some(c) = EXAMPLE_RE.captures(content) {
        return c[1].trim().to_string();
    }
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Does `example` use `word` (case-insensitive)?
pub fn example_uses_word(example: &str, word: &str) -> bool {
    let word = word.trim().to_lowercase();
    !word.is_empty() && example.to_lowercase().contains(&word)
}
