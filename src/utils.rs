use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Custom error types for the sentence generator
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("Grammar file not found: {}: {source}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

/// Trait for post-processing a fully expanded sentence
pub trait TextFilter: Send + Sync + fmt::Debug {
    /// Transform the generated text
    fn filter(&self, text: &str) -> String;

    /// Get the name of this filter
    fn name(&self) -> &str;

    /// Clone this filter as a box
    fn clone_box(&self) -> Box<dyn TextFilter>;
}

impl Clone for Box<dyn TextFilter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A filter that leaves the text untouched
#[derive(Debug, Clone)]
pub struct NoopFilter;

impl TextFilter for NoopFilter {
    fn filter(&self, text: &str) -> String {
        text.to_string()
    }

    fn name(&self) -> &str {
        "noop"
    }

    fn clone_box(&self) -> Box<dyn TextFilter> {
        Box::new(self.clone())
    }
}

// Whitespace before closing punctuation, and after opening punctuation.
static SPACE_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,?!:)^])").expect("valid regex"));
static SPACE_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([(^])\s+").expect("valid regex"));

/// Removes the spaces that word-by-word concatenation leaves around punctuation.
///
/// Whitespace is dropped before `.`, `,`, `?`, `!`, `:`, `)` and `^`, and
/// after `(` and `^`. Every other space is kept as-is. Applying this twice
/// gives the same result as applying it once.
pub fn normalize_punctuation(text: &str) -> String {
    let text = SPACE_BEFORE.replace_all(text, "$1");
    SPACE_AFTER.replace_all(&text, "$1").into_owned()
}

/// Filter applying [`normalize_punctuation`]; the default for every grammar
#[derive(Debug, Clone, Default)]
pub struct PunctuationFilter;

impl TextFilter for PunctuationFilter {
    fn filter(&self, text: &str) -> String {
        normalize_punctuation(text)
    }

    fn name(&self) -> &str {
        "punctuation"
    }

    fn clone_box(&self) -> Box<dyn TextFilter> {
        Box::new(self.clone())
    }
}

/// Create the punctuation spacing filter
pub fn punctuation_filter() -> Box<dyn TextFilter> {
    Box::new(PunctuationFilter)
}

/// Create a no-op filter that doesn't change the input
pub fn noop_filter() -> Box<dyn TextFilter> {
    Box::new(NoopFilter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_before_closing_punctuation() {
        assert_eq!(
            normalize_punctuation("The waves sigh tonight . "),
            "The waves sigh tonight. "
        );
        assert_eq!(normalize_punctuation("yes , no ? maybe !"), "yes, no? maybe!");
        assert_eq!(normalize_punctuation("note : this"), "note: this");
    }

    #[test]
    fn test_parentheses_and_caret() {
        assert_eq!(normalize_punctuation("call ( me ) now"), "call (me) now");
        assert_eq!(normalize_punctuation("x ^ 2 "), "x^2 ");
    }

    #[test]
    fn test_other_spaces_preserved() {
        assert_eq!(normalize_punctuation("a b  c "), "a b  c ");
        assert_eq!(normalize_punctuation(""), "");
    }

    #[test]
    fn test_normalization_idempotent() {
        let samples = [
            "The waves sigh tonight . ",
            "( ^ ) , .",
            "a  ( b ^  c ) ! ? : ",
            "\t(\t.\t)",
        ];
        for sample in samples {
            let once = normalize_punctuation(sample);
            assert_eq!(normalize_punctuation(&once), once, "input: {:?}", sample);
        }
    }

    #[test]
    fn test_filters() {
        assert_eq!(punctuation_filter().filter("hi !"), "hi!");
        assert_eq!(noop_filter().filter("hi !"), "hi !");
        assert_eq!(punctuation_filter().clone().name(), "punctuation");
    }

    #[test]
    fn test_file_not_found_message() {
        let err = GrammarError::FileNotFound {
            path: PathBuf::from("grammars/missing.g"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let message = err.to_string();
        assert!(message.contains("not found"));
        assert!(message.contains("grammars/missing.g"));
    }
}
