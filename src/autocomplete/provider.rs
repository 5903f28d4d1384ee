//! Completion tokens and the providers that produce them

use ropey::Rope;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One completion candidate
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Text inserted on completion
    pub content: String,
    /// Higher sorts first
    pub priority: i32,
    /// Optional markdown shown next to the entry
    #[serde(default)]
    pub description: String,
}

impl Token {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            priority: 0,
            description: String::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the typed `input` should offer this token
    pub fn matches(&self, input: &str) -> bool {
        self.content.contains(input)
    }
}

/// Adds tokens to a list being rebuilt
///
/// Runs on the collection's worker thread against a snapshot of the text.
pub trait TokenProvider: Send {
    fn add_tokens(&self, text: &Rope, tokens: &mut Vec<Token>);
}

/// Collects every identifier in the document
#[derive(Clone, Debug)]
pub struct DocumentTokenProvider {
    /// Identifiers shorter than this are skipped
    pub min_length: usize,
}

impl Default for DocumentTokenProvider {
    fn default() -> Self {
        Self { min_length: 3 }
    }
}

impl TokenProvider for DocumentTokenProvider {
    fn add_tokens(&self, text: &Rope, tokens: &mut Vec<Token>) {
        let mut seen: HashSet<String> = tokens.iter().map(|t| t.content.clone()).collect();
        let mut current = String::new();

        // trailing sentinel flushes the last word
        for c in text.chars().chain(std::iter::once(' ')) {
            if c.is_alphabetic() || c == '_' || (!current.is_empty() && c.is_alphanumeric()) {
                current.push(c);
                continue;
            }
            if current.chars().count() >= self.min_length && !seen.contains(&current) {
                seen.insert(current.clone());
                tokens.push(Token::new(current.clone()));
            }
            current.clear();
        }
    }
}

/// Fixed word list, e.g. language keywords
#[derive(Clone, Debug, Default)]
pub struct KeywordProvider {
    pub words: Vec<String>,
    pub priority: i32,
}

impl KeywordProvider {
    pub fn new<I, S>(words: I, priority: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            priority,
        }
    }
}

impl TokenProvider for KeywordProvider {
    fn add_tokens(&self, _text: &Rope, tokens: &mut Vec<Token>) {
        for word in &self.words {
            if !tokens.iter().any(|t| &t.content == word) {
                tokens.push(Token::new(word.clone()).with_priority(self.priority));
            }
        }
    }
}
