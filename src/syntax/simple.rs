//! Hand-written lexer for C-family text
//!
//! [`TokenStream`] pulls one token at a time from a rope and reports where it
//! ends. Leading whitespace belongs to the token that follows it, so the
//! zones built from consecutive end positions tile the text without gaps.

use ropey::Rope;
use std::ops::Range;
use crate::types::{Position, TokenTag};
use super::{tags, TokenZone, Tokenizer};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "auto", "break", "case", "const", "continue", "crate", "default", "do",
    "dyn", "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop",
    "match", "mod", "move", "mut", "namespace", "pub", "ref", "return", "self", "Self", "static",
    "struct", "super", "switch", "template", "trait", "true", "type", "typedef", "union",
    "unsafe", "use", "using", "void", "where", "while",
];

const OPERATORS: &str = "+-*/%=<>!&|^~?@$";

/// Pull-based lexer yielding `(tag, end)` pairs
pub struct TokenStream<'a> {
    chars: ropey::iter::Chars<'a>,
    position: Position,
}

impl<'a> TokenStream<'a> {
    /// Start lexing at the beginning of `row`
    pub fn new(rope: &'a Rope, row: usize) -> Self {
        let row = row.min(rope.len_lines().saturating_sub(1));
        Self {
            chars: rope.chars_at(rope.line_to_char(row)),
            position: Position::new(row, 0),
        }
    }

    /// Where the next token starts (including its leading whitespace)
    pub fn position(&self) -> Position {
        self.position
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.position = Position::new(self.position.row + 1, 0);
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, mut keep: impl FnMut(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            taken.push(c);
            self.bump();
        }
        taken
    }

    fn block_comment(&mut self) {
        let mut previous = '\0';
        while let Some(c) = self.bump() {
            if previous == '*' && c == '/' {
                return;
            }
            previous = c;
        }
    }

    fn quoted(&mut self, quote: char) {
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if c == '\n' {
                return;
            }
            self.bump();
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                return;
            }
        }
    }

    fn lex(&mut self, first: char) -> TokenTag {
        match first {
            '/' if self.peek() == Some('/') => {
                self.bump_while(|c| c != '\n');
                tags::COMMENT
            }
            '/' if self.peek() == Some('*') => {
                self.bump();
                self.block_comment();
                tags::COMMENT
            }
            '"' | '\'' => {
                self.quoted(first);
                tags::STRING
            }
            '#' => {
                self.bump_while(|c| c != '\n');
                tags::PREPROCESSOR
            }
            c if c.is_ascii_digit() => {
                self.bump_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
                tags::NUMBER
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                word.push_str(&self.bump_while(|c| c.is_alphanumeric() || c == '_'));
                if KEYWORDS.contains(&word.as_str()) {
                    tags::KEYWORD
                } else if self.peek() == Some('(') || (self.peek() == Some('!') && self.peek_second() == Some('(')) {
                    tags::FUNCTION
                } else if c.is_uppercase() {
                    tags::TYPE
                } else {
                    tags::IDENTIFIER
                }
            }
            '(' | ')' | '[' | ']' | '{' | '}' => tags::BRACKET,
            ',' | ';' | ':' | '.' => tags::PUNCTUATION,
            c if OPERATORS.contains(c) => {
                self.bump_while(|c| OPERATORS.contains(c));
                tags::OPERATOR
            }
            _ => tags::PLAIN,
        }
    }
}

impl Iterator for TokenStream<'_> {
    type Item = (TokenTag, Position);

    fn next(&mut self) -> Option<Self::Item> {
        self.bump_while(char::is_whitespace);
        let first = self.bump()?;
        let tag = self.lex(first);
        Some((tag, self.position))
    }
}

/// Tokenizer backed by [`TokenStream`]
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleTokenizer;

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&mut self, rope: &Rope, rows: Range<usize>) -> Vec<TokenZone> {
        let mut stream = TokenStream::new(rope, rows.start);
        let mut previous = stream.position();
        let mut zones = Vec::new();

        while previous.row < rows.end {
            let Some((tag, end)) = stream.next() else { break };
            zones.push(TokenZone::new(previous, end).with_style(tag));
            previous = end;
        }
        zones
    }
}
