//! Syntax classification
//!
//! Tokenizers turn buffer text into [`TokenZone`]s, selections whose style
//! carries a tag from [`tags`]. The document paints zones onto its line
//! cache; nothing here touches the document directly.

pub mod highlighter;
mod simple;

#[cfg(feature = "tree-sitter")]
pub mod tree_sitter;

pub use highlighter::{tag_for_capture, tag_name};
pub use simple::{SimpleTokenizer, TokenStream};

#[cfg(feature = "tree-sitter")]
pub use tree_sitter::TreeSitterTokenizer;

use ropey::Rope;
use std::ops::Range;
use crate::types::Selection;

/// A classified span; its `style` is the tag
pub type TokenZone = Selection;

/// Tag values shared by the built-in tokenizers
pub mod tags {
    use crate::types::TokenTag;

    pub const PLAIN: TokenTag = 0;
    pub const COMMENT: TokenTag = 1;
    pub const KEYWORD: TokenTag = 2;
    pub const OPERATOR: TokenTag = 3;
    pub const IDENTIFIER: TokenTag = 4;
    pub const NUMBER: TokenTag = 5;
    pub const STRING: TokenTag = 6;
    pub const BRACKET: TokenTag = 7;
    pub const PUNCTUATION: TokenTag = 8;
    pub const PREPROCESSOR: TokenTag = 9;
    pub const TYPE: TokenTag = 10;
    pub const FUNCTION: TokenTag = 11;
    pub const CONSTANT: TokenTag = 12;
    pub const PROPERTY: TokenTag = 13;
    pub const VARIABLE: TokenTag = 14;

    /// One past the largest tag
    pub const COUNT: TokenTag = 15;
}

/// Source of token zones for a row range
pub trait Tokenizer {
    /// Zones covering (at least) `rows` of `rope`
    ///
    /// Zones may start above `rows.start` or run past `rows.end`; the
    /// document clips them.
    fn tokenize(&mut self, rope: &Rope, rows: Range<usize>) -> Vec<TokenZone>;
}
