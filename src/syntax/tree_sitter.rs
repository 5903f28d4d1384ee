//! Tree-sitter backed tokenizer using the low-level QueryCursor API

use bevy::prelude::*;
use ropey::Rope;
use std::ops::Range;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor, Tree};
use crate::error::EditorError;
use crate::types::{Position, TokenTag};
use super::highlighter::tag_for_capture;
use super::{tags, TokenZone, Tokenizer};

/// Text provider for tree-sitter that wraps a Rope
struct RopeProvider<'a>(&'a Rope);

struct RopeChunks<'a> {
    chunks: ropey::iter::Chunks<'a>,
}

impl<'a> tree_sitter::TextProvider<&'a [u8]> for RopeProvider<'a> {
    type I = RopeChunks<'a>;

    fn text(&mut self, node: tree_sitter::Node) -> Self::I {
        let byte_range = node.byte_range();
        let start_char = self.0.byte_to_char(byte_range.start);
        let end_char = self.0.byte_to_char(byte_range.end.min(self.0.len_bytes()));
        RopeChunks {
            chunks: self.0.slice(start_char..end_char).chunks(),
        }
    }
}

impl<'a> Iterator for RopeChunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next().map(|s| s.as_bytes())
    }
}

/// Zero-copy rope reader for tree-sitter parsing
struct RopeReader<'a> {
    rope: &'a Rope,
    chunks: ropey::iter::Chunks<'a>,
    current_chunk: &'a [u8],
    total_byte_offset: usize,
}

impl<'a> RopeReader<'a> {
    fn new(rope: &'a Rope) -> Self {
        let mut chunks = rope.chunks();
        let current_chunk = chunks.next().map(|s| s.as_bytes()).unwrap_or(b"");
        Self {
            rope,
            chunks,
            current_chunk,
            total_byte_offset: 0,
        }
    }

    fn read(&mut self, byte_offset: usize) -> &'a [u8] {
        // Seeking backwards restarts from the first chunk
        if byte_offset < self.total_byte_offset {
            *self = Self::new(self.rope);
        }

        while self.total_byte_offset + self.current_chunk.len() <= byte_offset {
            self.total_byte_offset += self.current_chunk.len();
            self.current_chunk = self.chunks.next().map(|s| s.as_bytes()).unwrap_or(b"");
            if self.current_chunk.is_empty() {
                return b"";
            }
        }

        let offset_in_chunk = byte_offset.saturating_sub(self.total_byte_offset);
        &self.current_chunk[offset_in_chunk.min(self.current_chunk.len())..]
    }
}

fn position_of_byte(rope: &Rope, byte: usize) -> Position {
    let char_index = rope.byte_to_char(byte.min(rope.len_bytes()));
    let row = rope.char_to_line(char_index);
    Position::new(row, char_index - rope.line_to_char(row))
}

/// Tokenizer driven by a tree-sitter grammar and highlights query
///
/// The whole buffer is parsed on each call; only captures overlapping the
/// requested rows are turned into zones.
pub struct TreeSitterTokenizer {
    parser: Parser,
    query: Query,
    query_cursor: QueryCursor,
    /// Tag per capture index, resolved once
    capture_tags: Vec<TokenTag>,
    tree: Option<Tree>,
}

impl TreeSitterTokenizer {
    pub fn new(language: Language, highlights_query: &str) -> Result<Self, EditorError> {
        let query = Query::new(&language, highlights_query)?;
        let mut parser = Parser::new();
        parser.set_language(&language)?;

        let capture_tags = query.capture_names().iter().map(|name| tag_for_capture(name)).collect();

        Ok(Self {
            parser,
            query,
            query_cursor: QueryCursor::new(),
            capture_tags,
            tree: None,
        })
    }

    /// Tree from the latest parse
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    fn parse(&mut self, rope: &Rope) {
        let mut reader = RopeReader::new(rope);
        let mut callback = |byte_offset: usize, _position: tree_sitter::Point| -> &[u8] {
            reader.read(byte_offset)
        };
        self.tree = self.parser.parse_with(&mut callback, None);
        if self.tree.is_none() {
            warn!("tree-sitter parse produced no tree");
        }
    }
}

impl Tokenizer for TreeSitterTokenizer {
    fn tokenize(&mut self, rope: &Rope, rows: Range<usize>) -> Vec<TokenZone> {
        self.parse(rope);
        let Some(tree) = &self.tree else {
            return Vec::new();
        };

        let start_byte = rope.line_to_byte(rows.start.min(rope.len_lines()));
        let end_byte = rope.line_to_byte(rows.end.min(rope.len_lines()));
        self.query_cursor.set_byte_range(start_byte..end_byte);

        let mut captures = self.query_cursor.captures(&self.query, tree.root_node(), RopeProvider(rope));
        let mut zones = Vec::new();

        while let Some((match_ref, capture_index)) = captures.next() {
            let capture = &match_ref.captures[*capture_index];
            let tag = self.capture_tags.get(capture.index as usize).copied().unwrap_or(tags::PLAIN);
            if tag == tags::PLAIN {
                continue;
            }
            let range = capture.node.byte_range();
            zones.push(
                TokenZone::new(position_of_byte(rope, range.start), position_of_byte(rope, range.end))
                    .with_style(tag),
            );
        }

        zones
    }
}
