//! Per-line layout entry
//!
//! One [`LineEntry`] exists per buffer row. It owns the row's text, the
//! per-character token tags and the column to (sub-row, sub-column) table.
//! Geometry is recomputed lazily when the entry is dirty.

use bevy::log::error;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use crate::types::{TokenTag, PLAIN_TOKEN};
use super::wrap::{glyph_width, wrap_breaks};
use super::LayoutParams;

/// Where a column lands once its line is laid out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SubPosition {
    /// Rendered row within the line (0 unless wrapped)
    pub sub_row: usize,
    /// Visual column within that rendered row, tabs expanded
    pub sub_col: usize,
}

/// What to do with a column lookup past the end of a line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutOfBoundsMode {
    /// Start of the (imaginary) rendered row below the line
    NextLine,
    /// The last character of the line
    LastCharacter,
    /// The slot just after the last character (caret at end of line)
    BeyondLastCharacter,
    /// Contract violation: fatal in debug builds, origin in release
    Assert,
}

/// Memoized layout of one line
#[derive(Clone, Debug)]
pub struct LineEntry {
    text: String,
    chars: Vec<char>,
    hash: u64,
    tokens: Vec<TokenTag>,
    positions: Vec<SubPosition>,
    widths: Vec<usize>,
    row_widths: Vec<usize>,
    dirty: bool,
}

impl LineEntry {
    /// Create a dirty entry for `text`
    pub fn new(text: String, params: LayoutParams) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let hash = content_hash(&text, params);
        Self {
            tokens: vec![PLAIN_TOKEN; chars.len()],
            text,
            chars,
            hash,
            positions: Vec::new(),
            widths: Vec::new(),
            row_widths: vec![0],
            dirty: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of columns (characters)
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Hash of (text, layout parameters) this entry was built for
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-key the entry for new layout parameters, dirtying it on change
    pub(crate) fn rekey(&mut self, params: LayoutParams) -> bool {
        let hash = content_hash(&self.text, params);
        if hash == self.hash {
            return false;
        }
        self.hash = hash;
        self.dirty = true;
        true
    }

    /// Recompute geometry if dirty; returns whether work was done
    pub fn ensure_valid(&mut self, params: LayoutParams) -> bool {
        if !self.dirty {
            return false;
        }

        let breaks = match params.wrap_column {
            Some(wrap) => wrap_breaks(&self.chars, wrap, params.tab_size),
            None => Vec::new(),
        };

        self.positions.clear();
        self.widths.clear();
        self.row_widths.clear();

        let mut breaks = breaks.into_iter().peekable();
        let mut sub_row = 0;
        let mut sub_col = 0;

        for (i, &ch) in self.chars.iter().enumerate() {
            if breaks.next_if_eq(&i).is_some() {
                self.row_widths.push(sub_col);
                sub_row += 1;
                sub_col = 0;
            }
            let width = glyph_width(ch, sub_col, params.tab_size);
            self.positions.push(SubPosition { sub_row, sub_col });
            self.widths.push(width);
            sub_col += width;
        }
        self.row_widths.push(sub_col);

        self.dirty = false;
        true
    }

    /// Number of rendered rows this line occupies (at least one)
    pub fn sub_row_count(&self) -> usize {
        self.row_widths.len().max(1)
    }

    /// Sub-columns used on each rendered row
    pub fn row_widths(&self) -> &[usize] {
        &self.row_widths
    }

    /// Widest rendered row, in sub-columns
    pub fn max_row_width(&self) -> usize {
        self.row_widths.iter().copied().max().unwrap_or(0)
    }

    /// Sub-columns occupied by the glyph at `column` (0 past the end)
    pub fn glyph_width(&self, column: usize) -> usize {
        self.widths.get(column).copied().unwrap_or(0)
    }

    /// Layout position of `column`, applying `mode` past the end
    pub fn position(&self, column: usize, mode: OutOfBoundsMode) -> SubPosition {
        debug_assert!(!self.dirty, "layout queried before ensure_valid");

        if let Some(p) = self.positions.get(column) {
            return *p;
        }

        match mode {
            OutOfBoundsMode::NextLine => SubPosition {
                sub_row: self.sub_row_count(),
                sub_col: 0,
            },
            OutOfBoundsMode::LastCharacter => self.positions.last().copied().unwrap_or_default(),
            OutOfBoundsMode::BeyondLastCharacter => {
                let sub_row = self.sub_row_count() - 1;
                SubPosition {
                    sub_row,
                    sub_col: self.row_widths.get(sub_row).copied().unwrap_or(0),
                }
            }
            OutOfBoundsMode::Assert => {
                debug_assert!(false, "column {column} out of bounds (line has {})", self.len());
                error!("column {} out of bounds (line has {})", column, self.len());
                SubPosition::default()
            }
        }
    }

    /// Columns laid out on rendered row `sub_row`
    pub fn columns_on_sub_row(&self, sub_row: usize) -> Range<usize> {
        let start = self.positions.partition_point(|p| p.sub_row < sub_row);
        let end = self.positions.partition_point(|p| p.sub_row <= sub_row);
        start..end
    }

    /// Horizontal extents, per rendered row, covered by `columns`
    ///
    /// Returns `(sub_row, sub-column range)` pairs in order. An empty range
    /// yields nothing.
    pub fn sub_row_spans(&self, columns: Range<usize>) -> Vec<(usize, Range<usize>)> {
        let mut spans: Vec<(usize, Range<usize>)> = Vec::new();
        let end = columns.end.min(self.len());

        for column in columns.start..end {
            let p = self.positions[column];
            let right = p.sub_col + self.widths[column];
            match spans.last_mut() {
                Some((row, span)) if *row == p.sub_row => span.end = right,
                _ => spans.push((p.sub_row, p.sub_col..right)),
            }
        }

        spans
    }

    // ========== Tokens ==========

    pub fn tokens(&self) -> &[TokenTag] {
        &self.tokens
    }

    /// Tag at `column`, or `default` past the tokenized range
    pub fn token_at(&self, column: usize, default: TokenTag) -> TokenTag {
        self.tokens.get(column).copied().unwrap_or(default)
    }

    /// Reset tags on `columns` to plain
    pub fn clear_tokens(&mut self, columns: Range<usize>) {
        self.apply_tokens(columns, PLAIN_TOKEN);
    }

    /// Paint `tag` over `columns`, clipped to the line
    pub fn apply_tokens(&mut self, columns: Range<usize>, tag: TokenTag) {
        let end = columns.end.min(self.tokens.len());
        if columns.start < end {
            self.tokens[columns.start..end].fill(tag);
        }
    }
}

fn content_hash(text: &str, params: LayoutParams) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    params.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laid_out(text: &str, params: LayoutParams) -> LineEntry {
        let mut entry = LineEntry::new(text.to_string(), params);
        assert!(entry.ensure_valid(params));
        entry
    }

    #[test]
    fn test_plain_line_positions() {
        let entry = laid_out("abc", LayoutParams::default());
        assert_eq!(entry.sub_row_count(), 1);
        assert_eq!(entry.position(2, OutOfBoundsMode::Assert), SubPosition { sub_row: 0, sub_col: 2 });
        assert_eq!(entry.row_widths(), &[3]);
    }

    #[test]
    fn test_tabs_expand_to_stops() {
        let entry = laid_out("a\tb\t", LayoutParams::default());
        assert_eq!(entry.position(1, OutOfBoundsMode::Assert).sub_col, 1);
        assert_eq!(entry.glyph_width(1), 3);
        assert_eq!(entry.position(2, OutOfBoundsMode::Assert).sub_col, 4);
        assert_eq!(entry.glyph_width(3), 3);
        assert_eq!(entry.max_row_width(), 8);
    }

    #[test]
    fn test_out_of_bounds_policies() {
        let entry = laid_out("abcd", LayoutParams::default());
        assert_eq!(
            entry.position(9, OutOfBoundsMode::NextLine),
            SubPosition { sub_row: 1, sub_col: 0 }
        );
        assert_eq!(
            entry.position(9, OutOfBoundsMode::LastCharacter),
            SubPosition { sub_row: 0, sub_col: 3 }
        );
        assert_eq!(
            entry.position(4, OutOfBoundsMode::BeyondLastCharacter),
            SubPosition { sub_row: 0, sub_col: 4 }
        );

        let empty = laid_out("", LayoutParams::default());
        assert_eq!(empty.position(0, OutOfBoundsMode::LastCharacter), SubPosition::default());
        assert_eq!(empty.position(0, OutOfBoundsMode::BeyondLastCharacter), SubPosition::default());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of bounds")]
    fn test_assert_mode_is_fatal_in_debug() {
        let entry = laid_out("ab", LayoutParams::default());
        entry.position(5, OutOfBoundsMode::Assert);
    }

    #[test]
    fn test_wrapped_line_sub_rows() {
        let params = LayoutParams { wrap_column: Some(4), tab_size: 4 };
        let entry = laid_out("abcdefghij", params);
        assert_eq!(entry.sub_row_count(), 3);
        assert_eq!(entry.position(5, OutOfBoundsMode::Assert), SubPosition { sub_row: 1, sub_col: 1 });
        assert_eq!(entry.columns_on_sub_row(1), 4..8);
        assert_eq!(
            entry.position(10, OutOfBoundsMode::BeyondLastCharacter),
            SubPosition { sub_row: 2, sub_col: 2 }
        );
    }

    #[test]
    fn test_sub_row_spans_split_on_wrap() {
        let params = LayoutParams { wrap_column: Some(4), tab_size: 4 };
        let entry = laid_out("abcdefgh", params);
        assert_eq!(entry.sub_row_spans(2..6), vec![(0, 2..4), (1, 0..2)]);
        assert!(entry.sub_row_spans(3..3).is_empty());
    }

    #[test]
    fn test_rekey_only_dirties_on_change() {
        let params = LayoutParams::default();
        let mut entry = laid_out("abc", params);
        assert!(!entry.rekey(params));
        assert!(!entry.ensure_valid(params));

        let wrapped = LayoutParams { wrap_column: Some(2), ..params };
        assert!(entry.rekey(wrapped));
        assert!(entry.ensure_valid(wrapped));
        assert_eq!(entry.sub_row_count(), 2);
    }

    #[test]
    fn test_tokens_default_past_end() {
        let mut entry = laid_out("let x", LayoutParams::default());
        entry.apply_tokens(0..3, 7);
        assert_eq!(entry.token_at(1, 0), 7);
        assert_eq!(entry.token_at(4, 0), 0);
        assert_eq!(entry.token_at(99, 42), 42);
        entry.clear_tokens(0..99);
        assert!(entry.tokens().iter().all(|&t| t == PLAIN_TOKEN));
    }
}
