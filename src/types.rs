//! Core value types: positions, selections and token tags
//!
//! Everything here is plain data. Nothing in this module knows about the
//! buffer; operations that need line lengths take a [`LineLengths`] source.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Range;

/// Syntax classification assigned per character by a tokenizer
pub type TokenTag = u16;

/// Tag carried by selections and characters nobody has classified
pub const PLAIN_TOKEN: TokenTag = 0;

/// Anything that can report how many columns a row has
pub trait LineLengths {
    fn line_length(&self, row: usize) -> usize;
}

// ========== Position ==========

/// A (row, column) coordinate into the document
///
/// Columns count characters, not bytes. `column == line length` is the
/// end-of-line slot where a caret can rest. Ordering is row-major.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub const ZERO: Self = Self { row: 0, column: 0 };

    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Offset by a signed amount on each axis, saturating at zero
    pub fn translated(self, rows: isize, columns: isize) -> Self {
        Self {
            row: self.row.saturating_add_signed(rows),
            column: self.column.saturating_add_signed(columns),
        }
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}

// ========== Selection ==========

/// Which end(s) of a selection an operation moves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionPart {
    Head,
    Tail,
    Both,
}

/// A caret or a range between `head` and `tail`
///
/// No order is enforced between the two ends; [`Selection::oriented`] gives
/// the head-first view on demand. Ranges exclude the column at the far end
/// and include every row they touch.
///
/// Equality compares the endpoints only, the style tag is decoration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Selection {
    pub head: Position,
    pub tail: Position,
    /// Tag for token zones and squiggles, ignored for user selections
    pub style: TokenTag,
}

impl Selection {
    pub fn new(head: Position, tail: Position) -> Self {
        Self { head, tail, style: PLAIN_TOKEN }
    }

    /// Create a singular selection (just a caret)
    pub fn caret(at: Position) -> Self {
        Self::new(at, at)
    }

    /// Create a selection from raw row/column pairs
    pub fn from_rows(r0: usize, c0: usize, r1: usize, c1: usize) -> Self {
        Self::new(Position::new(r0, c0), Position::new(r1, c1))
    }

    /// The shape `content` occupies when inserted at the origin
    ///
    /// Head is (0, 0); tail sits after the last character, one row per line break.
    pub fn from_content(content: &str) -> Self {
        let rows = content.matches('\n').count();
        let last_line = content.rsplit('\n').next().unwrap_or("");
        Self::new(Position::ZERO, Position::new(rows, last_line.chars().count()))
    }

    pub fn with_style(mut self, style: TokenTag) -> Self {
        self.style = style;
        self
    }

    /// Whether head and tail coincide
    pub fn is_singular(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_single_line(&self) -> bool {
        self.head.row == self.tail.row
    }

    /// Whether head comes at or before tail
    pub fn is_oriented(&self) -> bool {
        self.head <= self.tail
    }

    /// Copy with head <= tail
    pub fn oriented(&self) -> Self {
        if self.is_oriented() { *self } else { self.swapped() }
    }

    /// Copy with head and tail exchanged
    pub fn swapped(&self) -> Self {
        Self { head: self.tail, tail: self.head, style: self.style }
    }

    /// Widen to whole lines: head to column 0, tail to its row's last column
    pub fn horizontally_maximized(&self, lines: &impl LineLengths) -> Self {
        let mut s = self.oriented();
        s.head.column = 0;
        s.tail.column = lines.line_length(s.tail.row);
        s
    }

    /// The shape this selection takes once `content` replaces it
    ///
    /// Anchored at the oriented head; keeps this selection's orientation.
    pub fn measuring(&self, content: &str) -> Self {
        let shape = Self::from_content(content).starting_from(self.oriented().head);
        let shape = shape.with_style(self.style);
        if self.is_oriented() { shape } else { shape.swapped() }
    }

    /// Re-base to `index`, preserving the span
    ///
    /// The earlier end moves to `index`. The later end keeps its offset from
    /// it; on the first row that offset is a column offset, below it only the
    /// row shifts.
    pub fn starting_from(&self, index: Position) -> Self {
        let oriented = self.oriented();
        let rows = oriented.tail.row - oriented.head.row;
        let end_column = if rows == 0 {
            index.column + (oriented.tail.column - oriented.head.column)
        } else {
            oriented.tail.column
        };
        let rebased = Self {
            head: index,
            tail: Position::new(index.row + rows, end_column),
            style: self.style,
        };
        if self.is_oriented() { rebased } else { rebased.swapped() }
    }

    /// Whether `row` lies within the rows this selection touches
    pub fn intersects_row(&self, row: usize) -> bool {
        let s = self.oriented();
        s.head.row <= row && row <= s.tail.row
    }

    /// Columns this selection covers on `row`, given that row's length
    pub fn column_range_on_row(&self, row: usize, columns: usize) -> Range<usize> {
        let s = self.oriented();
        if !self.intersects_row(row) {
            return 0..0;
        }
        let start = if row == s.head.row { s.head.column.min(columns) } else { 0 };
        let end = if row == s.tail.row { s.tail.column.min(columns) } else { columns };
        start..end.max(start)
    }

    /// Whether `index` lies within [head, tail)
    pub fn contains(&self, index: Position) -> bool {
        let s = self.oriented();
        s.head <= index && index < s.tail
    }

    // ========== Edit transforms ==========

    /// Move `index` as if the text under `self` had been removed
    pub fn pull(&self, index: &mut Position) {
        let s = self.oriented();
        if *index < s.head {
            return;
        }
        if *index <= s.tail {
            *index = s.head;
        } else if index.row == s.tail.row {
            *index = Position::new(s.head.row, s.head.column + index.column - s.tail.column);
        } else {
            index.row -= s.tail.row - s.head.row;
        }
    }

    /// Move `index` as if the text under `self` had just appeared
    pub fn push(&self, index: &mut Position) {
        let s = self.oriented();
        if *index < s.head {
            return;
        }
        if index.row == s.head.row {
            *index = Position::new(s.tail.row, s.tail.column + index.column - s.head.column);
        } else {
            index.row += s.tail.row - s.head.row;
        }
    }

    /// Adjust both ends for the disappearance of `other`
    pub fn pull_by(&mut self, other: &Selection) {
        other.pull(&mut self.head);
        other.pull(&mut self.tail);
    }

    /// Adjust both ends for the appearance of `other`
    pub fn push_by(&mut self, other: &Selection) {
        other.push(&mut self.head);
        other.push(&mut self.tail);
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head && self.tail == other.tail
    }
}

impl Eq for Selection {}

impl PartialOrd for Selection {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Selection {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.oriented(), other.oriented());
        a.head.cmp(&b.head).then_with(|| a.tail.cmp(&b.tail))
    }
}
