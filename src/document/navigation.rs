//! Caret navigation
//!
//! `navigate` is a stepping loop: advance one character (or row) at a time
//! until a per-target predicate flips. Backward directions test the
//! character just behind the cursor, so moving left by a category stops at
//! the start of the run rather than inside it.

use bevy::log::error;
use serde::{Deserialize, Serialize};
use crate::types::{Position, SelectionPart, TokenTag};
use super::TextDocument;

/// Category of text a navigation step moves across
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// One character
    Character,
    /// Up to the next whitespace character
    Whitespace,
    /// Up to the next punctuation character (`{}<>()[],.;:`)
    Punctuation,
    /// Across letters, digits and underscores
    Subword,
    /// Like `Subword` but also across '.'
    SubwordWithPoint,
    /// Across whitespace to the next word
    Word,
    /// Leading whitespace of the line ("smart home")
    FirstNonWhitespace,
    /// Across characters with the same syntax tag
    Token,
    /// To the line boundary
    Line,
    /// Until an empty row
    Paragraph,
    /// Enclosing bracket scope (not implemented)
    Scope,
    /// To the document boundary
    Document,
}

/// Axis and sense of a navigation step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    ForwardRow,
    BackwardRow,
    ForwardCol,
    BackwardCol,
}

impl Direction {
    pub fn is_backward(self) -> bool {
        matches!(self, Direction::BackwardRow | Direction::BackwardCol)
    }
}

const PUNCTUATION: &str = "{}<>()[],.;:";

fn is_subword(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl TextDocument {
    /// Character at `index`; '\n' at or past the end of a line
    pub fn get_character(&self, index: Position) -> char {
        self.lines
            .get(index.row)
            .and_then(|entry| entry.chars().get(index.column).copied())
            .unwrap_or('\n')
    }

    /// Last valid position (end of the last row)
    pub fn get_end(&self) -> Position {
        let row = self.get_num_rows().saturating_sub(1);
        Position::new(row, self.get_num_columns(row))
    }

    /// Step exactly one character forward, wrapping onto the next row
    ///
    /// Folded rows are not skipped; only row movement honours folds.
    pub fn next(&self, index: &mut Position) -> bool {
        if index.column < self.get_num_columns(index.row) {
            index.column += 1;
            return true;
        }
        if index.row + 1 < self.get_num_rows() {
            *index = Position::new(index.row + 1, 0);
            return true;
        }
        false
    }

    /// Step exactly one character backward, wrapping onto the end of the previous row
    pub fn prev(&self, index: &mut Position) -> bool {
        if index.column > 0 {
            index.column = index.column.min(self.get_num_columns(index.row)).saturating_sub(1);
            return true;
        }
        if index.row > 0 {
            let row = index.row - 1;
            *index = Position::new(row, self.get_num_columns(row));
            return true;
        }
        false
    }

    /// Move to the next visible row, keeping the column where possible
    ///
    /// On the last row the caret goes to the end of the line instead.
    pub fn next_row(&self, index: &mut Position) -> bool {
        match self.next_visible_row(index.row) {
            Some(row) => {
                *index = Position::new(row, index.column.min(self.get_num_columns(row)));
                true
            }
            None => {
                let end = self.get_num_columns(index.row);
                let moved = index.column != end;
                index.column = end;
                moved
            }
        }
    }

    /// Move to the previous visible row, keeping the column where possible
    ///
    /// On the first row the caret goes to column 0 instead.
    pub fn prev_row(&self, index: &mut Position) -> bool {
        match self.prev_visible_row(index.row) {
            Some(row) => {
                *index = Position::new(row, index.column.min(self.get_num_columns(row)));
                true
            }
            None => {
                let moved = index.column != 0;
                index.column = 0;
                moved
            }
        }
    }

    fn advance(&self, index: &mut Position, direction: Direction) -> bool {
        match direction {
            Direction::ForwardRow => self.next_row(index),
            Direction::BackwardRow => self.prev_row(index),
            Direction::ForwardCol => self.next(index),
            Direction::BackwardCol => self.prev(index),
        }
    }

    /// Character the predicate looks at: under the cursor going forward,
    /// behind it going backward (document start reads as a line break)
    fn peek(&self, index: Position, direction: Direction) -> char {
        if !direction.is_backward() {
            return self.get_character(index);
        }
        let mut behind = index;
        if self.prev(&mut behind) {
            self.get_character(behind)
        } else {
            '\n'
        }
    }

    /// Tag at `index`, or `default` past the end of its row
    pub fn get_token_at(&self, index: Position, default: Option<TokenTag>) -> Option<TokenTag> {
        match self.lines.get(index.row) {
            Some(entry) if index.column < entry.len() => Some(entry.token_at(index.column, 0)),
            _ => default,
        }
    }

    /// Move `index` across `target` in `direction`
    pub fn navigate(&self, index: &mut Position, target: Target, direction: Direction) {
        *index = self.clamp(*index);
        let d = direction;

        match target {
            Target::Character => {
                self.advance(index, d);
            }
            Target::Whitespace => {
                while !self.peek(*index, d).is_whitespace() && self.advance(index, d) {}
            }
            Target::Punctuation => {
                while !PUNCTUATION.contains(self.peek(*index, d)) && self.advance(index, d) {}
            }
            Target::Subword => {
                while is_subword(self.peek(*index, d)) && self.advance(index, d) {}
            }
            Target::SubwordWithPoint => {
                while {
                    let c = self.peek(*index, d);
                    is_subword(c) || c == '.'
                } && self.advance(index, d)
                {}
            }
            Target::Word => {
                while self.peek(*index, d).is_whitespace() && self.advance(index, d) {}
            }
            Target::FirstNonWhitespace => {
                let chars = self.lines.get(index.row).map(|e| e.chars()).unwrap_or(&[]);
                let first = chars
                    .iter()
                    .position(|c| !c.is_whitespace())
                    .unwrap_or(chars.len());
                let text_behind = chars[..index.column.min(chars.len())]
                    .iter()
                    .any(|c| !c.is_whitespace());
                index.column = if text_behind { first } else { 0 };
            }
            Target::Token => {
                let start = self.get_token_at(*index, None);
                let mut current = start;
                while current == start && self.advance(index, d) {
                    if self.get_num_columns(index.row) > 0 {
                        current = self.get_token_at(*index, start);
                    }
                }
            }
            Target::Line => {
                while self.peek(*index, d) != '\n' && self.advance(index, d) {}
            }
            Target::Paragraph => {
                while self.get_num_columns(index.row) > 0 && self.advance(index, d) {}
            }
            Target::Scope => {
                debug_assert!(false, "scope navigation is not implemented");
                error!("scope navigation is not implemented, caret left in place");
            }
            Target::Document => {
                while self.advance(index, d) {}
            }
        }
    }

    /// Apply [`navigate`](Self::navigate) to every selection
    ///
    /// `SelectionPart::Both` moves the head and collapses the tail onto it.
    pub fn navigate_selections(&mut self, target: Target, direction: Direction, part: SelectionPart) {
        let mut selections = self.selections.clone();
        for selection in &mut selections {
            match part {
                SelectionPart::Head => self.navigate(&mut selection.head, target, direction),
                SelectionPart::Tail => self.navigate(&mut selection.tail, target, direction),
                SelectionPart::Both => {
                    self.navigate(&mut selection.head, target, direction);
                    selection.tail = selection.head;
                }
            }
        }
        self.selections = selections;
        self.selections_changed();
    }
}
