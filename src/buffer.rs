//! Row store backed by a rope
//!
//! The buffer speaks in [`Position`]s and char offsets. Every mutation returns
//! a [`BufferChange`] describing the edit in both coordinate systems so the
//! document can resynchronize its line cache incrementally.

use ropey::Rope;
use crate::types::{LineLengths, Position};

/// A single replacement applied to the buffer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferChange {
    /// Char offset where the edit started
    pub start_char: usize,
    /// Char offset where the removed text ended (before the edit)
    pub old_end_char: usize,
    /// Char offset where the inserted text ends (after the edit)
    pub new_end_char: usize,
    /// First row touched by the edit
    pub start_row: usize,
    /// Last row of the removed text (before the edit)
    pub old_end_row: usize,
    /// Last row of the inserted text (after the edit)
    pub new_end_row: usize,
    /// Buffer version after this edit
    pub version: u64,
}

impl BufferChange {
    /// Net change in the number of rows
    pub fn row_delta(&self) -> isize {
        self.new_end_row as isize - self.old_end_row as isize
    }
}

/// Line-oriented text storage
///
/// Rows are split on `'\n'` only; a trailing newline yields a final empty
/// row, and an empty buffer has one empty row.
#[derive(Clone, Debug, Default)]
pub struct TextBuffer {
    rope: Rope,
    version: u64,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(&normalize_line_endings(text)),
            version: 0,
        }
    }

    /// Cheap copy of the current text for readers on other threads
    pub fn snapshot(&self) -> Rope {
        self.rope.clone()
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len_rows(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Text of `row` without its line break, empty past the end
    pub fn line(&self, row: usize) -> String {
        if row >= self.len_rows() {
            return String::new();
        }
        let mut line: String = self.rope.line(row).chars().collect();
        if line.ends_with('\n') {
            line.pop();
        }
        line
    }

    /// Number of columns on `row`, excluding the line break
    pub fn row_length(&self, row: usize) -> usize {
        if row >= self.len_rows() {
            return 0;
        }
        let line = self.rope.line(row);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Character at `index`, `None` at or past end of line
    pub fn char_at(&self, index: Position) -> Option<char> {
        if index.column >= self.row_length(index.row) {
            return None;
        }
        Some(self.rope.char(self.char_index(index)))
    }

    /// Char offset for a position, clamped into the buffer
    pub fn char_index(&self, index: Position) -> usize {
        let rows = self.len_rows();
        if index.row >= rows {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(index.row) + index.column.min(self.row_length(index.row))
    }

    /// Position of a char offset, clamped into the buffer
    pub fn position_of(&self, char_index: usize) -> Position {
        let char_index = char_index.min(self.rope.len_chars());
        let row = self.rope.char_to_line(char_index);
        Position::new(row, char_index - self.rope.line_to_char(row))
    }

    /// Text between two positions (in either order)
    pub fn text_between(&self, a: Position, b: Position) -> String {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let (start, end) = (self.char_index(start), self.char_index(end));
        self.rope.slice(start..end).to_string()
    }

    /// Replace the text between `start` and `end` with `text`
    pub fn replace(&mut self, start: Position, end: Position, text: &str) -> BufferChange {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let start_char = self.char_index(start);
        let old_end_char = self.char_index(end);
        let start_row = self.rope.char_to_line(start_char);
        let old_end_row = self.rope.char_to_line(old_end_char);

        let text = normalize_line_endings(text);
        if old_end_char > start_char {
            self.rope.remove(start_char..old_end_char);
        }
        if !text.is_empty() {
            self.rope.insert(start_char, &text);
        }

        let new_end_char = start_char + text.chars().count();
        self.version += 1;

        BufferChange {
            start_char,
            old_end_char,
            new_end_char,
            start_row,
            old_end_row,
            new_end_row: self.rope.char_to_line(new_end_char),
            version: self.version,
        }
    }

    /// Replace the whole text
    pub fn replace_all(&mut self, text: &str) -> BufferChange {
        let end = self.position_of(self.rope.len_chars());
        self.replace(Position::ZERO, end, text)
    }
}

impl LineLengths for TextBuffer {
    fn line_length(&self, row: usize) -> usize {
        self.row_length(row)
    }
}

impl std::fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

/// Convert "\r\n" and lone '\r' to '\n'
pub(crate) fn normalize_line_endings(text: &str) -> std::borrow::Cow<'_, str> {
    if text.contains('\r') {
        std::borrow::Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        std::borrow::Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_newlines() {
        let buffer = TextBuffer::new("abc\ndef\n");
        assert_eq!(buffer.len_rows(), 3);
        assert_eq!(buffer.line(0), "abc");
        assert_eq!(buffer.line(2), "");
        assert_eq!(buffer.row_length(1), 3);

        let empty = TextBuffer::new("");
        assert_eq!(empty.len_rows(), 1);
        assert_eq!(empty.row_length(0), 0);
    }

    #[test]
    fn test_char_index_round_trip() {
        let buffer = TextBuffer::new("ab\ncdé\nf");
        let p = Position::new(1, 2);
        assert_eq!(buffer.position_of(buffer.char_index(p)), p);
        assert_eq!(buffer.char_at(p), Some('é'));
        assert_eq!(buffer.char_at(Position::new(1, 3)), None);
        // clamped column
        assert_eq!(buffer.char_index(Position::new(0, 99)), 2);
    }

    #[test]
    fn test_replace_reports_rows() {
        let mut buffer = TextBuffer::new("abc\ndef");
        let change = buffer.replace(Position::new(0, 3), Position::new(0, 3), "\n");
        assert_eq!(buffer.to_string(), "abc\n\ndef");
        assert_eq!(change.start_row, 0);
        assert_eq!(change.old_end_row, 0);
        assert_eq!(change.new_end_row, 1);
        assert_eq!(change.row_delta(), 1);
        assert_eq!(change.version, 1);

        let change = buffer.replace(Position::new(1, 0), Position::new(0, 1), "");
        assert_eq!(buffer.to_string(), "a\ndef");
        assert_eq!(change.old_end_char - change.start_char, 3);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let buffer = TextBuffer::new("a\r\nb\rc");
        assert_eq!(buffer.len_rows(), 3);
        assert_eq!(buffer.to_string(), "a\nb\nc");
    }

    #[test]
    fn test_text_between_any_order() {
        let buffer = TextBuffer::new("abcdef\nghijkl");
        let a = Position::new(0, 0);
        let b = Position::new(1, 2);
        assert_eq!(buffer.text_between(a, b), "abcdef\ngh");
        assert_eq!(buffer.text_between(b, a), "abcdef\ngh");
    }
}
