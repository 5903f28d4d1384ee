//! Transaction fulfillment and content queries

use crate::buffer::normalize_line_endings;
use crate::transaction::{Transaction, BACKSPACE, DELETE};
use crate::types::{Position, Selection};
use super::TextDocument;

impl TextDocument {
    /// Apply `transaction` and return its reciprocal
    ///
    /// The reciprocal's selection covers the inserted text and its content is
    /// the text that was replaced, so fulfilling it restores the buffer.
    /// Every active selection is first pulled out of the replaced range and
    /// then pushed past the inserted one.
    pub fn fulfill(&mut self, transaction: &Transaction) -> Transaction {
        self.invalidate_bounds();

        let (selection, content) = self.normalize(transaction);
        let s = self.clamp_selection(selection).oriented();
        let removed = self.get_selection_content(s);
        let inserted = Selection::from_content(&content).starting_from(s.head);

        for selection in &mut self.selections {
            selection.pull_by(&s);
            selection.push_by(&inserted);
        }

        let change = self.buffer.replace(s.head, s.tail, &content);
        self.apply_buffer_change(change);
        self.selections_changed();

        Transaction {
            selection: inserted,
            content: removed,
            direction: transaction.direction.flipped(),
        }
    }

    /// Resolve backspace/delete sentinels into a plain replacement with '\n' line breaks
    fn normalize(&self, transaction: &Transaction) -> (Selection, String) {
        let mut selection = transaction.selection;
        let mut chars = transaction.content.chars();
        let sentinel = match (chars.next(), chars.next()) {
            (Some(c), None) if c == BACKSPACE || c == DELETE => Some(c),
            _ => None,
        };

        let Some(sentinel) = sentinel else {
            // measured as stored, so the reciprocal covers exactly the inserted text
            return (selection, normalize_line_endings(&transaction.content).into_owned());
        };

        if selection.is_singular() {
            selection.head = self.clamp(selection.head);
            if sentinel == BACKSPACE {
                self.prev(&mut selection.head);
            } else {
                self.next(&mut selection.head);
            }
        }
        (selection, String::new())
    }

    /// Text covered by `selection`, rows joined with '\n'
    pub fn get_selection_content(&self, selection: Selection) -> String {
        let s = selection.oriented();
        self.buffer.text_between(self.clamp(s.head), self.clamp(s.tail))
    }

    /// First occurrence of `target` at or after `start`, within a single row
    ///
    /// Returns a singular selection at the end of the document when there is
    /// no match.
    pub fn search(&self, start: Position, target: &str) -> Selection {
        let needle: Vec<char> = target.chars().collect();
        if needle.is_empty() {
            return Selection::caret(self.get_end());
        }

        let start = self.clamp(start);
        for row in start.row..self.get_num_rows() {
            let chars = self.lines.get(row).map(|e| e.chars()).unwrap_or(&[]);
            let from = if row == start.row { start.column } else { 0 };
            if chars.len() < needle.len() + from {
                continue;
            }
            let found = chars[from..]
                .windows(needle.len())
                .position(|w| w == needle.as_slice());
            if let Some(offset) = found {
                let column = from + offset;
                return Selection::from_rows(row, column, row, column + needle.len());
            }
        }
        Selection::caret(self.get_end())
    }

    /// Next occurrence of `target` starting strictly after `start`, across rows
    pub fn find_next_occurrence(&self, start: Position, target: &str) -> Option<Selection> {
        if target.is_empty() {
            return None;
        }
        let rope = self.buffer.rope();
        let from = self.buffer.char_index(self.clamp(start)) + 1;
        if from > rope.len_chars() {
            return None;
        }

        let rest = rope.slice(from..).to_string();
        let byte = rest.find(target)?;
        let offset = from + rest[..byte].chars().count();
        let head = self.buffer.position_of(offset);
        let tail = self.buffer.position_of(offset + target.chars().count());
        Some(Selection::new(head, tail))
    }

    /// Replace the whole text, clamping selections into the new content
    pub fn replace_all(&mut self, text: &str) {
        let change = self.buffer.replace_all(text);
        self.apply_buffer_change(change);

        let clamped = self
            .selections
            .iter()
            .map(|s| self.clamp_selection(*s))
            .collect();
        self.selections = clamped;
        self.selections_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FoldRegion;
    use crate::settings::DocumentSettings;
    use crate::transaction::TransactionDirection;

    fn doc(text: &str) -> TextDocument {
        TextDocument::new(text, DocumentSettings::default())
    }

    fn lines(d: &TextDocument) -> Vec<String> {
        (0..d.get_num_rows()).map(|r| d.get_line(r).to_string()).collect()
    }

    #[test]
    fn test_insert_newline_then_reciprocal() {
        let mut d = doc("abc\ndef");
        d.set_selections(vec![Selection::caret(Position::new(0, 3))]);

        let reciprocal = d.fulfill(&Transaction::new(Selection::caret(Position::new(0, 3)), "\n"));
        assert_eq!(lines(&d), ["abc", "", "def"]);
        assert_eq!(d.selection(0), Selection::caret(Position::new(1, 0)));
        assert_eq!(reciprocal.selection, Selection::from_rows(0, 3, 1, 0));
        assert_eq!(reciprocal.content, "");
        assert_eq!(reciprocal.direction, TransactionDirection::Reverse);

        d.fulfill(&reciprocal);
        assert_eq!(d.get_text(), "abc\ndef");
        assert_eq!(d.selection(0), Selection::caret(Position::new(0, 3)));
    }

    #[test]
    fn test_round_trip_restores_text_and_other_selections() {
        let original = "fn main() {\n    let x = 1;\n}\n";
        let mut d = doc(original);
        let others = vec![
            Selection::caret(Position::new(0, 1)),
            Selection::from_rows(2, 0, 2, 1),
            Selection::caret(Position::new(3, 0)),
        ];
        d.set_selections(others.clone());

        let t = Transaction::new(Selection::from_rows(1, 4, 1, 13), "let y = 22;\n    y");
        let reciprocal = d.fulfill(&t);
        assert_eq!(d.get_line(2), "    y;");
        let again = d.fulfill(&reciprocal);

        assert_eq!(d.get_text(), original);
        assert_eq!(d.selections(), others.as_slice());
        assert_eq!(again.content, "let y = 22;\n    y");
        assert_eq!(again.direction, TransactionDirection::Forward);
    }

    #[test]
    fn test_selection_content_spans_rows() {
        let d = doc("abcdef\nghijkl");
        assert_eq!(d.get_selection_content(Selection::from_rows(0, 0, 1, 2)), "abcdef\ngh");
        assert_eq!(d.get_selection_content(Selection::from_rows(1, 2, 0, 0)), "abcdef\ngh");
        assert_eq!(d.get_selection_content(Selection::caret(Position::new(1, 3))), "");
    }

    #[test]
    fn test_backspace_and_delete_sentinels() {
        let mut d = doc("ab\ncd");
        let r = d.fulfill(&Transaction::backspace(Selection::caret(Position::new(1, 0))));
        assert_eq!(d.get_text(), "abcd");
        assert_eq!(r.content, "\n");

        d.fulfill(&Transaction::delete(Selection::caret(Position::new(0, 0))));
        assert_eq!(d.get_text(), "bcd");

        // a range is removed whole regardless of the sentinel
        d.fulfill(&Transaction::backspace(Selection::from_rows(0, 0, 0, 2)));
        assert_eq!(d.get_text(), "d");

        // nothing before the document start
        d.fulfill(&Transaction::backspace(Selection::caret(Position::ZERO)));
        assert_eq!(d.get_text(), "d");
    }

    #[test]
    fn test_sentinels_step_one_character_next_to_fold() {
        let mut d = doc("a\nb\nc\nd");
        d.fold_rows(FoldRegion::new(0, 2));
        let r = d.fulfill(&Transaction::backspace(Selection::caret(Position::new(3, 0))));
        assert_eq!(d.get_text(), "a\nb\ncd");
        assert_eq!(r.content, "\n");
        d.fulfill(&r);
        assert_eq!(d.get_text(), "a\nb\nc\nd");

        let mut d = doc("a\nb\nc\nd");
        d.fold_rows(FoldRegion::new(0, 2));
        d.fulfill(&Transaction::delete(Selection::caret(Position::new(0, 1))));
        assert_eq!(d.get_text(), "ab\nc\nd");
    }

    #[test]
    fn test_carriage_returns_round_trip() {
        let mut d = doc("xy");
        d.set_selections(vec![Selection::caret(Position::new(0, 2))]);
        let r = d.fulfill(&Transaction::new(Selection::caret(Position::new(0, 1)), "a\rb"));
        assert_eq!(d.get_text(), "xa\nby");
        assert_eq!(r.selection, Selection::from_rows(0, 1, 1, 1));
        assert_eq!(d.selection(0), Selection::caret(Position::new(1, 2)));
        d.fulfill(&r);
        assert_eq!(d.get_text(), "xy");
        assert_eq!(d.selection(0), Selection::caret(Position::new(0, 2)));

        let r = d.fulfill(&Transaction::new(Selection::caret(Position::new(0, 1)), "1\r\n2\r\n"));
        assert_eq!(d.get_text(), "x1\n2\ny");
        assert_eq!(r.selection, Selection::from_rows(0, 1, 2, 0));
        d.fulfill(&r);
        assert_eq!(d.get_text(), "xy");
    }

    #[test]
    fn test_other_selections_shift_with_edit() {
        let mut d = doc("one two three");
        d.set_selections(vec![
            Selection::caret(Position::new(0, 0)),
            Selection::caret(Position::new(0, 4)),
            Selection::caret(Position::new(0, 8)),
        ]);
        d.fulfill(&Transaction::new(Selection::caret(Position::new(0, 4)), "X\nY"));
        assert_eq!(d.get_text(), "one X\nYtwo three");
        assert_eq!(d.selection(0), Selection::caret(Position::new(0, 0)));
        assert_eq!(d.selection(1), Selection::caret(Position::new(1, 1)));
        assert_eq!(d.selection(2), Selection::caret(Position::new(1, 5)));
    }

    #[test]
    fn test_overlapping_selection_lands_on_boundary() {
        let mut d = doc("abcdefgh");
        d.set_selections(vec![Selection::from_rows(0, 1, 0, 5)]);
        d.fulfill(&Transaction::new(Selection::from_rows(0, 3, 0, 7), "XY"));
        assert_eq!(d.get_text(), "abcXYh");
        assert_eq!(d.selection(0), Selection::from_rows(0, 1, 0, 5));
    }

    #[test]
    fn test_line_cache_tracks_edit() {
        let mut d = doc("abc\ndef\nghi");
        let before = d.layout_stats();
        d.fulfill(&Transaction::new(Selection::from_rows(0, 3, 1, 0), ""));
        assert_eq!(lines(&d), ["abcdef", "ghi"]);
        assert!(!d.line_entry(0).is_some_and(|e| e.is_dirty()));
        assert_eq!(d.get_num_rows(), d.buffer().len_rows());
        assert!(d.layout_stats().recomputes > before.recomputes);
    }

    #[test]
    fn test_search_single_row() {
        let d = doc("foo bar\nbar foo");
        assert_eq!(d.search(Position::new(0, 0), "bar"), Selection::from_rows(0, 4, 0, 7));
        assert_eq!(d.search(Position::new(0, 5), "bar"), Selection::from_rows(1, 0, 1, 3));
        assert!(d.search(Position::new(1, 5), "bar").is_singular());
    }

    #[test]
    fn test_find_next_occurrence_crosses_rows() {
        let d = doc("ab\ncd ab\ncd");
        let found = d.find_next_occurrence(Position::new(0, 0), "b\ncd");
        assert_eq!(found, Some(Selection::from_rows(0, 1, 1, 2)));
        assert_eq!(
            d.find_next_occurrence(Position::new(0, 0), "ab"),
            Some(Selection::from_rows(1, 3, 1, 5))
        );
        assert_eq!(d.find_next_occurrence(Position::new(1, 3), "ab"), None);
    }

    #[test]
    fn test_replace_all_clamps_selections() {
        let mut d = doc("long line\nsecond");
        d.set_selections(vec![Selection::caret(Position::new(1, 6))]);
        d.replace_all("x");
        assert_eq!(d.get_text(), "x");
        assert_eq!(d.selection(0), Selection::caret(Position::new(0, 1)));
    }
}
