//! Editor: a document, its undo history and the command set
//!
//! Every text change goes through [`Editor::insert`], which turns the content
//! into one transaction per selection and records them in the same undo
//! group. Navigation goes straight to the document.

use bevy::log::debug;
use std::time::Instant;
use crate::document::{Direction, Target, TextDocument};
use crate::history::EditHistory;
use crate::input::EditorCommand;
use crate::transaction::{Transaction, BACKSPACE, DELETE};
use crate::types::{Position, Selection, SelectionPart};

/// Closing character for an opening one
fn closing_pair(c: char) -> Option<char> {
    match c {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '"' => Some('"'),
        _ => None,
    }
}

fn is_closing(c: char) -> bool {
    matches!(c, ')' | ']' | '}' | '"')
}

fn is_matching_pair(left: char, right: char) -> bool {
    closing_pair(left) == Some(right)
}

fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Document plus history, driven by [`EditorCommand`]s
#[derive(Debug)]
pub struct Editor {
    document: TextDocument,
    history: EditHistory,
    /// In-editor clipboard
    register: String,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(TextDocument::default())
    }
}

impl Editor {
    pub fn new(document: TextDocument) -> Self {
        let history = EditHistory::new(&document.settings().history);
        Self {
            document,
            history,
            register: String::new(),
        }
    }

    pub fn document(&self) -> &TextDocument {
        &self.document
    }

    /// Direct access for selection, folding and token changes
    ///
    /// Text edited through here bypasses the undo history.
    pub fn document_mut(&mut self) -> &mut TextDocument {
        &mut self.document
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Text held by copy and cut
    pub fn clipboard(&self) -> &str {
        &self.register
    }

    pub fn set_clipboard(&mut self, text: impl Into<String>) {
        self.register = text.into();
    }

    fn last_selection(&self) -> Selection {
        self.document.selection(self.document.num_selections().saturating_sub(1))
    }

    // ========== Editing ==========

    /// Replace every selection with `content` as one undoable step
    pub fn insert(&mut self, content: &str) -> bool {
        self.insert_at(content, Instant::now())
    }

    /// [`insert`](Self::insert) with an explicit timestamp for grouping
    pub fn insert_at(&mut self, content: &str, now: Instant) -> bool {
        let mut changed = false;
        for n in 0..self.document.num_selections() {
            let transaction = Transaction::new(self.document.selection(n), content);
            changed |= self.history.perform_at(&mut self.document, transaction, n, now);
        }
        self.document.dedup_selections();
        changed
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.document)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.document)
    }

    /// Typed text, with bracket and quote pairing
    ///
    /// Each caret decides on its own: step over a matching closing
    /// character, insert an opener with its pair, or insert the character.
    pub fn type_character(&mut self, c: char) -> bool {
        self.type_character_at(c, Instant::now())
    }

    /// [`type_character`](Self::type_character) with an explicit timestamp for grouping
    pub fn type_character_at(&mut self, c: char, now: Instant) -> bool {
        let close = closing_pair(c);
        if close.is_none() && !is_closing(c) && c != '\t' && c.is_control() {
            return false;
        }

        let mut changed = false;
        for n in 0..self.document.num_selections() {
            let selection = self.document.selection(n);

            if is_closing(c) && self.document.get_character(selection.head) == c {
                let mut head = selection.head;
                self.document.next(&mut head);
                self.document.set_selection(n, Selection::caret(head));
                changed = true;
                continue;
            }

            let content = match close {
                Some(close) => format!("{c}{close}"),
                None => c.to_string(),
            };
            if !self.history.perform_at(&mut self.document, Transaction::new(selection, content), n, now) {
                continue;
            }
            changed = true;

            if close.is_some() {
                let mut head = self.document.selection(n).head;
                self.document.prev(&mut head);
                self.document.set_selection(n, Selection::caret(head));
            }
        }
        self.document.dedup_selections();
        changed
    }

    /// Text of the first selection
    pub fn copy_selection(&self) -> String {
        self.document.get_selection_content(self.document.selection(0))
    }

    // ========== Commands ==========

    /// Run `command`; false when it had nothing to act on
    pub fn execute(&mut self, command: EditorCommand) -> bool {
        use Direction::*;
        use EditorCommand as C;

        debug!("execute {:?}", command);
        match command {
            C::MoveLeft | C::SelectLeft => self.nav(Target::Character, BackwardCol, command == C::SelectLeft),
            C::MoveRight | C::SelectRight => self.nav(Target::Character, ForwardCol, command == C::SelectRight),
            C::MoveUp | C::SelectUp => self.nav(Target::Character, BackwardRow, command == C::SelectUp),
            C::MoveDown | C::SelectDown => self.nav(Target::Character, ForwardRow, command == C::SelectDown),
            C::MoveWordLeft | C::SelectWordLeft => {
                let extend = command == C::SelectWordLeft;
                self.nav(Target::Word, BackwardCol, extend) && self.nav(Target::Whitespace, BackwardCol, extend)
            }
            C::MoveWordRight | C::SelectWordRight => {
                let extend = command == C::SelectWordRight;
                self.nav(Target::Whitespace, ForwardCol, extend) && self.nav(Target::Word, ForwardCol, extend)
            }
            C::MoveParagraphUp | C::SelectParagraphUp => {
                let extend = command == C::SelectParagraphUp;
                self.nav(Target::Word, BackwardCol, extend) && self.nav(Target::Paragraph, BackwardRow, extend)
            }
            C::MoveParagraphDown | C::SelectParagraphDown => {
                let extend = command == C::SelectParagraphDown;
                self.nav(Target::Word, ForwardCol, extend) && self.nav(Target::Paragraph, ForwardRow, extend)
            }
            C::MoveLineStart | C::SelectLineStart => {
                self.nav(Target::FirstNonWhitespace, BackwardCol, command == C::SelectLineStart)
            }
            C::MoveLineEnd | C::SelectLineEnd => self.nav(Target::Line, ForwardCol, command == C::SelectLineEnd),
            C::MoveDocumentStart | C::SelectDocumentStart => {
                self.nav(Target::Document, BackwardRow, command == C::SelectDocumentStart)
            }
            C::MoveDocumentEnd | C::SelectDocumentEnd => {
                self.nav(Target::Document, ForwardRow, command == C::SelectDocumentEnd)
            }

            C::SelectAll => self.expand(Target::Document),
            C::ExpandToToken => self.expand(Target::Token),
            C::ExpandToLine => self.expand(Target::Line),

            C::AddCaretAbove => self.add_caret(BackwardRow),
            C::AddCaretBelow => self.add_caret(ForwardRow),
            C::AddNextOccurrence => self.add_next_occurrence(),
            C::AddNextMatch => self.add_next_match(),
            C::Escape => self.escape(),

            C::DeleteBackward => self.remove(BACKSPACE),
            C::DeleteForward => self.remove(DELETE),
            C::DeleteWordBackward => {
                self.document
                    .navigate_selections(Target::Word, BackwardCol, SelectionPart::Head);
                self.document
                    .navigate_selections(Target::Whitespace, BackwardCol, SelectionPart::Head);
                self.insert("")
            }

            C::InsertNewline => self.insert_newline(false),
            C::InsertStatementEnd => self.insert_newline(true),
            C::Indent => self.indent(false),
            C::Outdent => self.indent(true),

            C::Copy => {
                self.register = self.copy_selection();
                true
            }
            C::Cut => self.cut(),
            C::Paste => {
                if self.register.is_empty() {
                    return false;
                }
                let text = self.register.clone();
                self.insert(&text)
            }

            C::Undo => self.undo(),
            C::Redo => self.redo(),
        }
    }

    fn nav(&mut self, target: Target, direction: Direction, extend: bool) -> bool {
        let part = if extend { SelectionPart::Head } else { SelectionPart::Both };
        self.document.navigate_selections(target, direction, part);
        true
    }

    /// Grow every selection across `target` on both sides
    fn expand(&mut self, target: Target) -> bool {
        self.document
            .navigate_selections(target, Direction::BackwardCol, SelectionPart::Tail);
        self.document
            .navigate_selections(target, Direction::ForwardCol, SelectionPart::Head);
        true
    }

    fn add_caret(&mut self, direction: Direction) -> bool {
        let mut head = self.last_selection().head;
        self.document.navigate(&mut head, Target::Character, direction);
        self.document.add_selection(Selection::caret(head))
    }

    /// Select the word under a caret, or add the next occurrence of the
    /// selected text
    fn add_next_occurrence(&mut self) -> bool {
        let last_index = self.document.num_selections().saturating_sub(1);
        let last = self.last_selection();

        if last.is_singular() {
            let mut word = last;
            self.document.navigate(&mut word.tail, Target::Subword, Direction::BackwardCol);
            self.document.navigate(&mut word.head, Target::Subword, Direction::ForwardCol);
            if word.is_singular() {
                return false;
            }
            self.document.set_selection(last_index, word);
            return true;
        }

        let s = last.oriented();
        let text = self.document.get_selection_content(s);
        let Some(found) = self.document.find_next_occurrence(s.head, &text) else {
            return false;
        };

        let covered = self.document.selections().iter().any(|existing| {
            let e = existing.oriented();
            e.head <= found.head && found.tail <= e.tail
        });
        if covered {
            return false;
        }
        self.document.add_selection(found.swapped())
    }

    /// Add the next single-row match of the last selection
    fn add_next_match(&mut self) -> bool {
        let s = self.last_selection().oriented();
        if !s.is_single_line() {
            return false;
        }
        let found = self.document.search(s.tail, &self.document.get_selection_content(s));
        if found.is_singular() {
            return false;
        }
        self.document.add_selection(found)
    }

    fn escape(&mut self) -> bool {
        let selections = self.document.selections();
        if selections.iter().any(|s| !s.is_singular()) {
            let collapsed = selections.iter().map(|s| Selection::caret(s.head)).collect();
            self.document.set_selections(collapsed);
        } else {
            let last = self.last_selection();
            self.document.set_selections(vec![last]);
        }
        true
    }

    /// Delete with `sentinel`, taking an empty bracket pair at once
    fn remove(&mut self, sentinel: char) -> bool {
        let last = self.last_selection();
        if last.is_singular() && last.head.column > 0 {
            let left = self.document.get_character(last.head.translated(0, -1));
            let right = self.document.get_character(last.head);
            if is_matching_pair(left, right) {
                self.document
                    .navigate_selections(Target::Character, Direction::BackwardCol, SelectionPart::Tail);
                self.document
                    .navigate_selections(Target::Character, Direction::ForwardCol, SelectionPart::Head);
                return self.insert("");
            }
        }
        self.insert(sentinel.encode_utf8(&mut [0; 4]))
    }

    /// Line break carrying the indentation of the current line
    ///
    /// After an opening brace the caret lands on an extra, indented row and
    /// the text after it moves to its own row.
    fn insert_newline(&mut self, statement_end: bool) -> bool {
        if statement_end {
            self.document
                .navigate_selections(Target::Line, Direction::ForwardCol, SelectionPart::Both);
        }

        let head = self.last_selection().head;
        let line = self.document.get_line(head.row);
        let indent = leading_whitespace(line).to_string();
        let before_caret = head.column > 0 && self.document.get_character(head.translated(0, -1)) == '{';

        if before_caret && !statement_end {
            let now = Instant::now();
            self.insert_at(&format!("\n{indent}\t"), now);
            self.insert_at(&format!("\n{indent}"), now);
            self.document
                .navigate_selections(Target::Line, Direction::BackwardCol, SelectionPart::Both);
            self.document
                .navigate_selections(Target::Character, Direction::BackwardCol, SelectionPart::Both);
            return true;
        }

        let terminator = if statement_end { ";" } else { "" };
        self.insert(&format!("{terminator}\n{indent}"))
    }

    /// Tab at carets; whole-row indent or outdent for multi-row selections
    fn indent(&mut self, outdent: bool) -> bool {
        let first = self.document.selection(0);
        if !outdent && first.is_single_line() {
            return self.insert("\t");
        }

        let s = first.oriented();
        let rows: Vec<usize> = (s.head.row..=s.tail.row)
            .filter(|row| !outdent || !leading_whitespace(self.document.get_line(*row)).is_empty())
            .collect();
        if rows.is_empty() {
            return false;
        }

        let now = Instant::now();
        if outdent {
            self.document
                .set_selections(rows.iter().map(|r| Selection::from_rows(*r, 0, *r, 1)).collect());
            self.insert_at("", now);
        } else {
            self.document
                .set_selections(rows.iter().map(|r| Selection::caret(Position::new(*r, 0))).collect());
            self.insert_at("\t", now);
        }

        let shift = |p: Position| {
            if !rows.contains(&p.row) {
                p
            } else if outdent {
                Position::new(p.row, p.column.saturating_sub(1))
            } else {
                Position::new(p.row, p.column + 1)
            }
        };
        self.document
            .set_selections(vec![Selection::new(shift(first.head), shift(first.tail))]);
        true
    }

    /// Cut the first selection, or its whole line when it is a caret
    fn cut(&mut self) -> bool {
        let mut s = self.document.selection(0);
        let whole_line = s.is_singular();

        if whole_line {
            self.document.navigate(&mut s.head, Target::Line, Direction::BackwardCol);
            self.document.navigate(&mut s.head, Target::Character, Direction::BackwardCol);
            self.document.navigate(&mut s.tail, Target::Line, Direction::ForwardCol);
            self.document.set_selection(0, s);
        }

        self.register = self.document.get_selection_content(s);
        let changed = self.insert("");

        if whole_line {
            self.nav(Target::Character, Direction::ForwardRow, false);
            self.nav(Target::FirstNonWhitespace, Direction::BackwardCol, false);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FoldRegion;
    use crate::settings::DocumentSettings;
    use std::time::Duration;

    fn editor(text: &str) -> Editor {
        Editor::new(TextDocument::new(text, DocumentSettings::default()))
    }

    fn carets(editor: &mut Editor, positions: &[(usize, usize)]) {
        editor.document_mut().set_selections(
            positions
                .iter()
                .map(|(r, c)| Selection::caret(Position::new(*r, *c)))
                .collect(),
        );
    }

    #[test]
    fn test_insert_at_every_caret_undoes_once() {
        let mut ed = editor("ab\ncd");
        carets(&mut ed, &[(0, 1), (1, 1)]);
        assert!(ed.insert("X"));
        assert_eq!(ed.document().get_text(), "aXb\ncXd");
        assert_eq!(
            ed.document().selections(),
            &[Selection::caret(Position::new(0, 2)), Selection::caret(Position::new(1, 2))]
        );

        assert!(ed.execute(EditorCommand::Undo));
        assert_eq!(ed.document().get_text(), "ab\ncd");
        assert!(ed.execute(EditorCommand::Redo));
        assert_eq!(ed.document().get_text(), "aXb\ncXd");
    }

    #[test]
    fn test_carets_merge_after_backspace() {
        let mut ed = editor("abc");
        carets(&mut ed, &[(0, 1), (0, 2)]);
        ed.execute(EditorCommand::DeleteBackward);
        assert_eq!(ed.document().get_text(), "c");
        assert_eq!(ed.document().num_selections(), 1);
    }

    #[test]
    fn test_delete_next_to_fold_removes_one_character() {
        let mut ed = editor("a\nb\nc\nd");
        ed.document_mut().fold_rows(FoldRegion::new(0, 2));
        carets(&mut ed, &[(0, 1)]);
        assert!(ed.execute(EditorCommand::DeleteForward));
        assert_eq!(ed.document().get_text(), "ab\nc\nd");

        assert!(ed.undo());
        carets(&mut ed, &[(3, 0)]);
        assert!(ed.execute(EditorCommand::DeleteBackward));
        assert_eq!(ed.document().get_text(), "a\nb\ncd");
    }

    #[test]
    fn test_grouping_follows_coalesce_window() {
        let mut ed = editor("");
        let t0 = Instant::now();
        ed.insert_at("a", t0);
        ed.insert_at("b", t0 + Duration::from_millis(100));
        ed.insert_at("c", t0 + Duration::from_secs(2));

        assert!(ed.undo());
        assert_eq!(ed.document().get_text(), "ab");
        assert!(ed.undo());
        assert_eq!(ed.document().get_text(), "");
        assert!(!ed.undo());
        assert!(ed.redo());
        assert_eq!(ed.document().get_text(), "ab");
    }

    #[test]
    fn test_bracket_pairing() {
        let mut ed = editor("");
        ed.type_character('f');
        ed.type_character('(');
        assert_eq!(ed.document().get_text(), "f()");
        assert_eq!(ed.document().selection(0), Selection::caret(Position::new(0, 2)));

        // closing over an existing ')' just steps past it
        ed.type_character(')');
        assert_eq!(ed.document().get_text(), "f()");
        assert_eq!(ed.document().selection(0), Selection::caret(Position::new(0, 3)));

        ed.execute(EditorCommand::MoveLeft);
        ed.execute(EditorCommand::DeleteBackward);
        assert_eq!(ed.document().get_text(), "f");
    }

    #[test]
    fn test_closing_character_decided_per_caret() {
        let mut ed = editor("a)\nb");
        carets(&mut ed, &[(0, 1), (1, 1)]);
        assert!(ed.type_character(')'));
        assert_eq!(ed.document().get_text(), "a)\nb)");
        assert_eq!(
            ed.document().selections(),
            &[Selection::caret(Position::new(0, 2)), Selection::caret(Position::new(1, 2))]
        );

        // only the inserted ')' is undone
        assert!(ed.undo());
        assert_eq!(ed.document().get_text(), "a)\nb");
    }

    #[test]
    fn test_control_characters_are_not_typed() {
        let mut ed = editor("ab");
        carets(&mut ed, &[(0, 1)]);
        assert!(!ed.type_character('\u{7f}'));
        assert!(!ed.type_character('\u{1b}'));
        assert_eq!(ed.document().get_text(), "ab");
    }

    #[test]
    fn test_newline_carries_indentation() {
        let mut ed = editor("    let x");
        carets(&mut ed, &[(0, 9)]);
        ed.execute(EditorCommand::InsertNewline);
        assert_eq!(ed.document().get_text(), "    let x\n    ");
        assert_eq!(ed.document().selection(0), Selection::caret(Position::new(1, 4)));
    }

    #[test]
    fn test_newline_after_brace_opens_block() {
        let mut ed = editor("  {}");
        carets(&mut ed, &[(0, 3)]);
        ed.execute(EditorCommand::InsertNewline);
        assert_eq!(ed.document().get_text(), "  {\n  \t\n  }");
        assert_eq!(ed.document().selection(0), Selection::caret(Position::new(1, 3)));

        // both inserts form one undo step
        ed.undo();
        assert_eq!(ed.document().get_text(), "  {}");
    }

    #[test]
    fn test_statement_end() {
        let mut ed = editor("  call()");
        carets(&mut ed, &[(0, 3)]);
        ed.execute(EditorCommand::InsertStatementEnd);
        assert_eq!(ed.document().get_text(), "  call();\n  ");
    }

    #[test]
    fn test_word_moves() {
        let mut ed = editor("foo bar");
        carets(&mut ed, &[(0, 7)]);
        ed.execute(EditorCommand::MoveWordLeft);
        assert_eq!(ed.document().selection(0).head, Position::new(0, 4));
        ed.execute(EditorCommand::MoveWordLeft);
        assert_eq!(ed.document().selection(0).head, Position::new(0, 0));

        ed.execute(EditorCommand::SelectWordRight);
        assert_eq!(ed.document().selection(0), Selection::from_rows(0, 4, 0, 0));
    }

    #[test]
    fn test_delete_word_backward() {
        let mut ed = editor("foo bar");
        carets(&mut ed, &[(0, 7)]);
        ed.execute(EditorCommand::DeleteWordBackward);
        assert_eq!(ed.document().get_text(), "foo ");
    }

    #[test]
    fn test_select_all_and_expand_line() {
        let mut ed = editor("ab\ncd");
        carets(&mut ed, &[(1, 1)]);
        ed.execute(EditorCommand::ExpandToLine);
        assert_eq!(ed.document().selection(0), Selection::from_rows(1, 2, 1, 0));

        ed.execute(EditorCommand::SelectAll);
        assert_eq!(ed.copy_selection(), "ab\ncd");
    }

    #[test]
    fn test_escape_collapses_then_drops_secondaries() {
        let mut ed = editor("abc\ndef");
        ed.document_mut().set_selections(vec![
            Selection::from_rows(0, 2, 0, 0),
            Selection::caret(Position::new(1, 1)),
        ]);
        ed.execute(EditorCommand::Escape);
        assert_eq!(ed.document().num_selections(), 2);
        assert!(ed.document().selections().iter().all(Selection::is_singular));

        ed.execute(EditorCommand::Escape);
        assert_eq!(ed.document().selections(), &[Selection::caret(Position::new(1, 1))]);
    }

    #[test]
    fn test_add_caret_below() {
        let mut ed = editor("abc\ndef");
        carets(&mut ed, &[(0, 1)]);
        assert!(ed.execute(EditorCommand::AddCaretBelow));
        assert_eq!(
            ed.document().selections(),
            &[Selection::caret(Position::new(0, 1)), Selection::caret(Position::new(1, 1))]
        );
    }

    #[test]
    fn test_add_next_occurrence() {
        let mut ed = editor("foo bar foo");
        carets(&mut ed, &[(0, 1)]);

        assert!(ed.execute(EditorCommand::AddNextOccurrence));
        assert_eq!(ed.document().selection(0), Selection::from_rows(0, 3, 0, 0));

        assert!(ed.execute(EditorCommand::AddNextOccurrence));
        assert_eq!(ed.document().selection(1), Selection::from_rows(0, 11, 0, 8));

        ed.insert("baz");
        assert_eq!(ed.document().get_text(), "baz bar baz");
    }

    #[test]
    fn test_add_next_match_needs_single_row() {
        let mut ed = editor("ab ab\nab");
        ed.document_mut().set_selections(vec![Selection::from_rows(0, 0, 0, 2)]);
        assert!(ed.execute(EditorCommand::AddNextMatch));
        assert_eq!(ed.document().selection(1), Selection::from_rows(0, 3, 0, 5));

        ed.document_mut().set_selections(vec![Selection::from_rows(0, 0, 1, 1)]);
        assert!(!ed.execute(EditorCommand::AddNextMatch));
    }

    #[test]
    fn test_indent_and_outdent_rows() {
        let mut ed = editor("a\nb\nc");
        ed.document_mut().set_selections(vec![Selection::from_rows(0, 1, 1, 1)]);

        ed.execute(EditorCommand::Indent);
        assert_eq!(ed.document().get_text(), "\ta\n\tb\nc");
        assert_eq!(ed.document().selections(), &[Selection::from_rows(0, 2, 1, 2)]);

        ed.execute(EditorCommand::Outdent);
        assert_eq!(ed.document().get_text(), "a\nb\nc");
        assert_eq!(ed.document().selections(), &[Selection::from_rows(0, 1, 1, 1)]);
    }

    #[test]
    fn test_cut_line_and_paste() {
        let mut ed = editor("one\ntwo\nthree");
        carets(&mut ed, &[(1, 1)]);
        assert!(ed.execute(EditorCommand::Cut));
        assert_eq!(ed.document().get_text(), "one\nthree");
        assert_eq!(ed.clipboard(), "\ntwo");

        carets(&mut ed, &[(1, 5)]);
        assert!(ed.execute(EditorCommand::Paste));
        assert_eq!(ed.document().get_text(), "one\nthree\ntwo");
    }

    #[test]
    fn test_copy_leaves_text() {
        let mut ed = editor("hello");
        ed.document_mut().set_selections(vec![Selection::from_rows(0, 1, 0, 4)]);
        ed.execute(EditorCommand::Copy);
        assert_eq!(ed.clipboard(), "ell");
        assert_eq!(ed.document().get_text(), "hello");
        assert!(!ed.history().can_undo());
    }
}
