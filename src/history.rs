//! Undo/redo history
//!
//! Each recorded edit keeps the transaction that applies it and the one that
//! reverts it. Undoing fulfills the revert and stores what comes back as the
//! new apply, so the pair can flip back and forth indefinitely.
//!
//! Edits are grouped by inactivity: an edit arriving within the coalescing
//! window of the previous one joins its group, anything later starts a new
//! group.

use bevy::log::debug;
use std::time::{Duration, Instant};
use crate::document::TextDocument;
use crate::settings::HistorySettings;
use crate::transaction::{Transaction, TransactionDirection};
use crate::types::Selection;

/// One fulfilled transaction and its inverse
#[derive(Clone, Debug)]
pub struct UndoableEdit {
    /// Applies the edit
    pub forward: Transaction,
    /// Reverts the edit
    pub reciprocal: Transaction,
    /// Selection that drove the edit; repositioned on undo and redo
    pub selection_index: usize,
}

impl UndoableEdit {
    /// Fulfill `forward` and capture its reciprocal
    pub fn perform(document: &mut TextDocument, forward: Transaction, selection_index: usize) -> Self {
        let reciprocal = document.fulfill(&forward);
        restore_selection(document, selection_index, &reciprocal);
        Self { forward, reciprocal, selection_index }
    }

    pub fn undo(&mut self, document: &mut TextDocument) {
        self.forward = document.fulfill(&self.reciprocal);
        restore_selection(document, self.selection_index, &self.forward);
    }

    pub fn redo(&mut self, document: &mut TextDocument) {
        self.reciprocal = document.fulfill(&self.forward);
        restore_selection(document, self.selection_index, &self.reciprocal);
    }
}

/// Put the driving selection where the user expects it after a fulfill
///
/// After an edit (reciprocal points back) the caret sits at the end of the
/// inserted text; after an undo the restored text is selected.
fn restore_selection(document: &mut TextDocument, index: usize, returned: &Transaction) {
    let index = index.min(document.num_selections().saturating_sub(1));
    let selection = match returned.direction {
        TransactionDirection::Reverse => Selection::caret(returned.selection.oriented().tail),
        TransactionDirection::Forward => returned.selection,
    };
    document.set_selection(index, selection);
}

/// Edits undone and redone together
#[derive(Clone, Debug)]
pub struct UndoGroup {
    /// In order of execution
    pub edits: Vec<UndoableEdit>,
    /// When the latest edit joined the group
    pub timestamp: Instant,
}

impl UndoGroup {
    fn new(timestamp: Instant) -> Self {
        Self { edits: Vec::new(), timestamp }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// History manager for undo/redo operations
#[derive(Clone, Debug)]
pub struct EditHistory {
    undo_stack: Vec<UndoGroup>,
    redo_stack: Vec<UndoGroup>,
    /// Group still accepting edits
    current: Option<UndoGroup>,
    coalesce_window: Duration,
    max_groups: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(&HistorySettings::default())
    }
}

impl EditHistory {
    pub fn new(settings: &HistorySettings) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current: None,
            coalesce_window: Duration::from_millis(settings.coalesce_window_ms),
            max_groups: settings.max_groups.max(1),
        }
    }

    pub fn coalesce_window(&self) -> Duration {
        self.coalesce_window
    }

    /// Fulfill `transaction` now and record it
    pub fn perform(&mut self, document: &mut TextDocument, transaction: Transaction, selection_index: usize) -> bool {
        self.perform_at(document, transaction, selection_index, Instant::now())
    }

    /// Fulfill `transaction` and record it as happening at `now`
    ///
    /// Transactions that end up changing nothing are not recorded and return false.
    pub fn perform_at(
        &mut self,
        document: &mut TextDocument,
        transaction: Transaction,
        selection_index: usize,
        now: Instant,
    ) -> bool {
        if transaction.is_noop() {
            return false;
        }

        let edit = UndoableEdit::perform(document, transaction, selection_index);
        // backspace at the start or delete at the end
        if edit.reciprocal.is_noop() {
            return false;
        }

        let starts_group = match &self.current {
            Some(group) => now.saturating_duration_since(group.timestamp) > self.coalesce_window,
            None => true,
        };
        if starts_group {
            self.finalize_group();
            self.current = Some(UndoGroup::new(now));
        }

        if let Some(group) = &mut self.current {
            group.edits.push(edit);
            group.timestamp = now;
        }
        self.redo_stack.clear();
        true
    }

    /// Close the group being built so the next edit starts a new one
    pub fn finalize_group(&mut self) {
        if let Some(group) = self.current.take() {
            if !group.is_empty() {
                self.push_undo(group);
            }
        }
    }

    fn push_undo(&mut self, group: UndoGroup) {
        self.undo_stack.push(group);
        if self.undo_stack.len() > self.max_groups {
            let excess = self.undo_stack.len() - self.max_groups;
            self.undo_stack.drain(..excess);
            debug!("history full, dropped {} oldest group(s)", excess);
        }
    }

    /// Revert the latest group; false when there is nothing to undo
    pub fn undo(&mut self, document: &mut TextDocument) -> bool {
        self.finalize_group();
        let Some(mut group) = self.undo_stack.pop() else {
            return false;
        };
        for edit in group.edits.iter_mut().rev() {
            edit.undo(document);
        }
        self.redo_stack.push(group);
        true
    }

    /// Re-apply the latest undone group; false when there is nothing to redo
    pub fn redo(&mut self, document: &mut TextDocument) -> bool {
        self.finalize_group();
        let Some(mut group) = self.redo_stack.pop() else {
            return false;
        };
        for edit in group.edits.iter_mut() {
            edit.redo(document);
        }
        self.push_undo(group);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || self.current.as_ref().is_some_and(|g| !g.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of groups an undo could revert
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len() + usize::from(self.current.as_ref().is_some_and(|g| !g.is_empty()))
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DocumentSettings;
    use crate::types::Position;

    fn doc(text: &str) -> TextDocument {
        TextDocument::new(text, DocumentSettings::default())
    }

    fn caret(row: usize, column: usize) -> Selection {
        Selection::caret(Position::new(row, column))
    }

    #[test]
    fn test_undo_restores_text_and_caret() {
        let mut d = doc("abc\ndef");
        d.set_selections(vec![caret(0, 3)]);
        let mut history = EditHistory::default();

        assert!(history.perform(&mut d, Transaction::new(caret(0, 3), "\n"), 0));
        assert_eq!(d.get_text(), "abc\n\ndef");
        assert_eq!(d.selection(0), caret(1, 0));

        assert!(history.undo(&mut d));
        assert_eq!(d.get_text(), "abc\ndef");
        assert_eq!(d.selection(0), caret(0, 3));
        assert!(!history.can_undo());

        assert!(history.redo(&mut d));
        assert_eq!(d.get_text(), "abc\n\ndef");
        assert_eq!(d.selection(0), caret(1, 0));
    }

    #[test]
    fn test_undo_selects_restored_text() {
        let mut d = doc("hello world");
        let mut history = EditHistory::default();
        history.perform(&mut d, Transaction::new(Selection::from_rows(0, 6, 0, 11), ""), 0);
        assert_eq!(d.get_text(), "hello ");
        history.undo(&mut d);
        assert_eq!(d.get_text(), "hello world");
        assert_eq!(d.selection(0), Selection::from_rows(0, 6, 0, 11));
    }

    #[test]
    fn test_burst_coalesces_into_one_group() {
        let mut d = doc("");
        let mut history = EditHistory::default();
        let t0 = Instant::now();

        for (i, ch) in "abc".chars().enumerate() {
            let at = t0 + Duration::from_millis(100 * i as u64);
            history.perform_at(&mut d, Transaction::new(caret(0, i), ch.to_string()), 0, at);
        }
        assert_eq!(history.undo_depth(), 1);

        history.undo(&mut d);
        assert_eq!(d.get_text(), "");
    }

    #[test]
    fn test_pause_starts_new_group() {
        let mut d = doc("");
        let mut history = EditHistory::default();
        let t0 = Instant::now();

        history.perform_at(&mut d, Transaction::new(caret(0, 0), "a"), 0, t0);
        history.perform_at(&mut d, Transaction::new(caret(0, 1), "b"), 0, t0 + Duration::from_millis(500));
        assert_eq!(history.undo_depth(), 2);

        history.undo(&mut d);
        assert_eq!(d.get_text(), "a");
        history.undo(&mut d);
        assert_eq!(d.get_text(), "");
        assert!(!history.undo(&mut d));
    }

    #[test]
    fn test_edit_at_document_edges_is_not_recorded() {
        let mut d = doc("ab");
        let mut history = EditHistory::default();
        assert!(!history.perform(&mut d, Transaction::backspace(caret(0, 0)), 0));
        assert!(!history.perform(&mut d, Transaction::delete(caret(0, 2)), 0));
        assert_eq!(d.get_text(), "ab");
        assert!(!history.can_undo());
        assert_eq!(history.undo_depth(), 0);

        history.perform(&mut d, Transaction::backspace(caret(0, 2)), 0);
        assert_eq!(d.get_text(), "a");
        assert!(history.can_undo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut d = doc("x");
        let mut history = EditHistory::default();
        history.perform(&mut d, Transaction::new(caret(0, 1), "y"), 0);
        history.undo(&mut d);
        assert!(history.can_redo());
        history.perform(&mut d, Transaction::new(caret(0, 1), "z"), 0);
        assert!(!history.can_redo());
        assert_eq!(d.get_text(), "xz");
    }

    #[test]
    fn test_noop_is_not_recorded() {
        let mut d = doc("x");
        let mut history = EditHistory::default();
        assert!(!history.perform(&mut d, Transaction::new(caret(0, 0), ""), 0));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut d = doc("");
        let settings = HistorySettings { coalesce_window_ms: 0, max_groups: 3 };
        let mut history = EditHistory::new(&settings);
        let t0 = Instant::now();
        for i in 0..6 {
            let at = t0 + Duration::from_millis(10 * i as u64);
            history.perform_at(&mut d, Transaction::new(caret(0, i), "a"), 0, at);
        }
        history.finalize_group();
        assert_eq!(history.undo_depth(), 3);
    }

    #[test]
    fn test_repeated_undo_redo_is_stable() {
        let mut d = doc("fn f() {}");
        let mut history = EditHistory::default();
        history.perform(&mut d, Transaction::new(Selection::from_rows(0, 3, 0, 4), "main"), 0);
        for _ in 0..3 {
            history.undo(&mut d);
            assert_eq!(d.get_text(), "fn f() {}");
            history.redo(&mut d);
            assert_eq!(d.get_text(), "fn main() {}");
        }
    }
}
