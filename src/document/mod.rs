//! Text document: buffer, line layout cache and selections kept in step
//!
//! [`TextDocument`] is the only authority for coordinate transforms,
//! navigation, token application and transaction fulfillment. It has no
//! rendering of its own; consumers pull geometry and subscribe to
//! [`DocumentEvent`]s.
//!
//! Every buffer mutation funnels through [`TextDocument::apply_buffer_change`],
//! which splices the line cache, re-lays out the touched rows, shifts folds,
//! rebuilds the row offset table from the first touched row and then notifies
//! listeners. Listeners therefore always observe a consistent document.

mod navigation;
mod edit;
mod geometry;
mod tokens;
mod folding;

pub use navigation::{Direction, Target};
pub use geometry::{Metric, PositionedGlyph, RowData};
pub use folding::FoldRegion;

use bevy::log::{debug, warn};
use bevy::math::Rect;
use ropey::Rope;
use std::cell::Cell;
use crate::buffer::{BufferChange, TextBuffer};
use crate::events::{BufferChangedEvent, DocumentEvent, Listener, ListenerHandle, ListenerRegistry};
use crate::layout::{GlyphLineCache, LayoutStats, LineEntry};
use crate::settings::{DocumentSettings, FontSettings};
use crate::types::{LineLengths, Position, Selection};

/// Buffer, layout cache and selection set of one editor
#[derive(Debug)]
pub struct TextDocument {
    buffer: TextBuffer,
    lines: GlyphLineCache,
    selections: Vec<Selection>,
    selections_version: u64,
    settings: DocumentSettings,
    /// Top of each row, plus the total height as the last element
    row_offsets: Vec<f32>,
    folds: Vec<FoldRegion>,
    hidden: Vec<bool>,
    cached_bounds: Cell<Option<Rect>>,
    listeners: ListenerRegistry,
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new("", DocumentSettings::default())
    }
}

impl TextDocument {
    pub fn new(text: &str, settings: DocumentSettings) -> Self {
        let buffer = TextBuffer::new(text);
        let params = settings.wrapping.layout_params();
        let lines = GlyphLineCache::from_lines(
            (0..buffer.len_rows()).map(|row| buffer.line(row)),
            params,
        );

        let mut document = Self {
            buffer,
            lines,
            selections: vec![Selection::default()],
            selections_version: 0,
            settings,
            row_offsets: Vec::new(),
            folds: Vec::new(),
            hidden: Vec::new(),
            cached_bounds: Cell::new(None),
            listeners: ListenerRegistry::new(),
        };
        document.relayout_all();
        document
    }

    pub fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    pub fn font(&self) -> &FontSettings {
        &self.settings.font
    }

    // ========== Content ==========

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Cheap copy of the current text for background readers
    pub fn snapshot(&self) -> Rope {
        self.buffer.snapshot()
    }

    /// Whole text as a string
    pub fn get_text(&self) -> String {
        self.buffer.to_string()
    }

    /// Buffer version, bumped on every edit
    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    pub fn get_num_rows(&self) -> usize {
        self.lines.len()
    }

    pub fn get_num_columns(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, LineEntry::len)
    }

    /// Text of `row` without its line break
    pub fn get_line(&self, row: usize) -> &str {
        self.lines.get(row).map_or("", LineEntry::text)
    }

    /// Layout entry of `row`
    pub fn line_entry(&self, row: usize) -> Option<&LineEntry> {
        self.lines.get(row)
    }

    pub fn layout_stats(&self) -> LayoutStats {
        self.lines.stats()
    }

    /// Lazily recompute the layout of `row`; returns whether work was done
    ///
    /// Edits already revalidate the rows they touch, so this only does work
    /// after an external caller dirtied entries.
    pub fn ensure_valid(&mut self, row: usize) -> bool {
        self.lines.ensure_valid(row)
    }

    /// Clamp a position into the document
    pub fn clamp(&self, index: Position) -> Position {
        let last = self.get_num_rows().saturating_sub(1);
        let row = index.row.min(last);
        Position::new(row, index.column.min(self.get_num_columns(row)))
    }

    // ========== Selections ==========

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn num_selections(&self) -> usize {
        self.selections.len()
    }

    /// Selection at `index`, falling back to the last one
    pub fn selection(&self, index: usize) -> Selection {
        self.selections
            .get(index)
            .or_else(|| self.selections.last())
            .copied()
            .unwrap_or_default()
    }

    pub fn selections_version(&self) -> u64 {
        self.selections_version
    }

    /// Replace all selections; exact duplicates are dropped
    pub fn set_selections(&mut self, selections: Vec<Selection>) {
        let mut unique: Vec<Selection> = Vec::with_capacity(selections.len());
        for selection in selections {
            let selection = self.clamp_selection(selection);
            if !unique.contains(&selection) {
                unique.push(selection);
            }
        }
        if unique.is_empty() {
            unique.push(Selection::default());
        }
        self.selections = unique;
        self.selections_changed();
    }

    /// Replace the selection at `index`
    pub fn set_selection(&mut self, index: usize, selection: Selection) {
        let selection = self.clamp_selection(selection);
        match self.selections.get_mut(index) {
            Some(slot) => *slot = selection,
            None => {
                debug!("selection index {} out of range, ignoring", index);
                return;
            }
        }
        self.selections_changed();
    }

    /// Add a selection unless an identical one exists
    pub fn add_selection(&mut self, selection: Selection) -> bool {
        let selection = self.clamp_selection(selection);
        if self.selections.contains(&selection) {
            return false;
        }
        self.selections.push(selection);
        self.selections_changed();
        true
    }

    /// Drop selections identical to an earlier one
    pub fn dedup_selections(&mut self) -> bool {
        let before = self.selections.len();
        let mut unique: Vec<Selection> = Vec::with_capacity(before);
        for selection in self.selections.drain(..) {
            if !unique.contains(&selection) {
                unique.push(selection);
            }
        }
        self.selections = unique;
        let changed = self.selections.len() != before;
        if changed {
            self.selections_changed();
        }
        changed
    }

    fn clamp_selection(&self, selection: Selection) -> Selection {
        Selection {
            head: self.clamp(selection.head),
            tail: self.clamp(selection.tail),
            style: selection.style,
        }
    }

    fn selections_changed(&mut self) {
        self.selections_version += 1;
        self.listeners.notify(&DocumentEvent::SelectionsChanged {
            version: self.selections_version,
        });
    }

    // ========== Listeners ==========

    pub fn add_listener(&mut self, listener: Listener) -> ListenerHandle {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        self.listeners.remove(handle)
    }

    // ========== Layout parameters ==========

    pub fn set_font(&mut self, font: FontSettings) {
        self.settings.font = font;
        self.invalidate_bounds();
        self.rebuild_row_offsets_from(0);
    }

    pub fn set_wrap_column(&mut self, column: Option<usize>) {
        self.settings.wrapping.wrap_column = column;
        self.apply_layout_params();
    }

    pub fn set_tab_size(&mut self, tab_size: usize) {
        self.settings.wrapping.tab_size = tab_size;
        self.apply_layout_params();
    }

    fn apply_layout_params(&mut self) {
        if self.lines.set_params(self.settings.wrapping.layout_params()) {
            self.relayout_all();
        }
    }

    fn relayout_all(&mut self) {
        self.lines.ensure_range_valid(0..self.lines.len());
        self.rebuild_hidden();
        self.invalidate_bounds();
        self.rebuild_row_offsets_from(0);
    }

    // ========== Buffer synchronization ==========

    /// Bring the line cache, folds and row offsets in line with `change`
    /// and tell listeners about it
    fn apply_buffer_change(&mut self, change: BufferChange) {
        let new_lines = (change.start_row..=change.new_end_row)
            .map(|row| self.buffer.line(row))
            .collect();
        self.lines.splice(change.start_row..change.old_end_row + 1, new_lines);
        self.lines.ensure_range_valid(change.start_row..change.new_end_row + 1);

        if self.lines.len() != self.buffer.len_rows() {
            warn!(
                "line cache out of step ({} entries, {} rows), rebuilding",
                self.lines.len(),
                self.buffer.len_rows()
            );
            self.lines = GlyphLineCache::from_lines(
                (0..self.buffer.len_rows()).map(|row| self.buffer.line(row)),
                self.settings.wrapping.layout_params(),
            );
            self.lines.ensure_range_valid(0..self.lines.len());
        }

        let first_row = self.shift_folds(&change);
        self.invalidate_bounds();
        self.rebuild_row_offsets_from(first_row);

        if self.settings.diagnostics.profile_layout {
            let stats = self.lines.stats();
            debug!(
                "layout after v{}: {} recomputed, {} reused",
                change.version, stats.recomputes, stats.reuses
            );
        }

        self.listeners.notify(&DocumentEvent::BufferChanged(BufferChangedEvent {
            change,
            snapshot: self.buffer.snapshot(),
        }));
    }

    /// Recompute row tops from `row` down
    fn rebuild_row_offsets_from(&mut self, row: usize) {
        let rows = self.lines.len();
        let row = row.min(rows);
        self.row_offsets.resize(rows + 1, 0.0);
        if row == 0 {
            self.row_offsets[0] = 0.0;
        }
        for r in row..rows {
            self.row_offsets[r + 1] = self.row_offsets[r] + self.row_height(r);
        }
    }

    /// Rendered height of `row` (zero while folded away)
    pub fn row_height(&self, row: usize) -> f32 {
        if self.is_row_hidden(row) {
            return 0.0;
        }
        let sub_rows = self.lines.get(row).map_or(1, LineEntry::sub_row_count);
        sub_rows as f32 * self.settings.font.line_height()
    }

    /// Height of the whole document
    pub fn total_height(&self) -> f32 {
        self.row_offsets.last().copied().unwrap_or(0.0)
    }

    fn invalidate_bounds(&self) {
        self.cached_bounds.set(None);
    }
}

impl LineLengths for TextDocument {
    fn line_length(&self, row: usize) -> usize {
        self.get_num_columns(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_rows_mirror_buffer() {
        let doc = TextDocument::new("abc\ndef\n", DocumentSettings::default());
        assert_eq!(doc.get_num_rows(), 3);
        assert_eq!(doc.get_line(1), "def");
        assert_eq!(doc.get_num_columns(2), 0);
        assert_eq!(doc.get_line(7), "");
    }

    #[test]
    fn test_row_offsets_accumulate() {
        let doc = TextDocument::new("a\nb\nc", DocumentSettings::default());
        let lh = doc.font().line_height();
        assert!((doc.total_height() - 3.0 * lh).abs() < 1e-3);
        assert!((doc.get_vertical_position(2, Metric::Top) - 2.0 * lh).abs() < 1e-3);
    }

    #[test]
    fn test_wrap_changes_row_height() {
        let mut doc = TextDocument::new("abcdefgh\nx", DocumentSettings::default());
        let lh = doc.font().line_height();
        doc.set_wrap_column(Some(4));
        assert!((doc.row_height(0) - 2.0 * lh).abs() < 1e-3);
        assert!((doc.get_vertical_position(1, Metric::Top) - 2.0 * lh).abs() < 1e-3);
    }

    #[test]
    fn test_add_selection_drops_duplicates() {
        let mut doc = TextDocument::new("abc", DocumentSettings::default());
        doc.set_selections(vec![Selection::caret(Position::new(0, 1))]);
        assert!(!doc.add_selection(Selection::caret(Position::new(0, 1))));
        assert_eq!(doc.num_selections(), 1);
        assert!(doc.add_selection(Selection::caret(Position::new(0, 2))));
        assert_eq!(doc.num_selections(), 2);
    }

    #[test]
    fn test_selections_are_clamped() {
        let mut doc = TextDocument::new("ab\nc", DocumentSettings::default());
        doc.set_selections(vec![Selection::from_rows(9, 9, 0, 7)]);
        assert_eq!(doc.selection(0), Selection::from_rows(1, 1, 0, 2));
    }

    #[test]
    fn test_listeners_see_consistent_document() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut doc = TextDocument::new("abc", DocumentSettings::default());
        let sink = seen.clone();
        let handle = doc.add_listener(Box::new(move |event| {
            if let DocumentEvent::BufferChanged(changed) = event {
                sink.borrow_mut().push(changed.snapshot.to_string());
            }
        }));

        doc.fulfill(&crate::transaction::Transaction::new(
            Selection::caret(Position::new(0, 3)),
            "d",
        ));
        assert_eq!(seen.borrow().as_slice(), ["abcd"]);

        assert!(doc.remove_listener(handle));
        doc.fulfill(&crate::transaction::Transaction::new(
            Selection::caret(Position::new(0, 0)),
            "z",
        ));
        assert_eq!(seen.borrow().len(), 1);
    }
}
