//! Row folding
//!
//! A fold keeps its first row visible and hides the rows below it up to and
//! including `end_row`. Hidden rows have zero height, are skipped by row
//! navigation and are left out of viewport queries. Folds survive edits
//! outside them and are dropped when an edit straddles their boundary.

use bevy::log::debug;
use serde::{Deserialize, Serialize};
use crate::buffer::BufferChange;
use crate::events::DocumentEvent;
use super::TextDocument;

/// A folded row range; `start_row` stays visible
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoldRegion {
    pub start_row: usize,
    pub end_row: usize,
}

impl FoldRegion {
    pub fn new(start_row: usize, end_row: usize) -> Self {
        Self { start_row, end_row }
    }

    /// Rows hidden by this fold
    pub fn hidden_row_count(&self) -> usize {
        self.end_row.saturating_sub(self.start_row)
    }

    /// Whether `row` is one of the hidden rows
    pub fn hides(&self, row: usize) -> bool {
        row > self.start_row && row <= self.end_row
    }
}

impl TextDocument {
    /// Fold `region`; returns false if it is empty, out of range or already folded
    pub fn fold_rows(&mut self, region: FoldRegion) -> bool {
        if region.end_row <= region.start_row || region.end_row >= self.get_num_rows() {
            debug!("rejecting fold {:?}", region);
            return false;
        }
        if self.folds.iter().any(|f| f.start_row == region.start_row) {
            return false;
        }

        let at = self.folds.partition_point(|f| f.start_row < region.start_row);
        self.folds.insert(at, region);
        self.folds_changed(region.start_row);
        true
    }

    /// Remove the fold starting at `start_row`
    pub fn unfold_rows(&mut self, start_row: usize) -> bool {
        let Some(at) = self.folds.iter().position(|f| f.start_row == start_row) else {
            return false;
        };
        self.folds.remove(at);
        self.folds_changed(start_row);
        true
    }

    pub fn unfold_all(&mut self) {
        if self.folds.is_empty() {
            return;
        }
        self.folds.clear();
        self.folds_changed(0);
    }

    /// Active folds, ordered by start row
    pub fn folds(&self) -> &[FoldRegion] {
        &self.folds
    }

    pub fn is_row_hidden(&self, row: usize) -> bool {
        self.hidden.get(row).copied().unwrap_or(false)
    }

    pub fn hidden_row_count(&self) -> usize {
        self.hidden.iter().filter(|&&h| h).count()
    }

    pub(super) fn next_visible_row(&self, row: usize) -> Option<usize> {
        (row + 1..self.get_num_rows()).find(|&r| !self.is_row_hidden(r))
    }

    pub(super) fn prev_visible_row(&self, row: usize) -> Option<usize> {
        (0..row.min(self.get_num_rows())).rev().find(|&r| !self.is_row_hidden(r))
    }

    pub(super) fn rebuild_hidden(&mut self) {
        let rows = self.get_num_rows();
        self.hidden.clear();
        self.hidden.resize(rows, false);
        for fold in &self.folds {
            let end = fold.end_row.min(rows.saturating_sub(1));
            for row in fold.start_row + 1..=end {
                self.hidden[row] = true;
            }
        }
    }

    /// Carry folds across a buffer edit
    ///
    /// Returns the first row whose visibility may have changed.
    pub(super) fn shift_folds(&mut self, change: &BufferChange) -> usize {
        if self.folds.is_empty() {
            return change.start_row;
        }

        let delta = change.row_delta();
        let before = self.folds.len();
        let mut first_row = change.start_row;

        self.folds.retain_mut(|fold| {
            if change.old_end_row < fold.start_row {
                fold.start_row = fold.start_row.saturating_add_signed(delta);
                fold.end_row = fold.end_row.saturating_add_signed(delta);
                true
            } else if change.start_row > fold.end_row {
                true
            } else if change.start_row >= fold.start_row && change.old_end_row <= fold.end_row {
                fold.end_row = fold.end_row.saturating_add_signed(delta);
                fold.end_row > fold.start_row
            } else {
                first_row = first_row.min(fold.start_row + 1);
                false
            }
        });

        if self.folds.len() != before {
            debug!("edit dropped {} fold(s)", before - self.folds.len());
        }
        self.rebuild_hidden();
        first_row
    }

    fn folds_changed(&mut self, from_row: usize) {
        self.rebuild_hidden();
        self.invalidate_bounds();
        self.rebuild_row_offsets_from(from_row);
        let hidden_rows = self.hidden_row_count();
        self.listeners.notify(&DocumentEvent::FoldStateChanged { hidden_rows });
    }
}
