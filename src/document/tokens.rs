//! Syntax tag annotation
//!
//! Tags are painted onto the per-character arrays of the line cache. Edits
//! do not re-tokenize; callers run a tokenizer over the visible rows again
//! before the next paint.

use bevy::log::debug;
use std::ops::Range;
use crate::syntax::{TokenZone, Tokenizer};
use crate::types::{Position, TokenTag};
use super::TextDocument;

impl TextDocument {
    /// Reset every tag on `rows` to plain
    pub fn clear_tokens(&mut self, rows: Range<usize>) {
        let end = rows.end.min(self.get_num_rows());
        for row in rows.start..end {
            if let Some(entry) = self.lines.get_mut(row) {
                entry.clear_tokens(0..entry.len());
            }
        }
    }

    /// Paint each zone's style over the part of it that falls in `rows`
    pub fn apply_tokens(&mut self, rows: Range<usize>, zones: &[TokenZone]) {
        let end = rows.end.min(self.get_num_rows());
        for zone in zones {
            let s = zone.oriented();
            let first = s.head.row.max(rows.start);
            let last = (s.tail.row + 1).min(end);
            for row in first..last {
                if let Some(entry) = self.lines.get_mut(row) {
                    let columns = s.column_range_on_row(row, entry.len());
                    entry.apply_tokens(columns, zone.style);
                }
            }
        }
    }

    /// Tag at `index`, or `default` when it lies past its row
    pub fn token_or(&self, index: Position, default: TokenTag) -> TokenTag {
        self.get_token_at(index, Some(default)).unwrap_or(default)
    }

    /// Re-tokenize `rows`, starting `margin` rows above them
    ///
    /// Lexing starts at the top of a row, so the margin gives constructs
    /// opened above the viewport (block comments, strings) a chance to be
    /// seen before the first visible row.
    pub fn tokenize_rows(&mut self, rows: Range<usize>, tokenizer: &mut dyn Tokenizer, margin: usize) -> usize {
        let start = rows.start.saturating_sub(margin);
        let end = rows.end.min(self.get_num_rows());
        if start >= end {
            return 0;
        }

        let zones = tokenizer.tokenize(self.buffer.rope(), start..end);
        self.clear_tokens(start..end);
        self.apply_tokens(start..end, &zones);

        if self.settings.diagnostics.token_debug {
            debug!("tokenized rows {}..{}: {} zones", start, end, zones.len());
        }
        zones.len()
    }
}
