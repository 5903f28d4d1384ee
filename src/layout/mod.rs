//! Glyph line cache
//!
//! Converts line text into sub-row/sub-column layout once, memoized by a hash
//! of the text and the layout parameters. Entries are an arena indexed by row
//! and track the buffer 1:1: edits splice entries in and out, and an entry
//! whose hash still matches keeps its layout and tokens.

mod line;
mod wrap;

pub use line::{LineEntry, OutOfBoundsMode, SubPosition};
pub use wrap::{glyph_width, wrap_breaks};

use std::ops::Range;

/// Inputs that change the layout of a line besides its text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutParams {
    /// Wrap column in sub-columns, `None` disables soft wrap
    pub wrap_column: Option<usize>,
    /// Tab stop interval
    pub tab_size: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            wrap_column: None,
            tab_size: 4,
        }
    }
}

/// Counters for cache effectiveness
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutStats {
    /// Entries whose layout was recomputed
    pub recomputes: u64,
    /// Entries carried across an edit because their hash matched
    pub reuses: u64,
}

/// Arena of line entries, one per buffer row
#[derive(Clone, Debug)]
pub struct GlyphLineCache {
    entries: Vec<LineEntry>,
    params: LayoutParams,
    stats: LayoutStats,
}

impl GlyphLineCache {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            entries: Vec::new(),
            params,
            stats: LayoutStats::default(),
        }
    }

    /// Build a cache with one dirty entry per line
    pub fn from_lines<I>(lines: I, params: LayoutParams) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut cache = Self::new(params);
        cache.entries = lines
            .into_iter()
            .map(|text| LineEntry::new(text, params))
            .collect();
        cache
    }

    pub fn params(&self) -> LayoutParams {
        self.params
    }

    pub fn stats(&self) -> LayoutStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&LineEntry> {
        self.entries.get(row)
    }

    pub fn get_mut(&mut self, row: usize) -> Option<&mut LineEntry> {
        self.entries.get_mut(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineEntry> {
        self.entries.iter()
    }

    /// Replace the entries for `old_rows` with entries for `lines`
    ///
    /// Lines whose text matches the entry previously at the same offset
    /// within the range keep that entry untouched. Rows after the range
    /// shift by the difference in length.
    pub fn splice(&mut self, old_rows: Range<usize>, lines: Vec<String>) {
        let start = old_rows.start.min(self.entries.len());
        let end = old_rows.end.clamp(start, self.entries.len());
        let params = self.params;

        let mut old: Vec<LineEntry> = self.entries.drain(start..end).collect();
        let mut replacement = Vec::with_capacity(lines.len());

        for (i, text) in lines.into_iter().enumerate() {
            let fresh = LineEntry::new(text, params);
            match old.get_mut(i) {
                Some(existing) if existing.hash() == fresh.hash() && existing.text() == fresh.text() => {
                    self.stats.reuses += 1;
                    replacement.push(std::mem::replace(existing, fresh));
                }
                _ => replacement.push(fresh),
            }
        }
        old.clear();

        self.entries.splice(start..start, replacement);
    }

    /// Change layout parameters; entries whose key changes become dirty
    pub fn set_params(&mut self, params: LayoutParams) -> bool {
        if params == self.params {
            return false;
        }
        self.params = params;
        for entry in &mut self.entries {
            entry.rekey(params);
        }
        true
    }

    /// Lazily recompute the layout of `row`; returns whether work was done
    pub fn ensure_valid(&mut self, row: usize) -> bool {
        let params = self.params;
        let Some(entry) = self.entries.get_mut(row) else {
            return false;
        };
        let recomputed = entry.ensure_valid(params);
        if recomputed {
            self.stats.recomputes += 1;
        }
        recomputed
    }

    /// Recompute every dirty entry in `rows`
    pub fn ensure_range_valid(&mut self, rows: Range<usize>) -> usize {
        let end = rows.end.min(self.entries.len());
        (rows.start..end).filter(|&row| self.ensure_valid(row)).count()
    }
}
