//! Viewport queries
//!
//! Read-only transforms between positions and document pixels. Everything
//! here is derived from the line cache and the row offset table; nothing
//! mutates the document except the lazily filled bounds cache.
//!
//! Pixel space has its origin at the top-left of row 0, y growing down.
//! Column 0 starts `text_indent` pixels from the left edge.

use bevy::math::{Rect, Vec2};
use std::ops::Range;
use crate::geometry::{consolidate_rects, rect_xywh, rects_touch, Underline};
use crate::layout::{LineEntry, OutOfBoundsMode};
use crate::types::{Position, Selection, TokenTag};
use super::TextDocument;

/// Vertical reference line within a rendered row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    Top,
    Ascent,
    Baseline,
    Bottom,
}

/// One row returned by a viewport query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowData {
    pub row: usize,
    /// Whether any selection touches the row
    pub is_row_selected: bool,
    pub bounds: Rect,
}

/// A character with its box, ready to paint
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedGlyph {
    pub column: usize,
    pub ch: char,
    pub token: TokenTag,
    pub bounds: Rect,
    /// Pen position on the baseline
    pub baseline: Vec2,
}

impl TextDocument {
    fn metric_offset(&self, metric: Metric) -> f32 {
        let font = &self.settings.font;
        match metric {
            Metric::Top => 0.0,
            Metric::Ascent => font.gap(),
            Metric::Baseline => font.gap() + font.ascent(),
            Metric::Bottom => font.line_height(),
        }
    }

    fn row_top(&self, row: usize) -> f32 {
        let row = row.min(self.row_offsets.len().saturating_sub(1));
        self.row_offsets.get(row).copied().unwrap_or(0.0)
    }

    fn sub_column_x(&self, sub_col: usize) -> f32 {
        self.settings.text_indent + sub_col as f32 * self.settings.font.char_width
    }

    /// Y of `metric` on `row`; `Bottom` is the bottom of the last sub-row
    pub fn get_vertical_position(&self, row: usize, metric: Metric) -> f32 {
        let top = self.row_top(row);
        match metric {
            Metric::Bottom => top + self.row_height(row),
            _ => top + self.metric_offset(metric),
        }
    }

    /// Pixel position of `index` at `metric`, following wrapping
    pub fn get_position(&self, index: Position, metric: Metric) -> Vec2 {
        let index = self.clamp(index);
        let Some(entry) = self.lines.get(index.row) else {
            return Vec2::ZERO;
        };
        let p = entry.position(index.column, OutOfBoundsMode::BeyondLastCharacter);
        let lh = self.settings.font.line_height();
        Vec2::new(
            self.sub_column_x(p.sub_col),
            self.row_top(index.row) + p.sub_row as f32 * lh + self.metric_offset(metric),
        )
    }

    /// Boxes covering `columns` on `row`, one per rendered sub-row
    ///
    /// Columns past the end of the line resolve through `mode`.
    pub fn get_bounds_on_row(&self, row: usize, columns: Range<usize>, mode: OutOfBoundsMode) -> Vec<Rect> {
        let Some(entry) = self.lines.get(row) else {
            return Vec::new();
        };
        let top = self.row_top(row);
        let lh = self.settings.font.line_height();
        let cw = self.settings.font.char_width;

        let mut rects: Vec<Rect> = entry
            .sub_row_spans(columns.clone())
            .into_iter()
            .map(|(sub_row, span)| {
                rect_xywh(
                    self.sub_column_x(span.start),
                    top + sub_row as f32 * lh,
                    span.len() as f32 * cw,
                    lh,
                )
            })
            .collect();

        if columns.end > entry.len() && columns.start < columns.end {
            let p = entry.position(entry.len().max(columns.start), mode);
            rects.push(rect_xywh(self.sub_column_x(p.sub_col), top + p.sub_row as f32 * lh, cw, lh));
        }

        consolidate_rects(rects)
    }

    /// Box of the glyph at `index` (at least one column wide)
    pub fn get_glyph_bounds(&self, index: Position, mode: OutOfBoundsMode) -> Rect {
        let Some(entry) = self.lines.get(index.row) else {
            return Rect::default();
        };
        let p = entry.position(index.column, mode);
        let cw = self.settings.font.char_width;
        let lh = self.settings.font.line_height();
        rect_xywh(
            self.sub_column_x(p.sub_col),
            self.row_top(index.row) + p.sub_row as f32 * lh,
            entry.glyph_width(index.column).max(1) as f32 * cw,
            lh,
        )
    }

    /// Rows whose vertical extent may meet `area`, padded by one row each side
    pub fn get_range_of_rows_intersecting(&self, area: Rect) -> Range<usize> {
        let rows = self.get_num_rows();
        if self.row_offsets.len() < rows + 1 {
            return 0..rows;
        }
        let bottoms = &self.row_offsets[1..=rows];
        let tops = &self.row_offsets[..rows];

        let first = bottoms.partition_point(|&bottom| bottom < area.min.y);
        let last = tops.partition_point(|&top| top <= area.max.y);

        first.saturating_sub(1)..(last + 1).min(rows).max(first.saturating_sub(1))
    }

    /// Visible rows meeting `area`
    ///
    /// With `compute_horizontal` the bounds hug the row's text; otherwise
    /// they span the query area horizontally.
    pub fn find_rows_intersecting(&self, area: Rect, compute_horizontal: bool) -> Vec<RowData> {
        let cw = self.settings.font.char_width;

        self.get_range_of_rows_intersecting(area)
            .filter(|&row| !self.is_row_hidden(row))
            .filter_map(|row| {
                let top = self.row_top(row);
                let height = self.row_height(row);
                if top > area.max.y || top + height < area.min.y {
                    return None;
                }

                let bounds = if compute_horizontal {
                    let width = self.lines.get(row).map_or(0, LineEntry::max_row_width);
                    rect_xywh(self.settings.text_indent, top, width as f32 * cw, height)
                } else {
                    rect_xywh(area.min.x, top, area.width(), height)
                };

                Some(RowData {
                    row,
                    is_row_selected: self.selections.iter().any(|s| s.intersects_row(row)),
                    bounds,
                })
            })
            .collect()
    }

    /// Caret position closest to `point`
    ///
    /// Picks the row by its vertical extent, then the sub-row, then the
    /// glyph whose box (shifted by half a column) contains the point.
    pub fn find_index_nearest_position(&self, point: Vec2) -> Position {
        let rows = self.get_num_rows();
        if point.y >= self.total_height() {
            return self.get_end();
        }
        if self.row_offsets.len() < rows + 1 {
            return Position::ZERO;
        }

        let mut row = self.row_offsets[1..=rows]
            .partition_point(|&bottom| bottom <= point.y)
            .min(rows - 1);
        if self.is_row_hidden(row) {
            row = self.prev_visible_row(row).unwrap_or(0);
        }
        let Some(entry) = self.lines.get(row) else {
            return self.get_end();
        };

        let lh = self.settings.font.line_height();
        let cw = self.settings.font.char_width;
        let last_sub_row = entry.sub_row_count() - 1;
        let sub_row = (((point.y - self.row_top(row)) / lh).max(0.0) as usize).min(last_sub_row);

        let columns = entry.columns_on_sub_row(sub_row);
        let x = point.x - self.settings.text_indent + cw * 0.5;

        for column in columns.clone() {
            let p = entry.position(column, OutOfBoundsMode::Assert);
            let right = (p.sub_col + entry.glyph_width(column)) as f32 * cw;
            if x < right {
                return Position::new(row, column);
            }
        }

        if sub_row == last_sub_row {
            Position::new(row, entry.len())
        } else {
            Position::new(row, columns.end.saturating_sub(1).max(columns.start))
        }
    }

    /// Rows and columns a selection paints over
    ///
    /// A multi-row selection ending at column 0 does not paint its last row.
    fn painted_spans(&self, selection: Selection) -> Vec<(usize, Range<usize>)> {
        let s = selection.oriented();
        let mut rows = s.head.row..s.tail.row + 1;
        if !s.is_single_line() && s.tail.column == 0 {
            rows.end -= 1;
        }

        rows.filter(|&row| row < self.get_num_rows() && !self.is_row_hidden(row))
            .map(|row| (row, s.column_range_on_row(row, self.get_num_columns(row))))
            .collect()
    }

    /// Strokes under each sub-row the selection covers, at `metric`
    pub fn get_underlines(&self, selection: Selection, metric: Metric) -> Vec<Underline> {
        let lh = self.settings.font.line_height();
        let cw = self.settings.font.char_width;
        let offset = self.metric_offset(metric);
        let mut lines = Vec::new();

        for (row, columns) in self.painted_spans(selection) {
            let Some(entry) = self.lines.get(row) else { continue };
            let top = self.row_top(row);
            let spans = entry.sub_row_spans(columns);

            if spans.is_empty() {
                if !selection.is_singular() {
                    let y = top + offset;
                    let x = self.settings.text_indent;
                    lines.push(Underline::new(Vec2::new(x, y), Vec2::new(x + cw * 0.5, y)));
                }
                continue;
            }

            for (sub_row, span) in spans {
                let y = top + sub_row as f32 * lh + offset;
                lines.push(Underline::new(
                    Vec2::new(self.sub_column_x(span.start), y),
                    Vec2::new(self.sub_column_x(span.end), y),
                ));
            }
        }

        lines
    }

    /// Highlight rects for `selection`, optionally clipped to a viewport
    pub fn get_selection_region(&self, selection: Selection, clip: Option<Rect>) -> Vec<Rect> {
        let lh = self.settings.font.line_height();
        let cw = self.settings.font.char_width;
        let mut rects = Vec::new();

        for (row, columns) in self.painted_spans(selection) {
            let top = self.row_top(row);
            if let Some(clip) = clip {
                if top > clip.max.y || top + self.row_height(row) < clip.min.y {
                    continue;
                }
            }
            let Some(entry) = self.lines.get(row) else { continue };
            let spans = entry.sub_row_spans(columns);

            if spans.is_empty() {
                rects.push(rect_xywh(self.settings.text_indent, top, cw * 0.5, lh));
                continue;
            }
            for (sub_row, span) in spans {
                rects.push(rect_xywh(
                    self.sub_column_x(span.start),
                    top + sub_row as f32 * lh,
                    span.len() as f32 * cw,
                    lh,
                ));
            }
        }

        let rects = consolidate_rects(rects);
        match clip {
            Some(clip) => rects.into_iter().filter(|r| rects_touch(r, &clip)).collect(),
            None => rects,
        }
    }

    /// Bounding box of the whole document, cached until the next change
    pub fn get_bounds(&self) -> Rect {
        if let Some(bounds) = self.cached_bounds.get() {
            return bounds;
        }

        let widest = self
            .lines
            .iter()
            .enumerate()
            .filter(|(row, _)| !self.is_row_hidden(*row))
            .map(|(_, entry)| entry.max_row_width())
            .max()
            .unwrap_or(0);
        let bounds = rect_xywh(
            0.0,
            0.0,
            self.sub_column_x(widest),
            self.total_height(),
        );
        self.cached_bounds.set(Some(bounds));
        bounds
    }

    /// Glyphs of `row`, optionally only those tagged `token`
    ///
    /// With `with_trailing_space` a blank glyph is appended at the
    /// end-of-line slot so a caret there has a box to draw.
    pub fn get_glyphs_for_row(&self, row: usize, token: Option<TokenTag>, with_trailing_space: bool) -> Vec<PositionedGlyph> {
        if self.is_row_hidden(row) {
            return Vec::new();
        }
        let Some(entry) = self.lines.get(row) else {
            return Vec::new();
        };

        let font = &self.settings.font;
        let lh = font.line_height();
        let baseline_offset = font.gap() + font.ascent();
        let top = self.row_top(row);

        let glyph = |column: usize, ch: char, tag: TokenTag, mode: OutOfBoundsMode| {
            let p = entry.position(column, mode);
            let y = top + p.sub_row as f32 * lh;
            let x = self.sub_column_x(p.sub_col);
            PositionedGlyph {
                column,
                ch,
                token: tag,
                bounds: rect_xywh(x, y, entry.glyph_width(column).max(1) as f32 * font.char_width, lh),
                baseline: Vec2::new(x, y + baseline_offset),
            }
        };

        let mut glyphs: Vec<PositionedGlyph> = entry
            .chars()
            .iter()
            .enumerate()
            .filter(|&(column, _)| token.is_none_or(|t| entry.token_at(column, 0) == t))
            .map(|(column, &ch)| glyph(column, ch, entry.token_at(column, 0), OutOfBoundsMode::Assert))
            .collect();

        if with_trailing_space && token.is_none() {
            glyphs.push(glyph(entry.len(), ' ', 0, OutOfBoundsMode::BeyondLastCharacter));
        }
        glyphs
    }

    /// Glyphs whose boxes meet `area`, optionally filtered by tag
    pub fn find_glyphs_intersecting(&self, area: Rect, token: Option<TokenTag>) -> Vec<PositionedGlyph> {
        self.get_range_of_rows_intersecting(area)
            .flat_map(|row| self.get_glyphs_for_row(row, token, false))
            .filter(|g| rects_touch(&g.bounds, &area))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FoldRegion;
    use crate::settings::DocumentSettings;

    fn doc(text: &str) -> TextDocument {
        TextDocument::new(text, DocumentSettings::default())
    }

    fn metrics(d: &TextDocument) -> (f32, f32, f32) {
        let font = d.font();
        (font.char_width, font.line_height(), d.settings().text_indent)
    }

    #[test]
    fn test_vertical_metrics_are_ordered() {
        let d = doc("a\nb");
        let top = d.get_vertical_position(1, Metric::Top);
        let ascent = d.get_vertical_position(1, Metric::Ascent);
        let baseline = d.get_vertical_position(1, Metric::Baseline);
        let bottom = d.get_vertical_position(1, Metric::Bottom);
        assert!(top < ascent && ascent < baseline && baseline < bottom);
        assert!((bottom - d.total_height()).abs() < 1e-3);
    }

    #[test]
    fn test_bounds_on_row_merge_into_one_rect() {
        let d = doc("hello");
        let (cw, lh, indent) = metrics(&d);
        let rects = d.get_bounds_on_row(0, 1..4, OutOfBoundsMode::Assert);
        assert_eq!(rects.len(), 1);
        assert!((rects[0].min.x - (indent + cw)).abs() < 1e-3);
        assert!((rects[0].width() - 3.0 * cw).abs() < 1e-3);
        assert!((rects[0].height() - lh).abs() < 1e-3);
    }

    #[test]
    fn test_bounds_on_wrapped_row_split_per_sub_row() {
        let mut d = doc("abcdefgh");
        d.set_wrap_column(Some(4));
        let rects = d.get_bounds_on_row(0, 2..6, OutOfBoundsMode::Assert);
        assert_eq!(rects.len(), 2);
        assert!(rects[1].min.y > rects[0].min.y);
    }

    #[test]
    fn test_tab_glyph_is_wide() {
        let d = doc("\tx");
        let (cw, _, indent) = metrics(&d);
        let tab = d.get_glyph_bounds(Position::new(0, 0), OutOfBoundsMode::Assert);
        assert!((tab.width() - 4.0 * cw).abs() < 1e-3);
        let x = d.get_glyph_bounds(Position::new(0, 1), OutOfBoundsMode::Assert);
        assert!((x.min.x - (indent + 4.0 * cw)).abs() < 1e-3);
    }

    #[test]
    fn test_rows_intersecting_area() {
        let d = doc(&"row\n".repeat(20));
        let (_, lh, _) = metrics(&d);
        let area = rect_xywh(0.0, 5.0 * lh + 1.0, 100.0, 2.0 * lh);
        let range = d.get_range_of_rows_intersecting(area);
        assert!(range.start <= 5 && range.end >= 8);

        let rows: Vec<usize> = d.find_rows_intersecting(area, true).iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![5, 6, 7]);
    }

    #[test]
    fn test_rows_intersecting_skip_folded() {
        let mut d = doc("a\nb\nc\nd");
        d.fold_rows(FoldRegion::new(0, 2));
        let area = rect_xywh(0.0, 0.0, 100.0, d.total_height());
        let rows: Vec<usize> = d.find_rows_intersecting(area, false).iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 3]);
    }

    #[test]
    fn test_nearest_index() {
        let d = doc("hello\nworld");
        let (cw, lh, indent) = metrics(&d);

        // left half of 'e' goes before it, right half after it
        let y = lh * 0.5;
        assert_eq!(d.find_index_nearest_position(Vec2::new(indent + cw * 1.2, y)), Position::new(0, 1));
        assert_eq!(d.find_index_nearest_position(Vec2::new(indent + cw * 1.8, y)), Position::new(0, 2));
        assert_eq!(d.find_index_nearest_position(Vec2::new(-50.0, y)), Position::new(0, 0));
        assert_eq!(d.find_index_nearest_position(Vec2::new(500.0, lh * 1.5)), Position::new(1, 5));
        assert_eq!(d.find_index_nearest_position(Vec2::new(0.0, 100.0 * lh)), d.get_end());
    }

    #[test]
    fn test_nearest_index_on_wrapped_line() {
        let mut d = doc("abcdefgh");
        d.set_wrap_column(Some(4));
        let (cw, lh, indent) = metrics(&d);
        assert_eq!(d.find_index_nearest_position(Vec2::new(indent + cw * 1.2, lh * 1.5)), Position::new(0, 5));
        assert_eq!(d.find_index_nearest_position(Vec2::new(500.0, lh * 0.5)), Position::new(0, 3));
    }

    #[test]
    fn test_selection_region_skips_empty_tail_row() {
        let d = doc("abc\ndef\nghi");
        let rects = d.get_selection_region(Selection::from_rows(0, 1, 2, 0), None);
        assert_eq!(rects.len(), 2);

        let stub = d.get_selection_region(Selection::from_rows(0, 3, 1, 1), None);
        // nothing selected on row 0 past its end, so it gets a stub
        assert_eq!(stub.len(), 2);
    }

    #[test]
    fn test_underlines_per_sub_row() {
        let mut d = doc("abcdefgh\nxy");
        d.set_wrap_column(Some(4));
        let lines = d.get_underlines(Selection::from_rows(0, 2, 1, 1), Metric::Baseline);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.length() > 0.0));
    }

    #[test]
    fn test_bounds_cache_invalidated_by_edit() {
        let mut d = doc("ab");
        let (cw, _, indent) = metrics(&d);
        let before = d.get_bounds();
        assert!((before.width() - (indent + 2.0 * cw)).abs() < 1e-3);

        d.fulfill(&crate::transaction::Transaction::new(Selection::caret(Position::new(0, 2)), "cdef"));
        let after = d.get_bounds();
        assert!((after.width() - (indent + 6.0 * cw)).abs() < 1e-3);
    }

    #[test]
    fn test_glyphs_filtered_by_token() {
        let mut d = doc("let x");
        d.apply_tokens(0..1, &[Selection::from_rows(0, 0, 0, 3).with_style(4)]);
        let keyword: String = d.get_glyphs_for_row(0, Some(4), false).iter().map(|g| g.ch).collect();
        assert_eq!(keyword, "let");
        assert_eq!(d.get_glyphs_for_row(0, None, true).len(), 6);
        assert!(d.get_glyphs_for_row(0, None, false).iter().all(|g| g.baseline.y > g.bounds.min.y));
    }

    #[test]
    fn test_glyphs_intersecting_area() {
        let d = doc("abc\ndef");
        let (cw, lh, indent) = metrics(&d);
        let area = rect_xywh(indent + cw * 1.1, lh * 1.2, cw * 0.5, lh * 0.2);
        let hits: Vec<char> = d.find_glyphs_intersecting(area, None).iter().map(|g| g.ch).collect();
        assert_eq!(hits, vec!['e']);
    }
}
