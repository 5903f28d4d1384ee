//! Pixel-space helpers shared by the layout cache and viewport queries
//!
//! Coordinates are top-left origin, y growing downward, in unscaled document
//! pixels. View scale and translation are applied by the consumer.

use bevy::math::{Rect, Vec2};

/// Build a rect from its top-left corner and size
#[inline]
pub fn rect_xywh(x: f32, y: f32, width: f32, height: f32) -> Rect {
    Rect {
        min: Vec2::new(x, y),
        max: Vec2::new(x + width, y + height),
    }
}

/// Whether two rects overlap (touching edges count)
///
/// `Rect::intersect` treats zero-height areas as empty, which loses
/// hairline queries, so the comparison is done by hand.
#[inline]
pub fn rects_touch(a: &Rect, b: &Rect) -> bool {
    a.min.x <= b.max.x && b.min.x <= a.max.x && a.min.y <= b.max.y && b.min.y <= a.max.y
}

/// Merge horizontally adjacent rects that share the same vertical extent
///
/// Glyph boxes of one sub-row come out as a run of touching rects; painting
/// a highlight wants one rect per run.
pub fn consolidate_rects(rects: Vec<Rect>) -> Vec<Rect> {
    let mut merged: Vec<Rect> = Vec::with_capacity(rects.len());

    for rect in rects {
        if let Some(last) = merged.last_mut() {
            let same_band = (last.min.y - rect.min.y).abs() < f32::EPSILON
                && (last.max.y - rect.max.y).abs() < f32::EPSILON;
            let adjacent = (last.max.x - rect.min.x).abs() < 0.01;

            if same_band && adjacent {
                last.max.x = rect.max.x;
                continue;
            }
        }
        merged.push(rect);
    }

    merged
}

/// A horizontal or vertical stroke used for selection outlines and squiggles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Underline {
    pub start: Vec2,
    pub end: Vec2,
}

impl Underline {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Shift both endpoints
    pub fn translated(self, offset: Vec2) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidate_adjacent_rects() {
        let rects = vec![
            rect_xywh(0.0, 0.0, 8.0, 10.0),
            rect_xywh(8.0, 0.0, 8.0, 10.0),
            rect_xywh(16.0, 0.0, 8.0, 10.0),
            rect_xywh(0.0, 10.0, 8.0, 10.0),
        ];
        let merged = consolidate_rects(rects);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].max.x, 24.0);
        assert_eq!(merged[1].min.y, 10.0);
    }

    #[test]
    fn test_consolidate_keeps_gaps() {
        let merged = consolidate_rects(vec![
            rect_xywh(0.0, 0.0, 8.0, 10.0),
            rect_xywh(20.0, 0.0, 8.0, 10.0),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_rects_touch_hairline() {
        let row = rect_xywh(0.0, 10.0, 100.0, 10.0);
        let probe = rect_xywh(5.0, 15.0, 0.0, 0.0);
        assert!(rects_touch(&row, &probe));
        assert!(!rects_touch(&row, &rect_xywh(5.0, 30.0, 0.0, 0.0)));
    }
}
