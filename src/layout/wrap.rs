//! Soft wrapping and tab expansion for a single line
//!
//! Works in sub-columns: one per ordinary glyph, and a tab advances to the
//! next tab stop. Wrapping splits a line into sub-rows no wider than the
//! wrap column.

/// Sub-columns occupied by `ch` when it starts at `sub_col`
#[inline]
pub fn glyph_width(ch: char, sub_col: usize, tab_size: usize) -> usize {
    if ch == '\t' {
        let tab_size = tab_size.max(1);
        tab_size - sub_col % tab_size
    } else {
        1
    }
}

/// Char indices at which a new sub-row begins
///
/// A line overflowing the wrap column breaks after its last whitespace when
/// that keeps more than half of the row on the first sub-row, otherwise at
/// the overflowing character. A sub-row always holds at least one glyph.
pub fn wrap_breaks(chars: &[char], wrap_column: usize, tab_size: usize) -> Vec<usize> {
    let wrap_column = wrap_column.max(1);
    let mut breaks = Vec::new();
    let mut row_start = 0;
    let mut col = 0;
    let mut after_space: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let width = glyph_width(ch, col, tab_size);

        if col > 0 && col + width > wrap_column {
            let at = match after_space {
                Some(b) if b > row_start && (b - row_start) * 2 > i - row_start => b,
                _ => i,
            };
            breaks.push(at);
            row_start = at;
            i = at;
            col = 0;
            after_space = None;
            continue;
        }

        col += width;
        if ch.is_whitespace() {
            after_space = Some(i + 1);
        }
        i += 1;
    }

    breaks
}
