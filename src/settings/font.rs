//! Font metrics used to turn sub-columns and sub-rows into pixels

use bevy::prelude::*;
use cosmic_text::FontSystem;
use serde::{Deserialize, Serialize};

/// Font settings - the document assumes a monospace face
#[derive(Clone, Debug, Resource, Serialize, Deserialize)]
pub struct FontSettings {
    /// Font family name (informational, rendering resolves it)
    pub family: String,

    /// Font size in pixels; also the font height
    pub size: f32,

    /// Advance of one sub-column
    pub char_width: f32,

    /// Row pitch as a multiple of the font height
    pub line_spacing: f32,

    /// Ascent as a fraction of the font height
    pub ascent_ratio: f32,
}

impl Default for FontSettings {
    fn default() -> Self {
        let size = 14.0;
        Self {
            family: "monospace".to_string(),
            size,
            char_width: size * 0.6,
            line_spacing: 1.333,
            ascent_ratio: 0.8,
        }
    }
}

impl FontSettings {
    /// Height of the glyphs themselves
    pub fn font_height(&self) -> f32 {
        self.size
    }

    /// Height of one rendered row
    pub fn line_height(&self) -> f32 {
        self.size * self.line_spacing
    }

    /// Leading split above and below the glyphs of a row
    pub fn gap(&self) -> f32 {
        (self.line_height() - self.font_height()) * 0.5
    }

    pub fn ascent(&self) -> f32 {
        self.size * self.ascent_ratio
    }

    /// Same settings rescaled to `size`
    pub fn with_size(mut self, size: f32) -> Self {
        let scale = size / self.size.max(f32::EPSILON);
        self.char_width *= scale;
        self.size = size;
        self
    }

    /// Read advance and ascent from the first monospace face the system knows
    ///
    /// Leaves the settings untouched when no usable face is found.
    pub fn measure(mut self, font_system: &mut FontSystem) -> Self {
        let font_id = {
            let db = font_system.db();
            db.faces()
                .find(|face| face.monospaced)
                .or_else(|| db.faces().next())
                .map(|face| face.id)
        };
        let Some(font) = font_id.and_then(|id| font_system.get_font(id)) else {
            warn!("no font face available, keeping estimated metrics");
            return self;
        };

        let swash_font = font.as_swash();
        let glyph_id = swash_font.charmap().map('0');
        if glyph_id == 0 {
            return self;
        }

        let advance = swash_font
            .glyph_metrics(&[])
            .scale(self.size)
            .advance_width(glyph_id);
        let metrics = swash_font.metrics(&[]).scale(self.size);

        if advance > 0.0 {
            self.char_width = advance;
        }
        if metrics.ascent > 0.0 {
            self.ascent_ratio = metrics.ascent / self.size;
        }
        debug!("measured {} at {}px: advance {}", self.family, self.size, self.char_width);
        self
    }
}
