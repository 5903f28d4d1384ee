//! Document settings
//!
//! Each concern has its own settings struct; [`DocumentSettings`] bundles
//! them and is handed to the document at construction.
//! Use `DocumentSettingsBuilder` for convenient initialization.

mod font;
mod wrapping;
mod history;
mod diagnostics;

pub use font::*;
pub use wrapping::*;
pub use history::*;
pub use diagnostics::*;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// All settings the document core reads
#[derive(Clone, Debug, Resource, Serialize, Deserialize)]
pub struct DocumentSettings {
    pub font: FontSettings,
    pub wrapping: WrappingSettings,
    pub history: HistorySettings,
    pub diagnostics: DiagnosticsSettings,

    /// Left padding before column 0, in pixels
    pub text_indent: f32,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            font: FontSettings::default(),
            wrapping: WrappingSettings::default(),
            history: HistorySettings::default(),
            diagnostics: DiagnosticsSettings::default(),
            text_indent: 4.0,
        }
    }
}

impl DocumentSettings {
    pub fn builder() -> DocumentSettingsBuilder {
        DocumentSettingsBuilder::default()
    }
}

/// Builder for configuring all document settings at once
///
/// # Example
/// ```no_run
/// use bevy_code_document::settings::DocumentSettingsBuilder;
///
/// let settings = DocumentSettingsBuilder::default()
///     .font_size(16.0)
///     .wrap_column(Some(100))
///     .build();
/// ```
#[derive(Default)]
pub struct DocumentSettingsBuilder {
    settings: DocumentSettings,
}

impl DocumentSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // Font configuration
    pub fn font_size(mut self, size: f32) -> Self {
        self.settings.font = self.settings.font.with_size(size);
        self
    }

    pub fn line_spacing(mut self, spacing: f32) -> Self {
        self.settings.font.line_spacing = spacing;
        self
    }

    pub fn font(mut self, font: FontSettings) -> Self {
        self.settings.font = font;
        self
    }

    // Layout
    pub fn wrap_column(mut self, column: Option<usize>) -> Self {
        self.settings.wrapping.wrap_column = column;
        self
    }

    pub fn tab_size(mut self, size: usize) -> Self {
        self.settings.wrapping.tab_size = size;
        self
    }

    pub fn text_indent(mut self, indent: f32) -> Self {
        self.settings.text_indent = indent;
        self
    }

    // History
    pub fn coalesce_window_ms(mut self, ms: u64) -> Self {
        self.settings.history.coalesce_window_ms = ms;
        self
    }

    pub fn max_undo_groups(mut self, groups: usize) -> Self {
        self.settings.history.max_groups = groups;
        self
    }

    // Diagnostics
    pub fn diagnostics(mut self, diagnostics: DiagnosticsSettings) -> Self {
        self.settings.diagnostics = diagnostics;
        self
    }

    pub fn build(self) -> DocumentSettings {
        self.settings
    }
}
