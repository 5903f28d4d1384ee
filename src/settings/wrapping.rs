//! Text wrapping and tab settings

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use crate::layout::LayoutParams;

/// Text wrapping settings
#[derive(Clone, Debug, Resource, Serialize, Deserialize)]
pub struct WrappingSettings {
    /// Wrap column in sub-columns (None = no soft wrap)
    pub wrap_column: Option<usize>,

    /// Tab stop interval in sub-columns
    pub tab_size: usize,
}

impl Default for WrappingSettings {
    fn default() -> Self {
        Self {
            wrap_column: None,
            tab_size: 4,
        }
    }
}

impl WrappingSettings {
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            wrap_column: self.wrap_column.map(|c| c.max(1)),
            tab_size: self.tab_size.max(1),
        }
    }
}
