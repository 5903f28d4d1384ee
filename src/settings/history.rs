//! Undo history settings

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Undo/redo grouping settings
#[derive(Clone, Debug, Resource, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Edits closer together than this share one undo group
    pub coalesce_window_ms: u64,

    /// Maximum number of undo groups to keep
    pub max_groups: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            coalesce_window_ms: 400,
            max_groups: 1000,
        }
    }
}
