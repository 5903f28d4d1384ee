//! Debug and profiling switches
//!
//! Passed in at construction; nothing here is process-global.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Diagnostics settings
#[derive(Clone, Debug, Default, Resource, Serialize, Deserialize)]
pub struct DiagnosticsSettings {
    /// Consumers paint token tags instead of theme colours
    pub token_debug: bool,

    /// Log layout cache counters after each edit
    pub profile_layout: bool,
}
