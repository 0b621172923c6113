//! Editor configuration
//!
//! Persisted editor preferences, stored as YAML through the shared
//! config I/O in chop-core.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use chop_core::config::{default_config_path, load_config, save_config};
use chop_core::types::Beats;

/// Persisted preferences for the crossfade editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap region edits to the musical grid
    pub snap_to_grid: bool,
    /// Grid spacing in beats
    pub grid_size_beats: Beats,
    /// Zoom factor applied when a track is first opened
    pub default_zoom: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_to_grid: true,
            grid_size_beats: 0.25,
            default_zoom: 1.0,
        }
    }
}

impl EditorConfig {
    /// Standard on-disk location for the editor config
    pub fn path() -> PathBuf {
        default_config_path("editor.yaml")
    }

    /// Load from the standard location (defaults if missing/invalid)
    pub fn load() -> Self {
        load_config(&Self::path())
    }

    /// Save to the standard location
    pub fn save(&self) -> anyhow::Result<()> {
        save_config(self, &Self::path())
    }
}
