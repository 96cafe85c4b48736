// Melvin - emergent associative graph engine.
// Copyright (C) 2024-2025 Melvin Engine Team
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Engine configuration — mechanism knobs only.
//!
//! Nothing here may parameterize a relative computation from the wave or
//! edge-formation math (readiness, dominance, exploration factor, ...).
//! Those are always derived from a node's own 1-hop neighborhood. This
//! struct only covers allocation pre-sizing, file paths, and save cadence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Mechanism-only configuration for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pre-sized capacity for the node arena (still doubles on overflow).
    pub initial_node_capacity: usize,

    /// Pre-sized capacity for the edge arena (still doubles on overflow).
    pub initial_edge_capacity: usize,

    /// Where the brain file lives. `None` means the engine is in-memory
    /// only and `save`/`open` must be called with an explicit path.
    pub brain_file_path: Option<PathBuf>,

    /// Auto-save the brain file when dirty, every `autosave_interval` calls
    /// to `process_input`. 0 means "save after every call that left the
    /// graph dirty"; `None` disables auto-save entirely.
    pub autosave_interval: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_node_capacity: 1,
            initial_edge_capacity: 1,
            brain_file_path: None,
            autosave_interval: Some(0),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file, falling back to defaults if the
    /// file is missing or malformed. Mirrors the `from_file_or_default`
    /// convenience used elsewhere in this codebase's config structs.
    pub fn from_file_or_default(path: impl AsRef<std::path::Path>) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "failed to parse engine config, using defaults"
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_minimal_capacities() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.initial_node_capacity, 1);
        assert_eq!(cfg.initial_edge_capacity, 1);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let cfg = EngineConfig::from_file_or_default("/nonexistent/path/engine.json");
        assert_eq!(cfg.initial_node_capacity, EngineConfig::default().initial_node_capacity);
    }
}
