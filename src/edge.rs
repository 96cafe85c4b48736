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

//! Directed edges living in the graph's flat arena.

use crate::node::NodeIndex;

pub type EdgeIndex = usize;

/// Which creation law first produced an edge. An edge keeps this tag for
/// its whole life even if a later law reuses and strengthens it — only
/// `CoActivation` edges are consulted when generating output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    CoActivation,
    Similarity,
    Context,
    Homeostatic,
}

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub kind: EdgeKind,
    /// Logical orientation bit, primary direction is always `from -> to`.
    /// Kept for wire-format compatibility; nothing branches on it.
    pub direction: bool,
    pub activation: bool,
    pub weight: f32,
}

impl Edge {
    pub fn new(from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            direction: true,
            activation: false,
            weight: 0.0,
        }
    }
}
