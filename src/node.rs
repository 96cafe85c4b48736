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

//! A node in the graph's flat arena: a byte payload plus the scalars and
//! edge-index lists that the wave and edge-formation math read and write.

use crate::edge::EdgeIndex;
use crate::rolling::RollingWindow;

pub type NodeIndex = usize;

#[derive(Debug, Clone)]
pub struct Node {
    /// Stable identity, persists across brain-file save/open. Never equal
    /// to another node's id, but not guaranteed to equal this node's
    /// arena index.
    pub id: u64,
    pub payload: Vec<u8>,
    pub activation_strength: f32,
    /// Activation-history scalar, >= 0, nudged towards recent
    /// activation_strength values every time the node is visited by a wave.
    pub weight: f32,
    /// Self-regulating scalar relative to this node's own local edge
    /// averages, recomputed alongside activation_strength.
    pub bias: f32,
    /// 0 for ordinary nodes; 1 + max(child levels) for hierarchy nodes.
    pub abstraction_level: u32,
    pub outgoing: Vec<EdgeIndex>,
    pub incoming: Vec<EdgeIndex>,
    /// Cached sum of outgoing/incoming edge weights, maintained in lock
    /// step with every edge weight mutation, never trusted from a brain
    /// file and always recomputed on load.
    pub outgoing_weight_sum: f32,
    pub incoming_weight_sum: f32,
    /// Rolling window of |Δweight| for edges this node is the `from` of.
    pub recent_weight_changes: RollingWindow,
    /// Rolling window of this node's own total-degree samples, used by
    /// the homeostatic law to detect degree starvation.
    pub degree_history: RollingWindow,
}

impl Node {
    pub fn new(id: u64, payload: Vec<u8>) -> Self {
        Self {
            id,
            payload,
            activation_strength: 0.0,
            weight: 0.0,
            bias: 0.0,
            abstraction_level: 0,
            outgoing: Vec::with_capacity(1),
            incoming: Vec::with_capacity(1),
            outgoing_weight_sum: 0.0,
            incoming_weight_sum: 0.0,
            recent_weight_changes: RollingWindow::new(),
            degree_history: RollingWindow::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_has_zero_scalars() {
        let n = Node::new(1, vec![b'h']);
        assert_eq!(n.activation_strength, 0.0);
        assert_eq!(n.weight, 0.0);
        assert_eq!(n.abstraction_level, 0);
        assert!(!n.is_blank());
    }

    #[test]
    fn empty_payload_is_blank() {
        let n = Node::new(2, Vec::new());
        assert!(n.is_blank());
    }

    #[test]
    fn capacities_start_at_one() {
        let n = Node::new(3, vec![b'x']);
        assert_eq!(n.outgoing.capacity(), 1);
        assert_eq!(n.incoming.capacity(), 1);
    }
}
