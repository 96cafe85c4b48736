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

//! Sequential byte ingest: walks an input buffer left to right, at each
//! position preferring the longest already-known pattern (hierarchy-first)
//! up to an adaptive window bound, falling back to a fresh single-byte
//! node when nothing matches at all.

use crate::graph::Graph;
use crate::node::NodeIndex;

/// How many of a node's strongest neighbors to sample when estimating
/// the local pattern-length bound. A bound on the *sample*, not on graph
/// size — the walk stays a fixed-size local lookup regardless of how
/// large the graph has grown.
const NEIGHBOR_SAMPLE: usize = 8;

/// Estimate this call's maximum window size from the payload sizes of
/// the most recently activated node's strongest neighbors. An empty or
/// disconnected graph falls back to 1.
fn adaptive_l_max(graph: &Graph, remaining: usize) -> usize {
    if remaining == 0 {
        return 0;
    }
    let bound = match graph.last_activated().last() {
        Some(&last) => {
            let mut neighbors: Vec<(NodeIndex, f32)> = Vec::new();
            for &e in graph.node(last).outgoing.iter().chain(graph.node(last).incoming.iter()) {
                let edge = graph.edge(e);
                let other = if edge.from == last { edge.to } else { edge.from };
                neighbors.push((other, edge.weight));
            }
            if neighbors.is_empty() {
                graph.node(last).payload.len().max(1)
            } else {
                neighbors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                let k = neighbors.len().min(NEIGHBOR_SAMPLE);
                let avg: f32 = neighbors[..k].iter().map(|(n, _)| graph.node(*n).payload.len() as f32).sum::<f32>()
                    / k as f32;
                (avg.round() as usize).max(1)
            }
        }
        None => 1,
    };
    bound.min(remaining)
}

/// Walk `input` left to right, matching the longest known payload at each
/// position (ties among equal-length matches broken by [`Graph::find_exact`]
/// preferring the higher-weight node), creating a single-byte node when
/// nothing matches. Returns the resulting activation set in walk order.
pub fn sequential_ingest(graph: &mut Graph, input: &[u8]) -> Vec<NodeIndex> {
    let mut activation_set = Vec::with_capacity(1);
    let mut i = 0;
    while i < input.len() {
        let l_max = adaptive_l_max(graph, input.len() - i).max(1);
        let mut matched = None;
        for l in (1..=l_max).rev() {
            let slice = &input[i..i + l];
            if let Some(idx) = graph.find_exact(slice) {
                matched = Some((idx, l));
                break;
            }
        }
        match matched {
            Some((idx, l)) => {
                activation_set.push(idx);
                i += l;
            }
            None => {
                let idx = graph.add_node(input[i..i + 1].to_vec());
                activation_set.push(idx);
                i += 1;
            }
        }
    }
    activation_set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_activation_set() {
        let mut g = Graph::new();
        assert!(sequential_ingest(&mut g, b"").is_empty());
    }

    #[test]
    fn first_occurrence_creates_one_node_per_byte() {
        let mut g = Graph::new();
        let set = sequential_ingest(&mut g, b"ab");
        assert_eq!(set.len(), 2);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn repeated_byte_reuses_the_same_node() {
        let mut g = Graph::new();
        sequential_ingest(&mut g, b"a");
        let before = g.node_count();
        sequential_ingest(&mut g, b"a");
        assert_eq!(g.node_count(), before);
    }

    #[test]
    fn longer_known_pattern_is_preferred_when_it_fits_the_window() {
        let mut g = Graph::new();
        let ab = g.add_node(b"ab".to_vec());
        g.node_mut(ab).weight = 1.0;
        // Seed last_activated with a node whose neighborhood suggests a
        // 2-byte window so "ab" is tried before falling back to "a".
        let neighbor = g.add_node(b"xy".to_vec());
        let e = g.add_edge(ab, neighbor, crate::edge::EdgeKind::CoActivation);
        g.update_edge_weight(e, 0.5);
        g.set_last_activated(vec![ab]);
        let set = sequential_ingest(&mut g, b"ab");
        assert_eq!(set, vec![ab]);
    }
}
