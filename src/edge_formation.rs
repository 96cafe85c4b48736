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

//! The four edge-creation laws.
//!
//! Every law resolves to the same primitive, [`Graph::link_and_strengthen`]
//! — find the edge or create it at weight 0, then nudge it towards 1 by a
//! law-specific fraction of this node's own local learning rate. None of
//! them ever look past a node's own neighborhood or a 2-hop radius.

use crate::edge::EdgeKind;
use crate::graph::Graph;
use crate::hierarchy;
use crate::node::NodeIndex;

/// L1 — Co-activation. Strengthens (or creates) the edge between two
/// nodes that occurred next to each other in the same ingest walk.
/// Skips same-node pairs: repeating a byte that maps back onto itself
/// (e.g. the double "l" in "hello") must never produce a self-loop.
pub fn apply_l1(graph: &mut Graph, from: NodeIndex, to: NodeIndex) -> Option<crate::edge::EdgeIndex> {
    if from == to {
        return None;
    }
    let alpha = graph.local_learning_rate(from);
    let edge_idx = graph.link_and_strengthen(from, to, EdgeKind::CoActivation, alpha);
    hierarchy::maybe_form_hierarchy(graph, edge_idx);
    Some(edge_idx)
}

/// Run L1 over every adjacent pair in an ingest-ordered activation set.
pub fn apply_l1_sequence(graph: &mut Graph, nodes: &[NodeIndex]) {
    for pair in nodes.windows(2) {
        apply_l1(graph, pair[0], pair[1]);
    }
}

/// L2 — Similarity. Explores `seed`'s existing 2-hop neighborhood (never
/// a global scan) for nodes similar enough to be worth a weak bidirectional
/// link, and looks for a 3-or-more pairwise-similar cluster worth bridging
/// with a new blank node.
pub fn apply_l2(graph: &mut Graph, seed: NodeIndex) {
    let candidates = graph.neighborhood(seed, 2);
    let oavg = graph.outgoing_avg(seed);
    let threshold = oavg / (oavg + 1.0);
    let alpha = graph.local_learning_rate(seed) / 2.0;

    let mut similar_candidates = Vec::new();
    for &candidate in &candidates {
        if candidate == seed {
            continue;
        }
        let sim = graph.similarity(seed, candidate);
        if sim >= threshold {
            similar_candidates.push(candidate);
            if graph.edge_between(seed, candidate).is_none() && graph.edge_between(candidate, seed).is_none() {
                graph.link_and_strengthen(seed, candidate, EdgeKind::Similarity, alpha);
                graph.link_and_strengthen(candidate, seed, EdgeKind::Similarity, alpha);
            }
        }
    }

    hierarchy::maybe_form_blank_bridge(graph, seed, &similar_candidates);
}

/// L3 — Context. Every pair of nodes the wave activated in the same step
/// gets a weak context edge, unless a link between them already exists
/// (from L1 or otherwise).
pub fn apply_l3(graph: &mut Graph, same_step: &[NodeIndex]) {
    for i in 0..same_step.len() {
        for j in (i + 1)..same_step.len() {
            let (a, b) = (same_step[i], same_step[j]);
            if a == b {
                continue;
            }
            if graph.edge_between(a, b).is_some() || graph.edge_between(b, a).is_some() {
                continue;
            }
            let alpha = graph.local_learning_rate(a) / 4.0;
            graph.link_and_strengthen(a, b, EdgeKind::Context, alpha);
        }
    }
}

/// L4 — Homeostatic. A node whose total degree has fallen below its own
/// historical average receives a link from the highest-weighted node in
/// its 2-hop neighborhood.
pub fn apply_l4(graph: &mut Graph, node: NodeIndex) {
    let degree = graph.degree(node) as f32;
    graph.node_mut(node).degree_history.push(degree);
    let historical_avg = graph.node(node).degree_history.median();

    if degree < historical_avg {
        let neighborhood = graph.neighborhood(node, 2);
        if let Some(best) = graph.highest_weighted_in(&neighborhood) {
            if best != node {
                let alpha = graph.local_learning_rate(best) / 8.0;
                graph.link_and_strengthen(best, node, EdgeKind::Homeostatic, alpha);
            }
        }
    }
}

/// Apply L1 (over adjacent pairs), then L2 and L4 (over each distinct
/// node), to a freshly ingested activation set — the "initial activation
/// set" pass described alongside wave propagation.
pub fn apply_initial_laws(graph: &mut Graph, nodes: &[NodeIndex]) {
    apply_l1_sequence(graph, nodes);
    for &n in nodes {
        apply_l2(graph, n);
        apply_l4(graph, n);
    }
}
