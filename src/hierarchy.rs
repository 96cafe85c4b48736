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

//! Emergent hierarchy nodes and blank bridging nodes.
//!
//! Both mechanisms grow the graph without anyone designing a schema for
//! it: a co-activation edge that comes to dominate its source's other
//! outgoing edges condenses into a higher-abstraction node covering both
//! endpoints' payloads; three or more nodes that turn out to be pairwise
//! similar, with nothing already bridging them, get a blank node tying
//! them together.

use crate::edge::EdgeKind;
use crate::graph::Graph;
use crate::node::NodeIndex;
use crate::stats::mean;

/// How far above its source's own outgoing average an edge's weight must
/// climb to trigger a hierarchy merge. Derived from the source's own bias,
/// never a flat constant — 1.5 is only the floor for a brand new node
/// whose bias is still zero.
fn dominance_ratio(graph: &Graph, node: NodeIndex) -> f32 {
    let oavg = graph.outgoing_avg(node);
    let bias = graph.node(node).bias;
    let ratio = (oavg + bias + 1.0) / (oavg + 1.0);
    ratio.max(1.5)
}

/// Check whether the edge just strengthened by L1 should condense `from`
/// and `to` into a new hierarchy node. Returns the new node's index, if
/// any was created.
pub fn maybe_form_hierarchy(graph: &mut Graph, edge_idx: crate::edge::EdgeIndex) -> Option<NodeIndex> {
    let (a, b, weight) = {
        let edge = graph.edge(edge_idx);
        (edge.from, edge.to, edge.weight)
    };
    let dominance = dominance_ratio(graph, a);
    let oavg = graph.outgoing_avg(a);
    if weight <= dominance * oavg {
        return None;
    }

    let mut payload = graph.node(a).payload.clone();
    payload.extend_from_slice(&graph.node(b).payload);
    if graph.find_exact(&payload).is_some() {
        return None;
    }

    let level = 1 + graph.node(a).abstraction_level.max(graph.node(b).abstraction_level);
    let merged = graph.add_node(payload);
    graph.node_mut(merged).abstraction_level = level;

    // A keeps its own incoming edges (additive growth, nothing removed);
    // the merged node also inherits them, halved.
    let a_incoming: Vec<_> = graph.node(a).incoming.to_vec();
    for e in a_incoming {
        let (source, w) = {
            let edge = graph.edge(e);
            (edge.from, edge.weight)
        };
        graph.link_absolute(source, merged, EdgeKind::CoActivation, w / 2.0);
    }

    let b_outgoing: Vec<_> = graph.node(b).outgoing.to_vec();
    for e in b_outgoing {
        let (target, w) = {
            let edge = graph.edge(e);
            (edge.to, edge.weight)
        };
        graph.link_absolute(merged, target, EdgeKind::CoActivation, w / 2.0);
    }

    crate::metrics::HIERARCHY_NODES_CREATED.inc();
    Some(merged)
}

/// After L2 gathers `seed`'s similar candidates, check whether three or
/// more of them (including `seed`) are pairwise similar with nothing
/// already bridging them, and if so create a blank node linking all of
/// them.
pub fn maybe_form_blank_bridge(graph: &mut Graph, seed: NodeIndex, candidates: &[NodeIndex]) {
    let mut cluster = vec![seed];
    for &candidate in candidates {
        let threshold = pairwise_threshold(graph, candidate);
        let all_similar = cluster.iter().all(|&member| graph.similarity(member, candidate) >= threshold);
        if all_similar {
            cluster.push(candidate);
        }
    }

    if cluster.len() < 3 {
        return;
    }
    if graph.common_bridge_exists(&cluster) {
        return;
    }

    let blank = graph.add_node(Vec::new());
    let alpha = mean(
        &cluster
            .iter()
            .map(|&m| graph.local_learning_rate(m))
            .collect::<Vec<_>>(),
    ) / 2.0;
    for &member in &cluster {
        graph.link_and_strengthen(blank, member, EdgeKind::Similarity, alpha);
        graph.link_and_strengthen(member, blank, EdgeKind::Similarity, alpha);
    }
    crate::metrics::BLANK_NODES_CREATED.inc();
}

fn pairwise_threshold(graph: &Graph, node: NodeIndex) -> f32 {
    let oavg = graph.outgoing_avg(node);
    oavg / (oavg + 1.0)
}
