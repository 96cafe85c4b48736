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

//! # Architecture
//!
//! The graph is a flat arena: nodes and edges live in `Vec`s and are
//! referenced by index, never by pointer. Nothing is ever removed — a
//! node or edge that should stop mattering decays by weight, not by
//! deletion — so an index handed out once stays valid for the graph's
//! whole lifetime. This is deliberately simpler than the adjacency-map
//! topology this module used to hold: an arena with append-only growth
//! needs no generation counters or tombstones to stay safe.
//!
//! Two lookup caches ride alongside the arena: `payload_index` resolves
//! an exact byte sequence to a node (ingest's matching step), and
//! `edge_lookup` resolves an ordered node pair to an existing edge (every
//! creation law's "find or strengthen, else create" step).

use std::collections::HashMap;

use crate::edge::{Edge, EdgeIndex, EdgeKind};
use crate::node::{Node, NodeIndex};

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    payload_index: HashMap<Vec<u8>, Vec<NodeIndex>>,
    id_to_index: HashMap<u64, NodeIndex>,
    edge_lookup: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
    /// Nodes carrying residual activation across a `process_input`
    /// boundary: the union of the previous call's initial activation set
    /// and every node the wave ever fronted.
    last_activated: Vec<NodeIndex>,
    next_id: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::with_capacity(1, 1)
    }

    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(node_capacity.max(1)),
            edges: Vec::with_capacity(edge_capacity.max(1)),
            payload_index: HashMap::new(),
            id_to_index: HashMap::new(),
            edge_lookup: HashMap::new(),
            last_activated: Vec::with_capacity(1),
            next_id: 0,
        }
    }

    // ---- node/edge accessors ---------------------------------------------------

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.nodes[idx]
    }

    pub fn edge(&self, idx: EdgeIndex) -> &Edge {
        &self.edges[idx]
    }

    pub fn edge_mut(&mut self, idx: EdgeIndex) -> &mut Edge {
        &mut self.edges[idx]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes_iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn edges_iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn index_for_id(&self, id: u64) -> Option<NodeIndex> {
        self.id_to_index.get(&id).copied()
    }

    pub fn last_activated(&self) -> &[NodeIndex] {
        &self.last_activated
    }

    pub fn set_last_activated(&mut self, nodes: Vec<NodeIndex>) {
        self.last_activated = nodes;
    }

    // ---- growth -----------------------------------------------------------------

    /// Look up a node with this exact payload. Ties (more than one node
    /// ever sharing a payload, which should not normally happen but is
    /// not forbidden) are broken by preferring the higher-weight node.
    pub fn find_exact(&self, payload: &[u8]) -> Option<NodeIndex> {
        let candidates = self.payload_index.get(payload)?;
        candidates.iter().copied().max_by(|&a, &b| {
            self.nodes[a]
                .weight
                .partial_cmp(&self.nodes[b].weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Allocate a fresh node id and append a new node with this payload.
    pub fn add_node(&mut self, payload: Vec<u8>) -> NodeIndex {
        let id = self.next_id;
        self.next_id += 1;
        let idx = self.nodes.len();
        self.payload_index.entry(payload.clone()).or_default().push(idx);
        self.id_to_index.insert(id, idx);
        self.nodes.push(Node::new(id, payload));
        crate::metrics::NODES_CREATED.inc();
        idx
    }

    /// Restore a node read back from a brain file verbatim (id, payload and
    /// scalar fields already populated); only the lookup caches are rebuilt.
    pub fn restore_node(&mut self, node: Node) -> NodeIndex {
        let idx = self.nodes.len();
        self.payload_index.entry(node.payload.clone()).or_default().push(idx);
        self.id_to_index.insert(node.id, idx);
        self.nodes.push(node);
        idx
    }

    pub fn set_next_id(&mut self, next_id: u64) {
        self.next_id = next_id;
    }

    pub fn edge_between(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeIndex> {
        self.edge_lookup.get(&(from, to)).copied()
    }

    /// Append a brand new zero-weight edge and wire it into both nodes'
    /// adjacency lists and the pair-lookup cache.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> EdgeIndex {
        let idx = self.edges.len();
        self.edges.push(Edge::new(from, to, kind));
        self.nodes[from].outgoing.push(idx);
        self.nodes[to].incoming.push(idx);
        self.edge_lookup.insert((from, to), idx);
        crate::metrics::EDGES_CREATED.inc();
        idx
    }

    /// Restore an edge read back from a brain file; skips the "already
    /// connected" lookup since a freshly opened graph cannot have one.
    pub fn restore_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: Edge) -> EdgeIndex {
        let idx = self.edges.len();
        self.nodes[from].outgoing.push(idx);
        self.nodes[to].incoming.push(idx);
        self.edge_lookup.insert((from, to), idx);
        self.edges.push(edge);
        idx
    }

    /// Find-or-create the edge `from -> to` and nudge its weight towards 1
    /// by `alpha`: `w' = w + alpha * (1 - w)`. Shared by every creation law.
    pub fn link_and_strengthen(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        kind: EdgeKind,
        alpha: f32,
    ) -> EdgeIndex {
        let edge_idx = self
            .edge_between(from, to)
            .unwrap_or_else(|| self.add_edge(from, to, kind));
        let w0 = self.edges[edge_idx].weight;
        let w1 = w0 + alpha * (1.0 - w0);
        self.update_edge_weight(edge_idx, w1);
        edge_idx
    }

    /// Find-or-create the edge `from -> to` and set its weight directly,
    /// bypassing the strengthening formula. Used for hierarchy edge
    /// transfer, where the new weight is a direct halving, not a nudge.
    pub fn link_absolute(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind, weight: f32) -> EdgeIndex {
        let edge_idx = self
            .edge_between(from, to)
            .unwrap_or_else(|| self.add_edge(from, to, kind));
        self.update_edge_weight(edge_idx, weight);
        edge_idx
    }

    /// The one place an edge's weight may change: keeps both endpoints'
    /// cached sums and the `from` node's weight-change window in lock step
    /// with the new value.
    pub fn update_edge_weight(&mut self, edge_idx: EdgeIndex, new_weight: f32) {
        let (from, to, old_weight) = {
            let edge = &self.edges[edge_idx];
            (edge.from, edge.to, edge.weight)
        };
        let delta = new_weight - old_weight;
        self.edges[edge_idx].weight = new_weight;
        self.nodes[from].outgoing_weight_sum += delta;
        self.nodes[to].incoming_weight_sum += delta;
        self.nodes[from].recent_weight_changes.push(delta.abs());
    }

    /// Recompute every node's cached weight sums from the edges actually
    /// present, rather than trusting anything read back from a brain file.
    pub fn recompute_cached_sums(&mut self) {
        for node in &mut self.nodes {
            node.outgoing_weight_sum = 0.0;
            node.incoming_weight_sum = 0.0;
        }
        for edge in &self.edges {
            self.nodes[edge.from].outgoing_weight_sum += edge.weight;
            self.nodes[edge.to].incoming_weight_sum += edge.weight;
        }
    }

    // ---- local-only statistics --------------------------------------------------

    pub fn outgoing_avg(&self, node: NodeIndex) -> f32 {
        let n = &self.nodes[node];
        if n.outgoing.is_empty() {
            0.0
        } else {
            n.outgoing_weight_sum / n.outgoing.len() as f32
        }
    }

    pub fn incoming_avg(&self, node: NodeIndex) -> f32 {
        let n = &self.nodes[node];
        if n.incoming.is_empty() {
            0.0
        } else {
            n.incoming_weight_sum / n.incoming.len() as f32
        }
    }

    pub fn local_avg(&self, node: NodeIndex) -> f32 {
        (self.outgoing_avg(node) + self.incoming_avg(node)) / 2.0
    }

    pub fn local_learning_rate(&self, node: NodeIndex) -> f32 {
        self.nodes[node].recent_weight_changes.learning_rate()
    }

    pub fn degree(&self, node: NodeIndex) -> usize {
        self.nodes[node].degree()
    }

    /// Byte-wise similarity of two nodes' payloads: matches over
    /// `max(len_a, len_b)`, with an early exit once the running mismatch
    /// rate exceeds an acceptance rate derived from the two nodes' own
    /// weight and bias (never a fixed constant).
    pub fn similarity(&self, a: NodeIndex, b: NodeIndex) -> f32 {
        let pa = &self.nodes[a].payload;
        let pb = &self.nodes[b].payload;
        let min_len = pa.len().min(pb.len());
        let max_len = pa.len().max(pb.len());
        if max_len == 0 {
            return 1.0;
        }
        let bias_a = self.nodes[a].bias.abs();
        let bias_b = self.nodes[b].bias.abs();
        let weight_sum = self.nodes[a].weight + self.nodes[b].weight + bias_a + bias_b;
        let acceptance_rate = weight_sum / (weight_sum + 1.0);

        let mut matches = 0usize;
        let mut mismatches = 0usize;
        for i in 0..min_len {
            if pa[i] == pb[i] {
                matches += 1;
            } else {
                mismatches += 1;
                let checked = i + 1;
                if (mismatches as f32 / checked as f32) > acceptance_rate {
                    break;
                }
            }
        }
        matches as f32 / max_len as f32
    }

    /// Scale an edge's contribution by the similarity of its endpoints and
    /// by how dominant it is relative to its source's other outgoing
    /// edges. Always non-negative, unbounded above.
    pub fn edge_transform(&self, edge_idx: EdgeIndex, input_activation: f32) -> f32 {
        let edge = &self.edges[edge_idx];
        let (from, to, weight) = (edge.from, edge.to, edge.weight);
        let mut result = weight * input_activation;

        let local_avg = self.local_avg(from);
        let local_threshold = local_avg / (local_avg + 1.0);
        let sim = self.similarity(from, to);
        if sim > local_threshold {
            result *= 1.0 + sim * local_avg / (local_avg + 1.0);
        }

        let oavg = self.outgoing_avg(from);
        if weight > 1.5 * oavg {
            result *= 1.2;
        }
        result
    }

    /// Recompute `node`'s activation_strength (and, along the way, its
    /// bias) from its incoming edges. The only place either field changes.
    pub fn compute_activation_strength(&mut self, node: NodeIndex) -> f32 {
        let incoming = self.nodes[node].incoming.clone();
        let mut in_sum = 0.0f32;
        for e in &incoming {
            let from = self.edges[*e].from;
            let from_activation = self.nodes[from].activation_strength;
            in_sum += self.edge_transform(*e, from_activation);
        }
        let incoming_weight_sum = self.nodes[node].incoming_weight_sum;
        let denom = incoming_weight_sum.max(in_sum);
        let normalized = if denom > 0.0 { in_sum / denom } else { 0.0 };

        let local_avg = self.local_avg(node);
        let bias = (self.nodes[node].weight - local_avg) / (local_avg + 1.0);
        self.nodes[node].bias = bias;

        // Clamped at 0 before the non-linearity: activation_strength is a
        // [0, 1) invariant, and an unclamped negative bias would otherwise
        // push x/(1+x) negative.
        let x = (normalized + bias).max(0.0);
        let activation = x / (1.0 + x);
        self.nodes[node].activation_strength = activation;
        activation
    }

    /// Nudge `node`'s activation-history weight towards its current
    /// activation_strength, at this node's own local learning rate.
    pub fn update_node_weight(&mut self, node: NodeIndex) {
        let alpha = self.local_learning_rate(node);
        let strength = self.nodes[node].activation_strength;
        let w0 = self.nodes[node].weight;
        self.nodes[node].weight = w0 + alpha * (strength - w0);
    }

    /// Edges out of `node` ordered by the priority the wave propagates
    /// them in: weight descending, ties broken by the target's id
    /// ascending, so propagation order is reproducible across runs.
    pub fn ordered_outgoing(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges = self.nodes[node].outgoing.clone();
        edges.sort_by(|&a, &b| {
            let wa = self.edges[a].weight;
            let wb = self.edges[b].weight;
            wb.partial_cmp(&wa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let ta = self.nodes[self.edges[a].to].id;
                    let tb = self.nodes[self.edges[b].to].id;
                    ta.cmp(&tb)
                })
        });
        edges
    }

    /// Mean weight of `node`'s own outgoing edges, used to derive the
    /// dominance ratio a co-activation edge must clear to trigger a
    /// hierarchy merge.
    pub fn outgoing_weights(&self, node: NodeIndex) -> Vec<f32> {
        self.nodes[node]
            .outgoing
            .iter()
            .map(|&e| self.edges[e].weight)
            .collect()
    }

    /// Nodes within `radius` hops of `start`, following edges in either
    /// direction, excluding `start` itself. Used by the homeostatic law
    /// and by similarity candidate search — always a bounded local walk,
    /// never a graph-wide scan.
    pub fn neighborhood(&self, start: NodeIndex, radius: usize) -> Vec<NodeIndex> {
        use std::collections::HashSet;
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        visited.insert(start);
        let mut frontier = vec![start];
        let mut collected = Vec::new();
        for _ in 0..radius {
            let mut next = Vec::new();
            for &n in &frontier {
                for &e in &self.nodes[n].outgoing {
                    let to = self.edges[e].to;
                    if visited.insert(to) {
                        collected.push(to);
                        next.push(to);
                    }
                }
                for &e in &self.nodes[n].incoming {
                    let from = self.edges[e].from;
                    if visited.insert(from) {
                        collected.push(from);
                        next.push(from);
                    }
                }
            }
            frontier = next;
        }
        collected
    }

    pub fn highest_weighted_in(&self, candidates: &[NodeIndex]) -> Option<NodeIndex> {
        candidates.iter().copied().max_by(|&a, &b| {
            self.nodes[a]
                .weight
                .partial_cmp(&self.nodes[b].weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Whether some node already has an edge (either direction) to every
    /// member of `cluster` — used to skip forming a redundant blank bridge.
    pub fn common_bridge_exists(&self, cluster: &[NodeIndex]) -> bool {
        if cluster.len() < 2 {
            return false;
        }
        let candidates = self.neighborhood(cluster[0], 1);
        candidates.into_iter().any(|candidate| {
            cluster
                .iter()
                .all(|&m| self.edge_between(candidate, m).is_some() || self.edge_between(m, candidate).is_some())
        })
    }

    /// Match strength of a blank node against a candidate payload: the
    /// weighted average, over the blank's incident edges, of the
    /// similarity between each neighbor's payload and the candidate.
    pub fn blank_match_strength(&self, blank: NodeIndex, candidate_payload: &[u8]) -> f32 {
        let node = &self.nodes[blank];
        let mut weighted_sum = 0.0f32;
        let mut weight_total = 0.0f32;
        for &e in node.outgoing.iter().chain(node.incoming.iter()) {
            let edge = &self.edges[e];
            let other = if edge.from == blank { edge.to } else { edge.from };
            let sim = byte_similarity(&self.nodes[other].payload, candidate_payload);
            weighted_sum += edge.weight * sim;
            weight_total += edge.weight;
        }
        if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            0.0
        }
    }

    pub fn blank_match_threshold(&self, blank: NodeIndex) -> f32 {
        let avg = self.incoming_avg(blank);
        avg / (avg + 1.0)
    }
}

/// Byte-wise similarity between two raw payloads, without reference to
/// any node's weight/bias (used to score a blank node against a candidate
/// payload that may not belong to a node yet).
fn byte_similarity(a: &[u8], b: &[u8]) -> f32 {
    let min_len = a.len().min(b.len());
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let matches = (0..min_len).filter(|&i| a[i] == b[i]).count();
    matches as f32 / max_len as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_node_assigns_increasing_ids() {
        let mut g = Graph::new();
        let a = g.add_node(vec![b'a']);
        let b = g.add_node(vec![b'b']);
        assert_eq!(g.node(a).id, 0);
        assert_eq!(g.node(b).id, 1);
    }

    #[test]
    fn find_exact_resolves_payload() {
        let mut g = Graph::new();
        let a = g.add_node(b"hello".to_vec());
        assert_eq!(g.find_exact(b"hello"), Some(a));
        assert_eq!(g.find_exact(b"nope"), None);
    }

    #[test]
    fn link_and_strengthen_reuses_existing_edge() {
        let mut g = Graph::new();
        let a = g.add_node(vec![b'a']);
        let b = g.add_node(vec![b'b']);
        let e1 = g.link_and_strengthen(a, b, EdgeKind::CoActivation, 0.5);
        let e2 = g.link_and_strengthen(a, b, EdgeKind::CoActivation, 0.5);
        assert_eq!(e1, e2);
        assert!(g.edge(e1).weight > 0.5);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn update_edge_weight_maintains_cached_sums() {
        let mut g = Graph::new();
        let a = g.add_node(vec![b'a']);
        let b = g.add_node(vec![b'b']);
        let e = g.add_edge(a, b, EdgeKind::CoActivation);
        g.update_edge_weight(e, 0.4);
        assert!((g.node(a).outgoing_weight_sum - 0.4).abs() < 1e-6);
        assert!((g.node(b).incoming_weight_sum - 0.4).abs() < 1e-6);
        g.update_edge_weight(e, 0.1);
        assert!((g.node(a).outgoing_weight_sum - 0.1).abs() < 1e-6);
        assert!((g.node(b).incoming_weight_sum - 0.1).abs() < 1e-6);
    }

    #[test]
    fn similarity_of_identical_payloads_is_one() {
        let mut g = Graph::new();
        let a = g.add_node(b"abc".to_vec());
        let b = g.add_node(b"abc".to_vec());
        assert_eq!(g.similarity(a, b), 1.0);
    }

    #[test]
    fn similarity_of_disjoint_payloads_is_low() {
        let mut g = Graph::new();
        let a = g.add_node(b"abc".to_vec());
        let b = g.add_node(b"xyz".to_vec());
        assert_eq!(g.similarity(a, b), 0.0);
    }

    #[test]
    fn activation_strength_of_isolated_node_is_clamped_nonnegative() {
        let mut g = Graph::new();
        let a = g.add_node(vec![b'a']);
        let s = g.compute_activation_strength(a);
        assert!((0.0..1.0).contains(&s));
    }

    #[test]
    fn recompute_cached_sums_matches_incremental_updates() {
        let mut g = Graph::new();
        let a = g.add_node(vec![b'a']);
        let b = g.add_node(vec![b'b']);
        let c = g.add_node(vec![b'c']);
        let e1 = g.add_edge(a, b, EdgeKind::CoActivation);
        g.update_edge_weight(e1, 0.3);
        let e2 = g.add_edge(a, c, EdgeKind::CoActivation);
        g.update_edge_weight(e2, 0.6);
        let before = g.node(a).outgoing_weight_sum;
        g.recompute_cached_sums();
        let after = g.node(a).outgoing_weight_sum;
        assert!((before - after).abs() < 1e-5);
    }

    #[test]
    fn ordered_outgoing_breaks_ties_by_target_id() {
        let mut g = Graph::new();
        let a = g.add_node(vec![b'a']);
        let b = g.add_node(vec![b'b']);
        let c = g.add_node(vec![b'c']);
        let e1 = g.add_edge(a, c, EdgeKind::CoActivation);
        let e2 = g.add_edge(a, b, EdgeKind::CoActivation);
        g.update_edge_weight(e1, 0.5);
        g.update_edge_weight(e2, 0.5);
        let ordered = g.ordered_outgoing(a);
        assert_eq!(ordered, vec![e2, e1]);
    }
}
